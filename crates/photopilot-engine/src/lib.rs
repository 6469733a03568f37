pub mod backend;
pub mod context;
pub mod executor;
pub mod host;
pub mod session;
pub mod sidecar;
pub mod thumbnail;

#[cfg(test)]
mod test_support;

pub use backend::{GeminiBackend, ModelBackend, ScriptedBackend};
pub use context::read_context;
pub use executor::{ApplyReport, EditExecutor, EditSnapshot, UndoReport};
pub use host::{DevelopHost, MediaKind, SettingsRecord, ThumbnailCallback};
pub use session::{Session, SessionConfig, SessionState, TurnOutcome};
pub use sidecar::{media_kind_for_path, SidecarCatalog};
pub use thumbnail::{export_thumbnail, THUMBNAIL_SIZE, THUMBNAIL_TIMEOUT};
