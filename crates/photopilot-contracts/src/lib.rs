pub mod chat;
pub mod codec;
pub mod develop;
pub mod error;
pub mod events;
pub mod models;
pub mod prefs;
pub mod prompts;
pub mod summary;
pub mod wire;

pub use error::AssistError;
