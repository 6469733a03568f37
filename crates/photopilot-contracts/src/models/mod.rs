mod registry;
mod selectors;

pub use registry::{Capability, ModelRegistry, ModelSpec, DRYRUN_BACKEND, GEMINI_BACKEND};
pub use selectors::{ModelSelection, ModelSelector};
