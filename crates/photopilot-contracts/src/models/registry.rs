use std::fmt;

use indexmap::IndexMap;

pub const GEMINI_BACKEND: &str = "gemini";
pub const DRYRUN_BACKEND: &str = "dryrun";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Plain chat turns.
    Text,
    /// Turns that carry an inline preview image.
    Vision,
}

impl Capability {
    pub fn label(self) -> &'static str {
        match self {
            Capability::Text => "text",
            Capability::Vision => "vision",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub backend: String,
    pub capabilities: Vec<Capability>,
}

impl ModelSpec {
    pub fn new(name: &str, backend: &str, capabilities: &[Capability]) -> Self {
        Self {
            name: name.to_string(),
            backend: backend.to_string(),
            capabilities: capabilities.to_vec(),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Known chat models in preference order; the first capable entry is the
/// default for that capability.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::from_specs(builtin_models())
    }
}

impl ModelRegistry {
    pub fn from_specs<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = ModelSpec>,
    {
        Self {
            models: specs
                .into_iter()
                .map(|spec| (spec.name.clone(), spec))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name.trim())
    }

    pub fn capable(&self, capability: Capability) -> impl Iterator<Item = &ModelSpec> {
        self.models
            .values()
            .filter(move |model| model.supports(capability))
    }

    /// The named model, if it is known and supports `capability`.
    pub fn lookup(&self, name: &str, capability: Capability) -> Option<&ModelSpec> {
        self.get(name).filter(|model| model.supports(capability))
    }

    pub fn names_for(&self, capability: Capability) -> Vec<&str> {
        self.capable(capability)
            .map(|model| model.name.as_str())
            .collect()
    }
}

fn builtin_models() -> Vec<ModelSpec> {
    use Capability::{Text, Vision};

    let gemini = |name: &str, capabilities: &[Capability]| {
        ModelSpec::new(name, GEMINI_BACKEND, capabilities)
    };
    vec![
        gemini("gemini-2.5-flash", &[Text, Vision]),
        gemini("gemini-2.5-pro", &[Text, Vision]),
        gemini("gemini-2.0-flash", &[Text, Vision]),
        gemini("gemini-2.0-flash-lite", &[Text]),
        ModelSpec::new("dryrun-text-1", DRYRUN_BACKEND, &[Text, Vision]),
    ]
}
