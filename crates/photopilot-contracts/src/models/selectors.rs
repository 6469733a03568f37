use super::registry::{Capability, ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    /// Set whenever the chosen model is not the one asked for.
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    pub fn select(
        &self,
        requested: Option<&str>,
        capability: Capability,
    ) -> Result<ModelSelection, String> {
        let requested = requested.map(str::trim).filter(|name| !name.is_empty());
        if let Some(model) = requested.and_then(|name| self.registry.lookup(name, capability)) {
            return Ok(ModelSelection {
                model: model.clone(),
                requested: requested.map(str::to_string),
                fallback_reason: None,
            });
        }

        let model = self
            .registry
            .capable(capability)
            .next()
            .cloned()
            .ok_or_else(|| format!("No model supports {capability} requests."))?;
        let fallback_reason = match requested {
            Some(name) => format!("Model '{name}' cannot handle {capability} requests."),
            None => "No model specified; using default.".to_string(),
        };
        Ok(ModelSelection {
            model,
            requested: requested.map(str::to_string),
            fallback_reason: Some(fallback_reason),
        })
    }
}
