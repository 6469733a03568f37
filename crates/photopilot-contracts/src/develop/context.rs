use serde::Serialize;

/// Temperatures above this are absolute Kelvin values; at or below, the host
/// is showing the relative slider.
pub const KELVIN_MODE_THRESHOLD: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WhiteBalanceMode {
    Kelvin,
    Slider,
}

impl WhiteBalanceMode {
    pub fn detect(current_temperature: Option<f64>) -> Self {
        match current_temperature {
            Some(value) if value > KELVIN_MODE_THRESHOLD => WhiteBalanceMode::Kelvin,
            _ => WhiteBalanceMode::Slider,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WhiteBalanceMode::Kelvin => "Kelvin",
            WhiteBalanceMode::Slider => "slider",
        }
    }
}

/// Host state as read immediately before a request or a translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextSnapshot {
    pub active_module: String,
    pub selected_count: usize,
    pub white_balance: WhiteBalanceMode,
    pub current_temperature: Option<f64>,
    pub current_tint: Option<f64>,
}

impl ContextSnapshot {
    pub fn new(
        active_module: impl Into<String>,
        selected_count: usize,
        current_temperature: Option<f64>,
        current_tint: Option<f64>,
    ) -> Self {
        Self {
            active_module: active_module.into(),
            selected_count,
            white_balance: WhiteBalanceMode::detect(current_temperature),
            current_temperature,
            current_tint,
        }
    }
}
