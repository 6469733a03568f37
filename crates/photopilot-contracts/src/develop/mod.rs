mod context;
mod parameters;
mod translate;

pub use context::{ContextSnapshot, WhiteBalanceMode, KELVIN_MODE_THRESHOLD};
pub use parameters::{lookup_parameter, Bucket, ParameterSpec, ValueDomain, PARAMETER_SPECS};
pub use translate::{
    sanitize_temperature, sanitize_tint, translate, EditEntry, EditValue, TranslatedEdit,
    KELVIN_MAX, KELVIN_MIN, KELVIN_PER_SLIDER_UNIT, NUDGE_LIMIT, TINT_LIMIT,
};
