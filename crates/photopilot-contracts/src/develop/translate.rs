use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use super::context::{ContextSnapshot, WhiteBalanceMode};
use super::parameters::{lookup_parameter, Bucket, ValueDomain};

pub const KELVIN_MIN: f64 = 2000.0;
pub const KELVIN_MAX: f64 = 50000.0;
pub const TEMPERATURE_SLIDER_LIMIT: f64 = 100.0;
pub const TINT_LIMIT: f64 = 150.0;
/// Kelvin per unit when a slider-style nudge arrives for a Kelvin photo.
pub const KELVIN_PER_SLIDER_UNIT: f64 = 20.0;
/// Magnitudes at or below this are read as relative nudges in Kelvin mode.
pub const NUDGE_LIMIT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EditValue {
    Number(f64),
    Text(String),
}

impl EditValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EditValue::Number(value) => Some(*value),
            EditValue::Text(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            EditValue::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            EditValue::Text(text) => Value::String(text.clone()),
        }
    }
}

impl std::fmt::Display for EditValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditValue::Number(value) if value.fract() == 0.0 => write!(f, "{value:.0}"),
            EditValue::Number(value) => write!(f, "{value:.2}"),
            EditValue::Text(text) => write!(f, "{text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditEntry {
    pub setting: String,
    pub label: String,
    pub value: EditValue,
    /// `None` for settings passed through without a table entry.
    pub bucket: Option<Bucket>,
    /// The value is a level (Kelvin, or an unknown setting) rather than a
    /// slider position around neutral, so it reads without a sign.
    pub absolute: bool,
}

/// Host settings in application order: basic tone, presence and color,
/// tone curve, effects, then anything unrecognized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TranslatedEdit {
    entries: IndexMap<String, EditEntry>,
    /// Semantic names dropped because their value was unusable.
    skipped: Vec<String>,
}

impl TranslatedEdit {
    pub fn entries(&self) -> impl Iterator<Item = &EditEntry> {
        self.entries.values()
    }

    pub fn settings(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn get(&self, setting: &str) -> Option<&EditEntry> {
        self.entries.get(setting)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn skipped(&self) -> &[String] {
        self.skipped.as_slice()
    }
}

pub fn translate(params: &Map<String, Value>, context: &ContextSnapshot) -> TranslatedEdit {
    let mut known: Vec<(Bucket, usize, EditEntry)> = Vec::new();
    let mut unknown: Vec<EditEntry> = Vec::new();
    let mut skipped = Vec::new();

    for (name, raw) in params {
        let Some(value) = coerce_value(raw) else {
            skipped.push(name.clone());
            continue;
        };
        match lookup_parameter(name) {
            Some((position, spec)) => {
                let Some(number) = value.as_f64() else {
                    skipped.push(name.clone());
                    continue;
                };
                let absolute = spec.domain == ValueDomain::WhiteBalanceTemperature
                    && matches!(
                        (context.white_balance, context.current_temperature),
                        (WhiteBalanceMode::Kelvin, Some(_))
                    );
                let sanitized = match spec.domain {
                    ValueDomain::WhiteBalanceTemperature => sanitize_temperature(number, context),
                    ValueDomain::Tint => sanitize_tint(number),
                    ValueDomain::Range(min, max) => number.clamp(min, max),
                };
                known.push((
                    spec.bucket,
                    position,
                    EditEntry {
                        setting: spec.setting.to_string(),
                        label: spec.label.to_string(),
                        value: EditValue::Number(sanitized),
                        bucket: Some(spec.bucket),
                        absolute,
                    },
                ));
            }
            None => unknown.push(EditEntry {
                setting: name.clone(),
                label: name.clone(),
                value,
                bucket: None,
                absolute: true,
            }),
        }
    }

    known.sort_by_key(|(bucket, position, _)| (*bucket, *position));
    skipped.sort();

    let mut entries = IndexMap::new();
    for entry in known
        .into_iter()
        .map(|(_, _, entry)| entry)
        .chain(unknown)
    {
        entries.insert(entry.setting.clone(), entry);
    }
    TranslatedEdit { entries, skipped }
}

/// Interprets an incoming temperature against the photo's white-balance mode.
///
/// Kelvin mode: |v| <= 100 is a slider nudge worth 20 K per unit, v < -100
/// is a Kelvin delta, v > 100 is an absolute Kelvin target; the result is
/// clamped to 2000..50000 K. Slider mode clamps to -100..100 as given.
pub fn sanitize_temperature(value: f64, context: &ContextSnapshot) -> f64 {
    let current = match (context.white_balance, context.current_temperature) {
        (WhiteBalanceMode::Kelvin, Some(current)) => current,
        _ => return value.clamp(-TEMPERATURE_SLIDER_LIMIT, TEMPERATURE_SLIDER_LIMIT),
    };
    let target = if value.abs() <= NUDGE_LIMIT {
        current + value * KELVIN_PER_SLIDER_UNIT
    } else if value < -NUDGE_LIMIT {
        current + value
    } else {
        value
    };
    target.clamp(KELVIN_MIN, KELVIN_MAX).round()
}

pub fn sanitize_tint(value: f64) -> f64 {
    value.clamp(-TINT_LIMIT, TINT_LIMIT)
}

fn coerce_value(raw: &Value) -> Option<EditValue> {
    match raw {
        Value::Number(number) => number.as_f64().map(EditValue::Number),
        Value::String(text) => {
            let trimmed = text.trim();
            let numeric = trimmed.strip_prefix('+').unwrap_or(trimmed);
            match numeric.parse::<f64>() {
                Ok(number) if number.is_finite() => Some(EditValue::Number(number)),
                _ if trimmed.is_empty() => None,
                _ => Some(EditValue::Text(trimmed.to_string())),
            }
        }
        Value::Bool(flag) => Some(EditValue::Text(flag.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::{sanitize_temperature, sanitize_tint, translate, EditValue, TranslatedEdit};
    use crate::develop::context::ContextSnapshot;
    use crate::develop::parameters::Bucket;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn kelvin(current: f64) -> ContextSnapshot {
        ContextSnapshot::new("Develop", 1, Some(current), Some(0.0))
    }

    fn value(edit: &TranslatedEdit, setting: &str) -> Option<EditValue> {
        edit.get(setting).map(|entry| entry.value.clone())
    }

    #[test]
    fn kelvin_small_value_is_a_slider_nudge() {
        assert_eq!(sanitize_temperature(10.0, &kelvin(5500.0)), 5700.0);
        assert_eq!(sanitize_temperature(-100.0, &kelvin(5500.0)), 3500.0);
    }

    #[test]
    fn kelvin_large_negative_is_a_delta_then_clamped() {
        assert_eq!(sanitize_temperature(-5000.0, &kelvin(6000.0)), 2000.0);
        assert_eq!(sanitize_temperature(-500.0, &kelvin(6000.0)), 5500.0);
    }

    #[test]
    fn kelvin_large_positive_is_an_absolute_target() {
        assert_eq!(sanitize_temperature(7200.0, &kelvin(5000.0)), 7200.0);
        assert_eq!(sanitize_temperature(90000.0, &kelvin(5000.0)), 50000.0);
        assert_eq!(sanitize_temperature(150.0, &kelvin(5000.0)), 2000.0);
    }

    #[test]
    fn slider_mode_only_clamps() {
        let ctx = ContextSnapshot::new("Develop", 1, Some(0.0), Some(0.0));
        assert_eq!(sanitize_temperature(150.0, &ctx), 100.0);
        assert_eq!(sanitize_temperature(-35.0, &ctx), -35.0);
        let unknown = ContextSnapshot::new("Develop", 1, None, None);
        assert_eq!(sanitize_temperature(-400.0, &unknown), -100.0);
    }

    #[test]
    fn only_kelvin_temperature_is_marked_absolute() {
        let absolute = |ctx: &ContextSnapshot, name: &str, setting: &str| {
            translate(&params(json!({name: 10})), ctx)
                .get(setting)
                .map(|entry| entry.absolute)
        };
        let slider = ContextSnapshot::new("Develop", 1, Some(0.0), Some(0.0));
        assert_eq!(absolute(&kelvin(5500.0), "temperature", "Temperature"), Some(true));
        assert_eq!(absolute(&slider, "temperature", "Temperature"), Some(false));
        assert_eq!(absolute(&kelvin(5500.0), "exposure", "Exposure2012"), Some(false));
    }

    #[test]
    fn tint_is_clamped_both_ways() {
        assert_eq!(sanitize_tint(500.0), 150.0);
        assert_eq!(sanitize_tint(-500.0), -150.0);
        assert_eq!(sanitize_tint(12.0), 12.0);
        let edit = translate(&params(json!({"tint": 500})), &kelvin(5500.0));
        assert_eq!(value(&edit, "Tint"), Some(EditValue::Number(150.0)));
    }

    #[test]
    fn output_follows_bucket_order_with_unknown_last() {
        let edit = translate(
            &params(json!({
                "zz_future_slider": 3,
                "grain_amount": 20,
                "parametric_darks": -10,
                "vibrance": 15,
                "exposure": 0.3,
                "temperature": 10,
            })),
            &kelvin(5500.0),
        );
        assert_eq!(
            edit.settings(),
            vec![
                "Temperature",
                "Exposure2012",
                "Vibrance",
                "ParametricDarks",
                "GrainAmount",
                "zz_future_slider"
            ]
        );
        let buckets: Vec<Option<Bucket>> = edit.entries().map(|entry| entry.bucket).collect();
        assert_eq!(
            buckets,
            vec![
                Some(Bucket::BasicTone),
                Some(Bucket::BasicTone),
                Some(Bucket::Presence),
                Some(Bucket::ToneCurve),
                Some(Bucket::Effects),
                None
            ]
        );
        assert_eq!(
            value(&edit, "Temperature"),
            Some(EditValue::Number(5700.0))
        );
    }

    #[test]
    fn unknown_keys_pass_through_unchanged() {
        let edit = translate(
            &params(json!({"LensProfileEnable": "1", "Look": "Vivid"})),
            &kelvin(5500.0),
        );
        assert_eq!(
            value(&edit, "Look"),
            Some(EditValue::Text("Vivid".to_string()))
        );
        assert_eq!(
            value(&edit, "LensProfileEnable"),
            Some(EditValue::Number(1.0))
        );
    }

    #[test]
    fn numeric_strings_are_coerced_and_ranges_clamped() {
        let edit = translate(
            &params(json!({"exposure": "+7.5", "clarity": "-250", "sharpness": -10})),
            &kelvin(5500.0),
        );
        assert_eq!(value(&edit, "Exposure2012"), Some(EditValue::Number(5.0)));
        assert_eq!(value(&edit, "Clarity2012"), Some(EditValue::Number(-100.0)));
        assert_eq!(value(&edit, "Sharpness"), Some(EditValue::Number(0.0)));
    }

    #[test]
    fn unusable_values_are_skipped() {
        let edit = translate(
            &params(json!({"exposure": "brighter", "contrast": null, "shadows": [1, 2]})),
            &kelvin(5500.0),
        );
        assert!(edit.is_empty());
        assert_eq!(edit.skipped(), &["contrast", "exposure", "shadows"]);
    }

    #[test]
    fn host_identifiers_are_accepted_as_input() {
        let edit = translate(&params(json!({"Highlights2012": -40})), &kelvin(5500.0));
        assert_eq!(edit.settings(), vec!["Highlights2012"]);
        assert_eq!(
            edit.get("Highlights2012").map(|entry| entry.label.as_str()),
            Some("Highlights")
        );
    }
}
