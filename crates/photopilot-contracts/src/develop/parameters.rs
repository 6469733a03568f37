use serde::Serialize;

/// Panel groups, in the order edits are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    BasicTone,
    Presence,
    ToneCurve,
    Effects,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::BasicTone,
        Bucket::Presence,
        Bucket::ToneCurve,
        Bucket::Effects,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Bucket::BasicTone => "Basic tone",
            Bucket::Presence => "Presence and color",
            Bucket::ToneCurve => "Tone curve",
            Bucket::Effects => "Detail and effects",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueDomain {
    Range(f64, f64),
    /// Kelvin or slider depending on the photo; see `sanitize_temperature`.
    WhiteBalanceTemperature,
    Tint,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Name the model is told to use.
    pub name: &'static str,
    /// Host develop-setting identifier.
    pub setting: &'static str,
    pub label: &'static str,
    pub bucket: Bucket,
    pub domain: ValueDomain,
}

pub const PARAMETER_SPECS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "temperature",
        setting: "Temperature",
        label: "Temperature",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::WhiteBalanceTemperature,
    },
    ParameterSpec {
        name: "tint",
        setting: "Tint",
        label: "Tint",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Tint,
    },
    ParameterSpec {
        name: "exposure",
        setting: "Exposure2012",
        label: "Exposure",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Range(-5.0, 5.0),
    },
    ParameterSpec {
        name: "contrast",
        setting: "Contrast2012",
        label: "Contrast",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "highlights",
        setting: "Highlights2012",
        label: "Highlights",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "shadows",
        setting: "Shadows2012",
        label: "Shadows",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "whites",
        setting: "Whites2012",
        label: "Whites",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "blacks",
        setting: "Blacks2012",
        label: "Blacks",
        bucket: Bucket::BasicTone,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "texture",
        setting: "Texture",
        label: "Texture",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "clarity",
        setting: "Clarity2012",
        label: "Clarity",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "dehaze",
        setting: "Dehaze",
        label: "Dehaze",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "vibrance",
        setting: "Vibrance",
        label: "Vibrance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation",
        setting: "Saturation",
        label: "Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_red",
        setting: "HueAdjustmentRed",
        label: "Red Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_red",
        setting: "SaturationAdjustmentRed",
        label: "Red Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_red",
        setting: "LuminanceAdjustmentRed",
        label: "Red Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_orange",
        setting: "HueAdjustmentOrange",
        label: "Orange Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_orange",
        setting: "SaturationAdjustmentOrange",
        label: "Orange Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_orange",
        setting: "LuminanceAdjustmentOrange",
        label: "Orange Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_yellow",
        setting: "HueAdjustmentYellow",
        label: "Yellow Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_yellow",
        setting: "SaturationAdjustmentYellow",
        label: "Yellow Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_yellow",
        setting: "LuminanceAdjustmentYellow",
        label: "Yellow Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_green",
        setting: "HueAdjustmentGreen",
        label: "Green Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_green",
        setting: "SaturationAdjustmentGreen",
        label: "Green Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_green",
        setting: "LuminanceAdjustmentGreen",
        label: "Green Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_aqua",
        setting: "HueAdjustmentAqua",
        label: "Aqua Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_aqua",
        setting: "SaturationAdjustmentAqua",
        label: "Aqua Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_aqua",
        setting: "LuminanceAdjustmentAqua",
        label: "Aqua Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_blue",
        setting: "HueAdjustmentBlue",
        label: "Blue Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_blue",
        setting: "SaturationAdjustmentBlue",
        label: "Blue Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_blue",
        setting: "LuminanceAdjustmentBlue",
        label: "Blue Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_purple",
        setting: "HueAdjustmentPurple",
        label: "Purple Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_purple",
        setting: "SaturationAdjustmentPurple",
        label: "Purple Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_purple",
        setting: "LuminanceAdjustmentPurple",
        label: "Purple Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "hue_magenta",
        setting: "HueAdjustmentMagenta",
        label: "Magenta Hue",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "saturation_magenta",
        setting: "SaturationAdjustmentMagenta",
        label: "Magenta Saturation",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "luminance_magenta",
        setting: "LuminanceAdjustmentMagenta",
        label: "Magenta Luminance",
        bucket: Bucket::Presence,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "parametric_highlights",
        setting: "ParametricHighlights",
        label: "Tone Curve Highlights",
        bucket: Bucket::ToneCurve,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "parametric_lights",
        setting: "ParametricLights",
        label: "Tone Curve Lights",
        bucket: Bucket::ToneCurve,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "parametric_darks",
        setting: "ParametricDarks",
        label: "Tone Curve Darks",
        bucket: Bucket::ToneCurve,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "parametric_shadows",
        setting: "ParametricShadows",
        label: "Tone Curve Shadows",
        bucket: Bucket::ToneCurve,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "sharpness",
        setting: "Sharpness",
        label: "Sharpening",
        bucket: Bucket::Effects,
        domain: ValueDomain::Range(0.0, 150.0),
    },
    ParameterSpec {
        name: "luminance_noise",
        setting: "LuminanceSmoothing",
        label: "Luminance Noise Reduction",
        bucket: Bucket::Effects,
        domain: ValueDomain::Range(0.0, 100.0),
    },
    ParameterSpec {
        name: "color_noise",
        setting: "ColorNoiseReduction",
        label: "Color Noise Reduction",
        bucket: Bucket::Effects,
        domain: ValueDomain::Range(0.0, 100.0),
    },
    ParameterSpec {
        name: "vignette_amount",
        setting: "PostCropVignetteAmount",
        label: "Vignette",
        bucket: Bucket::Effects,
        domain: ValueDomain::Range(-100.0, 100.0),
    },
    ParameterSpec {
        name: "grain_amount",
        setting: "GrainAmount",
        label: "Grain",
        bucket: Bucket::Effects,
        domain: ValueDomain::Range(0.0, 100.0),
    },
];

fn lookup_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Finds a parameter by semantic name or by host setting identifier,
/// ignoring case and separators. Returns the table position with the spec.
pub fn lookup_parameter(raw: &str) -> Option<(usize, &'static ParameterSpec)> {
    let key = lookup_key(raw);
    if key.is_empty() {
        return None;
    }
    PARAMETER_SPECS
        .iter()
        .enumerate()
        .find(|(_, spec)| lookup_key(spec.name) == key || lookup_key(spec.setting) == key)
}
