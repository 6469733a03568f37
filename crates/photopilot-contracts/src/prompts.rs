use crate::develop::{Bucket, PARAMETER_SPECS};

const CHAT_PREAMBLE: &str = "You are a photo-editing coach working inside a photo catalog and \
develop application. Answer questions about editing clearly and briefly, and explain why an \
adjustment helps so the user learns.";

const ACTION_CONTRACT: &str = "When the user asks you to change the photo, include exactly one \
JSON object in a ```json fenced block:\n\
{\"action\": \"apply_develop_settings\", \"params\": {\"<name>\": <number>, ...}}\n\
Only use the parameter names listed below. Give values as plain numbers. Do not include the \
JSON block when the user only asks a question.";

const TEMPERATURE_CONTRACT: &str = "White balance: when the context says Kelvin mode, \
`temperature` may be an absolute Kelvin value (e.g. 6500), a negative Kelvin change (e.g. -800 \
for cooler), or a small relative nudge between -100 and 100. In slider mode use -100..100 only. \
`tint` is always -150..150.";

const ANALYSIS_PREAMBLE: &str = "The attached image is a preview of the selected photo. Describe \
its strengths and the two or three adjustments that would improve it most, then propose them \
as an action payload.";

fn parameter_catalog() -> String {
    let mut lines = Vec::new();
    for bucket in Bucket::ALL {
        let names: Vec<&str> = PARAMETER_SPECS
            .iter()
            .filter(|spec| spec.bucket == bucket)
            .map(|spec| spec.name)
            .collect();
        lines.push(format!("- {}: {}", bucket.label(), names.join(", ")));
    }
    lines.join("\n")
}

pub fn chat_system_instruction() -> String {
    format!(
        "{CHAT_PREAMBLE}\n\n{ACTION_CONTRACT}\n\nParameters:\n{}\n\n{TEMPERATURE_CONTRACT}",
        parameter_catalog()
    )
}

pub fn analysis_system_instruction() -> String {
    format!("{}\n\n{ANALYSIS_PREAMBLE}", chat_system_instruction())
}

pub const DEFAULT_ANALYSIS_PROMPT: &str = "Please analyze this photo and suggest edits.";

#[cfg(test)]
mod tests {
    use super::{analysis_system_instruction, chat_system_instruction};

    #[test]
    fn instruction_lists_every_bucket_and_key_names() {
        let text = chat_system_instruction();
        assert!(text.contains("- Basic tone: temperature, tint, exposure"));
        assert!(text.contains("parametric_highlights"));
        assert!(text.contains("luminance_magenta"));
        assert!(text.contains("apply_develop_settings"));
    }

    #[test]
    fn analysis_extends_chat_instruction() {
        assert!(analysis_system_instruction().starts_with(&chat_system_instruction()));
    }
}
