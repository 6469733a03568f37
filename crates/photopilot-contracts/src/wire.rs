use serde_json::{json, Value};

use crate::chat::{ChatTurn, Role};
use crate::develop::{ContextSnapshot, WhiteBalanceMode};
use crate::error::AssistError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WirePart {
    Text(String),
    InlineImage {
        mime_type: String,
        data_base64: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WireTurn {
    pub role: Role,
    pub parts: Vec<WirePart>,
}

impl From<&ChatTurn> for WireTurn {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role,
            parts: vec![WirePart::Text(turn.text.clone())],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_instruction: String,
    pub turns: Vec<WireTurn>,
    pub generation: GenerationConfig,
}

impl ModelRequest {
    /// History turns as-is, then the latest user turn carrying the context
    /// block and any image. Context is never attached to older turns.
    pub fn build(
        system_instruction: &str,
        history: &[ChatTurn],
        latest_user_text: &str,
        context: &ContextSnapshot,
        image: Option<WirePart>,
        generation: GenerationConfig,
    ) -> Self {
        let mut turns: Vec<WireTurn> = history.iter().map(WireTurn::from).collect();
        let include_white_balance = image.is_some();
        let mut parts = Vec::new();
        if let Some(image) = image {
            parts.push(image);
        }
        parts.push(WirePart::Text(format!(
            "{}\n\n{}",
            latest_user_text.trim(),
            context_block(context, include_white_balance)
        )));
        turns.push(WireTurn {
            role: Role::User,
            parts,
        });
        Self {
            system_instruction: system_instruction.to_string(),
            turns,
            generation,
        }
    }

    pub fn to_json(&self) -> Value {
        let contents: Vec<Value> = self
            .turns
            .iter()
            .map(|turn| {
                json!({
                    "role": turn.role.wire_name(),
                    "parts": turn.parts.iter().map(part_json).collect::<Vec<Value>>(),
                })
            })
            .collect();
        json!({
            "system_instruction": {
                "parts": [{ "text": self.system_instruction }],
            },
            "contents": contents,
            "generationConfig": {
                "temperature": self.generation.temperature,
                "maxOutputTokens": self.generation.max_output_tokens,
            },
        })
    }

    pub fn latest_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::User)
            .and_then(|turn| {
                turn.parts.iter().find_map(|part| match part {
                    WirePart::Text(text) => Some(text.as_str()),
                    WirePart::InlineImage { .. } => None,
                })
            })
    }

    pub fn has_image(&self) -> bool {
        self.turns.iter().any(|turn| {
            turn.parts
                .iter()
                .any(|part| matches!(part, WirePart::InlineImage { .. }))
        })
    }
}

fn part_json(part: &WirePart) -> Value {
    match part {
        WirePart::Text(text) => json!({ "text": text }),
        WirePart::InlineImage {
            mime_type,
            data_base64,
        } => json!({
            "inline_data": {
                "mime_type": mime_type,
                "data": data_base64,
            }
        }),
    }
}

/// Context appended to the latest user turn. White balance is only
/// included for image analysis requests.
pub fn context_block(context: &ContextSnapshot, include_white_balance: bool) -> String {
    let mut lines = vec![
        "[Editor context]".to_string(),
        format!("Active module: {}", context.active_module),
        format!("Selected photos: {}", context.selected_count),
    ];
    if include_white_balance {
        let temperature = context
            .current_temperature
            .map(|value| match context.white_balance {
                WhiteBalanceMode::Kelvin => format!("{value:.0} K"),
                WhiteBalanceMode::Slider => format!("{value:+.0}"),
            })
            .unwrap_or_else(|| "unknown".to_string());
        let tint = context
            .current_tint
            .map(|value| format!("{value:+.0}"))
            .unwrap_or_else(|| "unknown".to_string());
        lines.push(format!(
            "White balance: {} mode (temperature {temperature}, tint {tint})",
            context.white_balance.label()
        ));
    }
    lines.join("\n")
}

/// Pulls the reply text out of a response body. A vendor `error` object
/// becomes `UpstreamError` with its message unchanged.
pub fn parse_envelope(payload: &Value) -> Result<String, AssistError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(AssistError::UpstreamError(message));
    }
    let Some(candidate) = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    else {
        let reason = payload
            .get("promptFeedback")
            .and_then(|feedback| feedback.get("blockReason"))
            .and_then(Value::as_str)
            .map(|reason| format!("no candidates (blocked: {reason})"))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(AssistError::EnvelopeMalformed(reason));
    };
    let text: String = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(AssistError::EnvelopeMalformed(
            "first candidate has no text".to_string(),
        ));
    }
    Ok(text)
}
