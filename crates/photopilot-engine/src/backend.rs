use std::collections::VecDeque;
use std::env;
use std::sync::Mutex;
use std::time::Duration;

use photopilot_contracts::error::AssistError;
use photopilot_contracts::models::{DRYRUN_BACKEND, GEMINI_BACKEND};
use photopilot_contracts::wire::{parse_envelope, ModelRequest};
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_BODY_MAX_CHARS: usize = 512;

/// One text-generation service. Implementations never retry; a failed call
/// is reported and the user decides whether to resend.
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Credential changes apply to the next call.
    fn set_api_key(&mut self, _api_key: Option<String>) {}

    fn generate(&self, model: &str, request: &ModelRequest) -> Result<String, AssistError>;
}

pub struct GeminiBackend {
    api_base: String,
    api_key: Option<String>,
    http: HttpClient,
}

impl GeminiBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_base: env::var("GEMINI_API_BASE")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            http: HttpClient::new(),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }
}

impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        GEMINI_BACKEND
    }

    fn set_api_key(&mut self, api_key: Option<String>) {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
    }

    fn generate(&self, model: &str, request: &ModelRequest) -> Result<String, AssistError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(AssistError::CredentialMissing);
        };
        let endpoint = self.endpoint_for_model(model);
        debug!(endpoint = %endpoint, turns = request.turns.len(), "posting generateContent");

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(REQUEST_TIMEOUT)
            .json(&request.to_json())
            .send()
            .map_err(|err| AssistError::TransportFailure(transport_message(err)))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| AssistError::TransportFailure(transport_message(err)))?;

        match serde_json::from_str::<Value>(&body) {
            Ok(payload) => parse_envelope(&payload),
            Err(_) if !status.is_success() => {
                warn!(status = status.as_u16(), "gemini returned a non-JSON error body");
                Err(AssistError::UpstreamError(format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    truncate_text(body.trim(), ERROR_BODY_MAX_CHARS)
                )))
            }
            Err(err) => Err(AssistError::EnvelopeMalformed(format!(
                "response body is not JSON ({err})"
            ))),
        }
    }
}

/// Strips the query string so the key never reaches a status line.
fn transport_message(err: reqwest::Error) -> String {
    let timed_out = err.is_timeout();
    let message = err.without_url().to_string();
    if timed_out {
        return format!("timed out after {}s: {message}", REQUEST_TIMEOUT.as_secs());
    }
    message
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

/// Replays queued replies and records every request it receives. With a
/// fallback it never runs dry, which is what `--dryrun` uses.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, AssistError>>>,
    requests: Mutex<Vec<(String, ModelRequest)>>,
    fallback: bool,
}

impl ScriptedBackend {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, AssistError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            fallback: false,
        }
    }

    pub fn dryrun() -> Self {
        Self {
            fallback: true,
            ..Self::default()
        }
    }

    /// `(model, request)` pairs in call order.
    pub fn requests(&self) -> Vec<(String, ModelRequest)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        DRYRUN_BACKEND
    }

    fn generate(&self, model: &str, request: &ModelRequest) -> Result<String, AssistError> {
        self.requests
            .lock()
            .map_err(|_| AssistError::HostFailure("scripted backend lock poisoned".to_string()))?
            .push((model.to_string(), request.clone()));
        let next = self
            .replies
            .lock()
            .map_err(|_| AssistError::HostFailure("scripted backend lock poisoned".to_string()))?
            .pop_front();
        match next {
            Some(reply) => reply,
            None if self.fallback => Ok(dryrun_reply(request)),
            None => Err(AssistError::TransportFailure(
                "scripted backend has no reply queued".to_string(),
            )),
        }
    }
}

fn dryrun_reply(request: &ModelRequest) -> String {
    if request.has_image() {
        return "Dry run: the preview reads slightly flat and cool. A touch more exposure and \
contrast, with a warmer white balance, would give it more life.\n\n```json\n\
{\"action\": \"apply_develop_settings\", \"params\": {\"exposure\": 0.3, \"contrast\": 12, \
\"temperature\": 8}}\n```"
            .to_string();
    }
    let question = request
        .latest_user_text()
        .and_then(|text| text.split("\n\n[Editor context]").next())
        .unwrap_or("")
        .trim();
    format!("Dry run: no model was called. You asked: \"{question}\"")
}

#[cfg(test)]
mod tests {
    use photopilot_contracts::chat::extract_action;
    use photopilot_contracts::develop::ContextSnapshot;
    use photopilot_contracts::error::AssistError;
    use photopilot_contracts::wire::{GenerationConfig, ModelRequest, WirePart};

    use super::{transport_message, GeminiBackend, HttpClient, ModelBackend, ScriptedBackend};

    fn request(image: Option<WirePart>) -> ModelRequest {
        ModelRequest::build(
            "system",
            &[],
            "how do I recover the sky?",
            &ContextSnapshot::new("Develop", 1, Some(5500.0), Some(0.0)),
            image,
            GenerationConfig::default(),
        )
    }

    #[test]
    fn missing_key_fails_before_any_network_call() {
        let backend =
            GeminiBackend::new(Some("   ".to_string())).with_api_base("http://unused.invalid");
        assert_eq!(
            backend.generate("gemini-2.5-flash", &request(None)),
            Err(AssistError::CredentialMissing)
        );
    }

    #[test]
    fn endpoint_accepts_bare_and_prefixed_model_names() {
        let backend = GeminiBackend::new(None).with_api_base("https://example.test/v1beta/");
        assert_eq!(
            backend.endpoint_for_model("gemini-2.5-pro"),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
        assert_eq!(
            backend.endpoint_for_model("models/gemini-2.0-flash"),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn transport_messages_drop_the_keyed_url() {
        // Rejected by the client before any connection is attempted.
        let err = match HttpClient::new()
            .get("ftp://example.invalid/v1beta/models/m:generateContent?key=secret-key")
            .send()
        {
            Ok(_) => panic!("unsupported scheme was accepted"),
            Err(err) => err,
        };
        assert!(err.url().is_some());
        let message = transport_message(err);
        assert!(!message.is_empty());
        assert!(!message.contains("secret-key"));
    }

    #[test]
    fn scripted_replies_are_served_in_order_and_recorded() {
        let backend = ScriptedBackend::new(vec![
            Ok("first".to_string()),
            Err(AssistError::UpstreamError("quota".to_string())),
        ]);
        assert_eq!(backend.generate("m", &request(None)), Ok("first".to_string()));
        assert_eq!(
            backend.generate("m", &request(None)),
            Err(AssistError::UpstreamError("quota".to_string()))
        );
        assert!(matches!(
            backend.generate("m", &request(None)),
            Err(AssistError::TransportFailure(_))
        ));
        assert_eq!(backend.requests().len(), 3);
        assert_eq!(backend.requests()[0].0, "m");
    }

    #[test]
    fn dryrun_analysis_reply_carries_an_action() {
        let backend = ScriptedBackend::dryrun();
        let image = WirePart::InlineImage {
            mime_type: "image/jpeg".to_string(),
            data_base64: "AAAA".to_string(),
        };
        let reply = backend
            .generate("dryrun-text-1", &request(Some(image)))
            .unwrap_or_default();
        let action = extract_action(&reply);
        assert_eq!(action.map(|action| action.action), Some("applydevelopsettings".to_string()));

        let echo = backend.generate("dryrun-text-1", &request(None)).unwrap_or_default();
        assert!(echo.ends_with("\"how do I recover the sky?\""));
    }
}
