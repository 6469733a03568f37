use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use photopilot_contracts::chat::{
    display_text, extract_action, ActionKind, ActionRequest, ChatTurn, Conversation,
};
use photopilot_contracts::develop::{translate, TranslatedEdit};
use photopilot_contracts::error::AssistError;
use photopilot_contracts::events::EventLog;
use photopilot_contracts::models::{Capability, ModelSelector};
use photopilot_contracts::prompts::{
    analysis_system_instruction, chat_system_instruction, DEFAULT_ANALYSIS_PROMPT,
};
use photopilot_contracts::summary::{write_summary, SessionSummary};
use photopilot_contracts::wire::{GenerationConfig, ModelRequest, WirePart};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::backend::ModelBackend;
use crate::context::read_context;
use crate::executor::{ApplyReport, EditExecutor};
use crate::host::{DevelopHost, MediaKind};
use crate::thumbnail::{export_thumbnail, thumbnail_part, THUMBNAIL_SIZE, THUMBNAIL_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sending,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub model: String,
    pub generation: GenerationConfig,
    pub thumbnail_size: u32,
    pub thumbnail_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            generation: GenerationConfig::default(),
            thumbnail_size: THUMBNAIL_SIZE,
            thumbnail_timeout: THUMBNAIL_TIMEOUT,
        }
    }
}

/// What one user action produced. Errors are already folded into `status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Model prose to show, if a reply arrived.
    pub display: Option<String>,
    pub action: Option<ActionRequest>,
    pub edit: Option<TranslatedEdit>,
    pub report: Option<ApplyReport>,
    pub status: Vec<String>,
}

impl TurnOutcome {
    fn status(line: impl Into<String>) -> Self {
        Self {
            status: vec![line.into()],
            ..Self::default()
        }
    }
}

/// One conversation against one host. Requests are strictly sequential;
/// the single undo slot lives in the executor owned here.
pub struct Session<H: DevelopHost> {
    id: String,
    host: H,
    backend: Box<dyn ModelBackend>,
    selector: ModelSelector,
    config: SessionConfig,
    conversation: Conversation,
    state: SessionState,
    executor: EditExecutor,
    events: EventLog,
    started_at: String,
    turns: u64,
    edits_applied: u64,
    undos: u64,
}

impl<H: DevelopHost> Session<H> {
    pub fn new(
        host: H,
        backend: Box<dyn ModelBackend>,
        events_path: impl Into<PathBuf>,
        config: SessionConfig,
    ) -> Result<Self> {
        let id = format!("session-{}", uuid::Uuid::new_v4().simple());
        let events = EventLog::new(events_path, id.clone());
        let started_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false);
        events.record(
            "session_started",
            json!({
                "model": config.model,
                "backend": backend.name(),
            }),
        )?;
        info!(session_id = %id, model = %config.model, backend = backend.name(), "session started");

        Ok(Self {
            id,
            host,
            backend,
            selector: ModelSelector::default(),
            config,
            conversation: Conversation::new(),
            state: SessionState::Idle,
            executor: EditExecutor::new(),
            events,
            started_at,
            turns: 0,
            edits_applied: 0,
            undos: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn can_undo(&self) -> bool {
        self.executor.can_undo()
    }

    pub fn events_path(&self) -> &Path {
        self.events.path()
    }

    /// Switches the chat model; unknown or text-incapable names are refused.
    pub fn set_model(&mut self, requested: &str) -> Result<String, String> {
        let requested = requested.trim();
        let registry = &self.selector.registry;
        match registry.lookup(requested, Capability::Text) {
            Some(spec) => {
                self.config.model = spec.name.clone();
                Ok(spec.name.clone())
            }
            None => Err(format!(
                "Unknown model '{requested}'. Known: {}",
                registry.names_for(Capability::Text).join(", ")
            )),
        }
    }

    pub fn set_api_key(&mut self, api_key: Option<String>) {
        self.backend.set_api_key(api_key);
    }

    pub fn send(&mut self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::default();
        }
        if self.state == SessionState::Sending {
            return TurnOutcome::status(AssistError::Busy.to_string());
        }
        let context = read_context(&self.host);
        let request = ModelRequest::build(
            &chat_system_instruction(),
            self.conversation.turns(),
            text,
            &context,
            None,
            self.config.generation,
        );
        let model = self.config.model.clone();
        self.exchange(text, &model, request)
    }

    /// Sends a preview of the primary photo with `prompt` (or the default
    /// analysis prompt) to a vision-capable model.
    pub fn analyze(&mut self, prompt: Option<&str>) -> TurnOutcome {
        if self.state == SessionState::Sending {
            return TurnOutcome::status(AssistError::Busy.to_string());
        }
        let prompt = prompt
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ANALYSIS_PROMPT)
            .to_string();

        let image = match self.primary_thumbnail() {
            Ok(image) => image,
            Err(err) => {
                self.emit(
                    "request_failed",
                    json!({"error": err.code(), "message": err.to_string(), "stage": "thumbnail"}),
                );
                return TurnOutcome::status(err.to_string());
            }
        };

        let mut status = Vec::new();
        let model = match self
            .selector
            .select(Some(self.config.model.as_str()), Capability::Vision)
        {
            Ok(selection) => {
                if let Some(reason) = selection.fallback_reason {
                    status.push(format!("{reason} Using {}.", selection.model.name));
                }
                selection.model.name
            }
            Err(reason) => return TurnOutcome::status(reason),
        };

        let context = read_context(&self.host);
        let request = ModelRequest::build(
            &analysis_system_instruction(),
            self.conversation.turns(),
            &prompt,
            &context,
            Some(image),
            self.config.generation,
        );
        let mut outcome = self.exchange(&prompt, &model, request);
        status.append(&mut outcome.status);
        outcome.status = status;
        outcome
    }

    pub fn undo(&mut self) -> TurnOutcome {
        match self.executor.undo(&mut self.host) {
            Ok(report) => {
                self.undos += 1;
                self.emit(
                    "edit_undone",
                    json!({"photos": report.photos, "steps": report.steps}),
                );
                TurnOutcome::status(format!(
                    "Reverted {} adjustment{} on {} photo{}.",
                    report.steps,
                    plural(report.steps),
                    report.photos.len(),
                    plural(report.photos.len())
                ))
            }
            Err(err) => TurnOutcome::status(err.to_string()),
        }
    }

    /// Starts a new conversation. The pending undo survives.
    pub fn reset(&mut self) -> TurnOutcome {
        let cleared = self.conversation.len();
        self.conversation.clear();
        self.state = SessionState::Idle;
        self.emit("session_reset", json!({"cleared_turns": cleared}));
        TurnOutcome::status("Started a new conversation.")
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            started_at: self.started_at.clone(),
            finished_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false),
            turns: self.turns,
            edits_applied: self.edits_applied,
            undos: self.undos,
        }
    }

    pub fn finish(&mut self, summary_path: &Path) -> Result<SessionSummary> {
        let summary = self.summary();
        let mut extra = Map::new();
        extra.insert("model".to_string(), Value::String(self.config.model.clone()));
        write_summary(summary_path, &summary, Some(&extra))?;
        self.events.record(
            "session_finished",
            json!({
                "turns": summary.turns,
                "edits_applied": summary.edits_applied,
                "undos": summary.undos,
            }),
        )?;
        info!(session_id = %self.id, turns = summary.turns, "session finished");
        Ok(summary)
    }

    fn primary_thumbnail(&self) -> Result<WirePart, AssistError> {
        let photos = self.host.selected_photos();
        let Some(primary) = photos.first() else {
            return Err(AssistError::NoSelection);
        };
        let media = self.host.media_kind(primary)?;
        if media != MediaKind::Photo {
            return Err(AssistError::UnsupportedMedia(media.label().to_string()));
        }
        let encoded = export_thumbnail(
            &self.host,
            primary,
            self.config.thumbnail_size,
            self.config.thumbnail_timeout,
        )?;
        Ok(thumbnail_part(encoded))
    }

    /// Idle → Sending → Done | Failed. The user turn joins the history only
    /// together with a reply, so a failed send can simply be retried.
    fn exchange(&mut self, user_text: &str, model: &str, request: ModelRequest) -> TurnOutcome {
        self.state = SessionState::Sending;
        self.emit(
            "request_sent",
            json!({
                "model": model,
                "turns": request.turns.len(),
                "has_image": request.has_image(),
            }),
        );

        let reply = match self.backend.generate(model, &request) {
            Ok(reply) => reply,
            Err(err) => {
                self.state = SessionState::Failed;
                warn!(session_id = %self.id, error = err.code(), "request failed");
                self.emit(
                    "request_failed",
                    json!({"error": err.code(), "message": err.to_string(), "stage": "request"}),
                );
                return TurnOutcome::status(err.to_string());
            }
        };
        self.state = SessionState::Done;
        self.turns += 1;
        self.conversation.push(ChatTurn::user(user_text));
        self.conversation.push(ChatTurn::assistant(reply.clone()));
        self.emit(
            "response_received",
            json!({"model": model, "chars": reply.chars().count()}),
        );

        let mut outcome = TurnOutcome {
            display: Some(display_text(&reply)),
            ..TurnOutcome::default()
        };
        let Some(action) = extract_action(&reply) else {
            return outcome;
        };
        self.emit(
            "action_extracted",
            json!({"action": action.action, "params": action.params}),
        );
        if let ActionKind::Unrecognized(name) = &action.kind {
            outcome
                .status
                .push(format!("Ignored unsupported action '{name}'."));
            outcome.action = Some(action);
            return outcome;
        }

        let context = read_context(&self.host);
        let edit = translate(&action.params, &context);
        if !edit.skipped().is_empty() {
            outcome.status.push(format!(
                "Skipped unusable values for: {}.",
                edit.skipped().join(", ")
            ));
        }
        match self.executor.apply(&mut self.host, &edit) {
            Ok(report) => {
                self.edits_applied += 1;
                self.emit(
                    "edit_applied",
                    json!({
                        "photos": report.photos,
                        "applied": report.applied,
                        "failed": report.failed,
                    }),
                );
                outcome.status.push(applied_status(&report));
                for failed in &report.failed {
                    outcome
                        .status
                        .push(format!("Could not set {}: {}", failed.label, failed.error));
                }
                outcome.report = Some(report);
            }
            Err(err) => {
                self.emit(
                    "edit_failed",
                    json!({"error": err.code(), "message": err.to_string()}),
                );
                outcome.status.push(err.to_string());
            }
        }
        outcome.action = Some(action);
        outcome.edit = Some(edit);
        outcome
    }

    fn emit(&self, event_type: &str, fields: Value) {
        if let Err(err) = self.events.record(event_type, fields) {
            warn!(event_type, error = %format!("{err:#}"), "event log write failed");
        }
    }
}

fn applied_status(report: &ApplyReport) -> String {
    let changes: Vec<String> = report
        .applied
        .iter()
        .map(|step| format!("{} {}", step.label, step.value))
        .collect();
    format!(
        "Applied to {} photo{}: {}. Type /undo to revert.",
        report.photos.len(),
        plural(report.photos.len()),
        changes.join(", ")
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
