use std::collections::BTreeMap;

use photopilot_contracts::develop::{EditEntry, EditValue, TranslatedEdit};
use photopilot_contracts::error::AssistError;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::host::{DevelopHost, MediaKind, SettingsRecord};

const STEP_PREFIX: &str = "Photopilot";

/// Full prior records of every photo an edit touched.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub targets: Vec<String>,
    pub prior_settings: BTreeMap<String, SettingsRecord>,
    pub steps: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedStep {
    pub setting: String,
    pub label: String,
    pub value: EditValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedStep {
    pub setting: String,
    pub label: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyReport {
    pub photos: Vec<String>,
    pub applied: Vec<AppliedStep>,
    pub failed: Vec<FailedStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndoReport {
    pub photos: Vec<String>,
    pub steps: usize,
}

/// Applies translated edits one named step per setting and keeps a single
/// undo slot. A new edit replaces the slot, making the previous one permanent.
#[derive(Debug, Default)]
pub struct EditExecutor {
    undo_slot: Option<EditSnapshot>,
}

impl EditExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_slot.is_some()
    }

    pub fn pending_undo(&self) -> Option<&EditSnapshot> {
        self.undo_slot.as_ref()
    }

    /// Steps commit independently: a failing setting is reported and the
    /// rest still apply. Errors only when nothing was applied.
    pub fn apply<H: DevelopHost + ?Sized>(
        &mut self,
        host: &mut H,
        edit: &TranslatedEdit,
    ) -> Result<ApplyReport, AssistError> {
        let photos = host.selected_photos();
        let Some(primary) = photos.first() else {
            return Err(AssistError::NoSelection);
        };
        let media = host.media_kind(primary)?;
        if media != MediaKind::Photo {
            return Err(AssistError::UnsupportedMedia(media.label().to_string()));
        }
        if edit.is_empty() {
            return Err(AssistError::HostFailure(
                "the suggested edit has no usable settings".to_string(),
            ));
        }

        let mut prior_settings = BTreeMap::new();
        for photo in &photos {
            prior_settings.insert(photo.clone(), host.develop_settings(photo)?);
        }

        let mut applied = Vec::new();
        let mut failed = Vec::new();
        for entry in edit.entries() {
            let step_name = format!("{STEP_PREFIX}: {} {}", entry.label, step_value(entry));
            match host.apply_step(&step_name, &photos, &entry.setting, &entry.value) {
                Ok(()) => {
                    debug!(step = %step_name, photos = photos.len(), "step applied");
                    applied.push(AppliedStep {
                        setting: entry.setting.clone(),
                        label: entry.label.clone(),
                        value: entry.value.clone(),
                    });
                }
                Err(err) => {
                    warn!(setting = %entry.setting, error = %format!("{err:#}"), "step failed");
                    failed.push(FailedStep {
                        setting: entry.setting.clone(),
                        label: entry.label.clone(),
                        error: format!("{err:#}"),
                    });
                }
            }
        }

        if applied.is_empty() {
            let reasons: Vec<String> = failed
                .iter()
                .map(|step| format!("{}: {}", step.label, step.error))
                .collect();
            return Err(AssistError::HostFailure(reasons.join("; ")));
        }

        info!(
            photos = photos.len(),
            applied = applied.len(),
            failed = failed.len(),
            "edit applied"
        );
        self.undo_slot = Some(EditSnapshot {
            targets: photos.clone(),
            prior_settings,
            steps: applied.len(),
        });
        Ok(ApplyReport {
            photos,
            applied,
            failed,
        })
    }

    /// Restores every captured photo in one step and empties the slot. A
    /// failed restore leaves the slot in place.
    pub fn undo<H: DevelopHost + ?Sized>(
        &mut self,
        host: &mut H,
    ) -> Result<UndoReport, AssistError> {
        let Some(snapshot) = self.undo_slot.take() else {
            return Err(AssistError::NothingToUndo);
        };
        let step_name = format!(
            "{STEP_PREFIX}: Undo {} adjustment{}",
            snapshot.steps,
            if snapshot.steps == 1 { "" } else { "s" }
        );
        if let Err(err) = host.restore_settings(&step_name, &snapshot.prior_settings) {
            self.undo_slot = Some(snapshot);
            return Err(err.into());
        }
        info!(photos = snapshot.targets.len(), "edit undone");
        Ok(UndoReport {
            photos: snapshot.targets,
            steps: snapshot.steps,
        })
    }
}

/// Slider positions read signed ("+20"); levels such as Kelvin do not.
fn step_value(entry: &EditEntry) -> String {
    match entry.value.as_f64() {
        Some(number) if number > 0.0 && !entry.absolute => format!("+{}", entry.value),
        _ => entry.value.to_string(),
    }
}
