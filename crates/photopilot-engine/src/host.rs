use std::collections::BTreeMap;

use anyhow::Result;
use photopilot_contracts::develop::EditValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A photo's full develop-settings record, keyed by host setting id.
pub type SettingsRecord = BTreeMap<String, Value>;

/// Completion for an asynchronous thumbnail render: JPEG bytes or the reason
/// the host could not produce them.
pub type ThumbnailCallback = Box<dyn FnOnce(Result<Vec<u8>>) + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
        }
    }
}

/// The editing application this assistant drives. Every mutation is a named
/// step in the host's history log.
pub trait DevelopHost {
    fn active_module(&self) -> String;

    /// Selected photo ids, primary first.
    fn selected_photos(&self) -> Vec<String>;

    fn media_kind(&self, photo: &str) -> Result<MediaKind>;

    fn develop_settings(&self, photo: &str) -> Result<SettingsRecord>;

    /// Sets one setting on every listed photo as a single history step.
    fn apply_step(
        &mut self,
        step_name: &str,
        photos: &[String],
        setting: &str,
        value: &EditValue,
    ) -> Result<()>;

    /// Replaces each photo's full record, all in one history step.
    fn restore_settings(
        &mut self,
        step_name: &str,
        records: &BTreeMap<String, SettingsRecord>,
    ) -> Result<()>;

    /// Starts a render and returns immediately; `callback` fires later,
    /// possibly on another thread, possibly never.
    fn request_thumbnail(
        &self,
        photo: &str,
        width: u32,
        height: u32,
        callback: ThumbnailCallback,
    ) -> Result<()>;
}
