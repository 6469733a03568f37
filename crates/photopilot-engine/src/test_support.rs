use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use photopilot_contracts::develop::EditValue;
use serde_json::json;

use crate::host::{DevelopHost, MediaKind, SettingsRecord, ThumbnailCallback};

pub(crate) enum ThumbnailBehavior {
    Deliver(Vec<u8>),
    Fail(String),
    Never,
    Drop,
}

/// In-memory host with switches for the failure paths a real catalog
/// rarely hits.
pub(crate) struct FakeHost {
    pub module: String,
    pub selection: Vec<String>,
    pub photos: BTreeMap<String, (MediaKind, SettingsRecord)>,
    pub failing_settings: Vec<String>,
    pub fail_restore: bool,
    pub thumbnail: ThumbnailBehavior,
    pub steps: Vec<String>,
    held_callbacks: Mutex<Vec<ThumbnailCallback>>,
    thumbnail_requests: Mutex<Vec<(String, u32, u32)>>,
}

impl FakeHost {
    /// Photos with the given temperatures, all selected in order.
    pub fn with_photos(photos: &[(&str, f64)]) -> Self {
        let mut map = BTreeMap::new();
        for (id, temperature) in photos {
            let mut settings = SettingsRecord::new();
            settings.insert("Temperature".to_string(), json!(temperature));
            settings.insert("Tint".to_string(), json!(0.0));
            map.insert((*id).to_string(), (MediaKind::Photo, settings));
        }
        Self {
            module: "Develop".to_string(),
            selection: photos.iter().map(|(id, _)| (*id).to_string()).collect(),
            photos: map,
            failing_settings: Vec::new(),
            fail_restore: false,
            thumbnail: ThumbnailBehavior::Deliver(vec![0xFF, 0xD8, 0xFF, 0xD9]),
            steps: Vec::new(),
            held_callbacks: Mutex::new(Vec::new()),
            thumbnail_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn settings(&self, id: &str) -> SettingsRecord {
        self.photos
            .get(id)
            .map(|(_, settings)| settings.clone())
            .unwrap_or_default()
    }

    pub fn thumbnail_requests(&self) -> Vec<(String, u32, u32)> {
        self.thumbnail_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl DevelopHost for FakeHost {
    fn active_module(&self) -> String {
        self.module.clone()
    }

    fn selected_photos(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn media_kind(&self, photo: &str) -> Result<MediaKind> {
        self.photos
            .get(photo)
            .map(|(media, _)| *media)
            .with_context(|| format!("unknown photo {photo}"))
    }

    fn develop_settings(&self, photo: &str) -> Result<SettingsRecord> {
        self.photos
            .get(photo)
            .map(|(_, settings)| settings.clone())
            .with_context(|| format!("unknown photo {photo}"))
    }

    fn apply_step(
        &mut self,
        step_name: &str,
        photos: &[String],
        setting: &str,
        value: &EditValue,
    ) -> Result<()> {
        if self.failing_settings.iter().any(|failing| failing == setting) {
            bail!("{setting} is locked");
        }
        for id in photos {
            if let Some((_, settings)) = self.photos.get_mut(id) {
                settings.insert(setting.to_string(), value.to_json());
            }
        }
        self.steps.push(step_name.to_string());
        Ok(())
    }

    fn restore_settings(
        &mut self,
        step_name: &str,
        records: &BTreeMap<String, SettingsRecord>,
    ) -> Result<()> {
        if self.fail_restore {
            bail!("history is read-only");
        }
        for (id, record) in records {
            if let Some((_, settings)) = self.photos.get_mut(id) {
                *settings = record.clone();
            }
        }
        self.steps.push(step_name.to_string());
        Ok(())
    }

    fn request_thumbnail(
        &self,
        photo: &str,
        width: u32,
        height: u32,
        callback: ThumbnailCallback,
    ) -> Result<()> {
        if let Ok(mut requests) = self.thumbnail_requests.lock() {
            requests.push((photo.to_string(), width, height));
        }
        match &self.thumbnail {
            ThumbnailBehavior::Deliver(bytes) => callback(Ok(bytes.clone())),
            ThumbnailBehavior::Fail(message) => callback(Err(anyhow::anyhow!(message.clone()))),
            ThumbnailBehavior::Never => {
                if let Ok(mut held) = self.held_callbacks.lock() {
                    held.push(callback);
                }
            }
            ThumbnailBehavior::Drop => drop(callback),
        }
        Ok(())
    }
}
