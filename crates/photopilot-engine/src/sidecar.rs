use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use photopilot_contracts::develop::EditValue;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::host::{DevelopHost, MediaKind, SettingsRecord, ThumbnailCallback};

const RAW_EXTENSIONS: [&str; 8] = ["dng", "cr2", "cr3", "nef", "arw", "raf", "orf", "rw2"];
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "m4v", "avi"];
const AS_SHOT_KELVIN: f64 = 5500.0;
const THUMBNAIL_JPEG_QUALITY: u8 = 85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPhoto {
    pub path: PathBuf,
    pub media: MediaKind,
    #[serde(default)]
    pub settings: SettingsRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStep {
    pub name: String,
    pub photos: Vec<String>,
    pub ts: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CatalogState {
    active_module: String,
    #[serde(default)]
    selection: Vec<String>,
    #[serde(default)]
    photos: BTreeMap<String, CatalogPhoto>,
    #[serde(default)]
    history: Vec<HistoryStep>,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            active_module: "Develop".to_string(),
            selection: Vec::new(),
            photos: BTreeMap::new(),
            history: Vec::new(),
        }
    }
}

/// File-backed host: photos, selection and a named history log persisted to
/// one JSON catalog. Every mutation is written through immediately.
#[derive(Debug, Clone)]
pub struct SidecarCatalog {
    path: PathBuf,
    state: CatalogState,
}

impl SidecarCatalog {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing catalog {}", path.display()))?
        } else {
            CatalogState::default()
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers a file and returns its id. Re-adding the same path returns
    /// the existing id; a clashing file name gets a numeric suffix.
    pub fn add_photo(&mut self, file: &Path) -> Result<String> {
        if !file.is_file() {
            bail!("photo not found: {}", file.display());
        }
        if let Some((id, _)) = self
            .state
            .photos
            .iter()
            .find(|(_, photo)| photo.path == file)
        {
            return Ok(id.clone());
        }
        let base = file
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("photo")
            .to_string();
        let mut id = base.clone();
        let mut suffix = 2;
        while self.state.photos.contains_key(&id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }

        let media = media_kind_for_path(file);
        let photo = CatalogPhoto {
            path: file.to_path_buf(),
            media,
            settings: initial_settings(file, media),
        };
        self.commit(|state| {
            state.photos.insert(id.clone(), photo);
        })?;
        debug!(photo = %id, media = media.label(), "photo registered");
        Ok(id)
    }

    pub fn photo_ids(&self) -> Vec<String> {
        self.state.photos.keys().cloned().collect()
    }

    pub fn photo(&self, id: &str) -> Option<&CatalogPhoto> {
        self.state.photos.get(id)
    }

    /// Replaces the selection; the first id becomes the primary photo.
    pub fn select(&mut self, ids: &[String]) -> Result<()> {
        if let Some(unknown) = ids.iter().find(|id| !self.state.photos.contains_key(*id)) {
            bail!("unknown photo id: {unknown}");
        }
        let mut selection: Vec<String> = Vec::new();
        for id in ids {
            if !selection.contains(id) {
                selection.push(id.clone());
            }
        }
        self.commit(|state| state.selection = selection)
    }

    pub fn set_active_module(&mut self, module: &str) -> Result<()> {
        let module = module.trim();
        if module.is_empty() {
            bail!("module name is empty");
        }
        self.commit(|state| state.active_module = module.to_string())
    }

    pub fn history(&self) -> &[HistoryStep] {
        &self.state.history
    }

    pub fn save(&self) -> Result<()> {
        write_state(&self.path, &self.state)
    }

    /// Applies `change` to a copy of the state and swaps the copy in only
    /// once it is on disk, so a failed write leaves memory untouched.
    fn commit(&mut self, change: impl FnOnce(&mut CatalogState)) -> Result<()> {
        let mut next = self.state.clone();
        change(&mut next);
        write_state(&self.path, &next)?;
        self.state = next;
        Ok(())
    }

    fn photo_entry(&self, id: &str) -> Result<&CatalogPhoto> {
        self.state
            .photos
            .get(id)
            .with_context(|| format!("unknown photo id: {id}"))
    }

}

impl CatalogState {
    fn record_step(&mut self, name: &str, photos: Vec<String>) {
        self.history.push(HistoryStep {
            name: name.to_string(),
            photos,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
    }
}

fn write_state(path: &Path, state: &CatalogState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(state)?)
        .with_context(|| format!("writing catalog {}", path.display()))?;
    Ok(())
}

impl DevelopHost for SidecarCatalog {
    fn active_module(&self) -> String {
        self.state.active_module.clone()
    }

    fn selected_photos(&self) -> Vec<String> {
        self.state.selection.clone()
    }

    fn media_kind(&self, photo: &str) -> Result<MediaKind> {
        Ok(self.photo_entry(photo)?.media)
    }

    fn develop_settings(&self, photo: &str) -> Result<SettingsRecord> {
        Ok(self.photo_entry(photo)?.settings.clone())
    }

    fn apply_step(
        &mut self,
        step_name: &str,
        photos: &[String],
        setting: &str,
        value: &EditValue,
    ) -> Result<()> {
        for id in photos {
            self.photo_entry(id)?;
        }
        let value = value.to_json();
        if value.is_null() {
            bail!("{setting}: value is not representable");
        }
        self.commit(|state| {
            for id in photos {
                if let Some(photo) = state.photos.get_mut(id) {
                    photo.settings.insert(setting.to_string(), value.clone());
                }
            }
            state.record_step(step_name, photos.to_vec());
        })
    }

    fn restore_settings(
        &mut self,
        step_name: &str,
        records: &BTreeMap<String, SettingsRecord>,
    ) -> Result<()> {
        for id in records.keys() {
            self.photo_entry(id)?;
        }
        self.commit(|state| {
            for (id, record) in records {
                if let Some(photo) = state.photos.get_mut(id) {
                    photo.settings = record.clone();
                }
            }
            state.record_step(step_name, records.keys().cloned().collect());
        })
    }

    fn request_thumbnail(
        &self,
        photo: &str,
        width: u32,
        height: u32,
        callback: ThumbnailCallback,
    ) -> Result<()> {
        let path = self.photo_entry(photo)?.path.clone();
        thread::Builder::new()
            .name("thumbnail".to_string())
            .spawn(move || callback(render_thumbnail(&path, width, height)))
            .context("spawning thumbnail worker")?;
        Ok(())
    }
}

pub fn media_kind_for_path(path: &Path) -> MediaKind {
    if VIDEO_EXTENSIONS.contains(&extension_of(path).as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Photo
    }
}

/// RAW captures open with an as-shot Kelvin white balance; rendered files
/// (JPEG, PNG, TIFF) use the relative slider.
fn initial_settings(path: &Path, media: MediaKind) -> SettingsRecord {
    let mut settings = SettingsRecord::new();
    if media == MediaKind::Video {
        return settings;
    }
    let temperature = if RAW_EXTENSIONS.contains(&extension_of(path).as_str()) {
        AS_SHOT_KELVIN
    } else {
        0.0
    };
    settings.insert("Temperature".to_string(), json!(temperature));
    settings.insert("Tint".to_string(), json!(0.0));
    settings
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Fits the image inside `width`x`height`, flattens alpha onto white and
/// encodes a JPEG.
fn render_thumbnail(path: &Path, width: u32, height: u32) -> Result<Vec<u8>> {
    let image =
        image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let rgba = image.to_rgba8();
    let mut flattened = RgbaImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| -> u8 {
            (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8
        };
        flattened.put_pixel(
            x,
            y,
            Rgba([blend(pixel[0]), blend(pixel[1]), blend(pixel[2]), 255]),
        );
    }
    let resized = DynamicImage::ImageRgba8(flattened)
        .resize(width.max(1), height.max(1), FilterType::Triangle)
        .to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, THUMBNAIL_JPEG_QUALITY)
        .encode_image(&DynamicImage::ImageRgb8(resized))
        .context("encoding thumbnail")?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::mpsc;
    use std::time::Duration;

    use image::{Rgb, RgbImage};
    use photopilot_contracts::develop::{translate, ContextSnapshot, EditValue};
    use photopilot_contracts::error::AssistError;
    use serde_json::json;

    use super::{media_kind_for_path, SidecarCatalog};
    use crate::executor::EditExecutor;
    use crate::host::{DevelopHost, MediaKind, SettingsRecord};

    fn touch(dir: &std::path::Path, name: &str) -> anyhow::Result<std::path::PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, b"raw")?;
        Ok(path)
    }

    #[test]
    fn raw_files_start_in_kelvin_and_jpegs_in_slider_mode() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut catalog = SidecarCatalog::open(temp.path().join("catalog.json"))?;
        let raw = catalog.add_photo(&touch(temp.path(), "IMG_0001.CR3")?)?;
        let jpeg = catalog.add_photo(&touch(temp.path(), "beach.jpg")?)?;

        assert_eq!(catalog.develop_settings(&raw)?.get("Temperature"), Some(&json!(5500.0)));
        assert_eq!(catalog.develop_settings(&jpeg)?.get("Temperature"), Some(&json!(0.0)));
        assert_eq!(catalog.media_kind(&raw)?, MediaKind::Photo);
        Ok(())
    }

    #[test]
    fn video_extensions_are_detected() {
        assert_eq!(media_kind_for_path(std::path::Path::new("clip.MOV")), MediaKind::Video);
        assert_eq!(media_kind_for_path(std::path::Path::new("still.tif")), MediaKind::Photo);
    }

    #[test]
    fn clashing_names_get_suffixes_and_readding_is_stable() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        std::fs::create_dir_all(temp.path().join("b"))?;
        let mut catalog = SidecarCatalog::open(temp.path().join("catalog.json"))?;
        let first = catalog.add_photo(&touch(temp.path(), "a.jpg")?)?;
        let second = catalog.add_photo(&touch(&temp.path().join("b"), "a.jpg")?)?;
        let again = catalog.add_photo(&temp.path().join("a.jpg"))?;

        assert_eq!(first, "a.jpg");
        assert_eq!(second, "a.jpg-2");
        assert_eq!(again, first);
        assert!(catalog.add_photo(&temp.path().join("missing.jpg")).is_err());
        Ok(())
    }

    #[test]
    fn steps_are_logged_and_persisted() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let catalog_path = temp.path().join("catalog.json");
        let mut catalog = SidecarCatalog::open(&catalog_path)?;
        let id = catalog.add_photo(&touch(temp.path(), "a.dng")?)?;
        catalog.select(&[id.clone()])?;
        catalog.apply_step(
            "Exposure +0.5",
            &[id.clone()],
            "Exposure2012",
            &EditValue::Number(0.5),
        )?;

        let mut records = BTreeMap::new();
        let mut record = SettingsRecord::new();
        record.insert("Temperature".to_string(), json!(4800.0));
        records.insert(id.clone(), record.clone());
        catalog.restore_settings("Undo", &records)?;

        let reopened = SidecarCatalog::open(&catalog_path)?;
        let names: Vec<&str> = reopened.history().iter().map(|step| step.name.as_str()).collect();
        assert_eq!(names, vec!["Exposure +0.5", "Undo"]);
        assert_eq!(reopened.develop_settings(&id)?, record);
        assert_eq!(reopened.selected_photos(), vec![id]);
        Ok(())
    }

    #[test]
    fn unknown_ids_are_rejected_without_mutation() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut catalog = SidecarCatalog::open(temp.path().join("catalog.json"))?;
        let id = catalog.add_photo(&touch(temp.path(), "a.jpg")?)?;
        let targets = vec![id.clone(), "ghost.jpg".to_string()];

        assert!(catalog.select(&targets).is_err());
        assert!(catalog
            .apply_step("Contrast +10", &targets, "Contrast2012", &EditValue::Number(10.0))
            .is_err());
        assert!(catalog.history().is_empty());
        assert_eq!(catalog.develop_settings(&id)?.get("Contrast2012"), None);
        Ok(())
    }

    #[test]
    fn failed_write_leaves_state_untouched() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let catalog_path = temp.path().join("catalog.json");
        let mut catalog = SidecarCatalog::open(&catalog_path)?;
        let id = catalog.add_photo(&touch(temp.path(), "a.nef")?)?;
        catalog.select(&[id.clone()])?;
        let before = catalog.develop_settings(&id)?;

        std::fs::remove_file(&catalog_path)?;
        std::fs::create_dir(&catalog_path)?;

        let ctx = ContextSnapshot::new("Develop", 1, Some(5500.0), Some(0.0));
        let params = json!({"exposure": 1.5});
        let edit = translate(params.as_object().unwrap_or(&serde_json::Map::new()), &ctx);
        let mut executor = EditExecutor::new();
        assert!(matches!(
            executor.apply(&mut catalog, &edit),
            Err(AssistError::HostFailure(_))
        ));
        assert!(!executor.can_undo());
        assert_eq!(catalog.develop_settings(&id)?, before);
        assert!(catalog.history().is_empty());

        let mut records = BTreeMap::new();
        records.insert(id.clone(), SettingsRecord::new());
        assert!(catalog.restore_settings("Undo", &records).is_err());
        assert_eq!(catalog.develop_settings(&id)?, before);
        assert!(catalog.history().is_empty());

        assert!(catalog.set_active_module("Library").is_err());
        assert_eq!(catalog.active_module(), "Develop");
        Ok(())
    }

    #[test]
    fn thumbnails_are_rendered_as_jpeg_on_a_worker() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let source = temp.path().join("wide.png");
        RgbImage::from_pixel(64, 32, Rgb([200, 120, 40])).save(&source)?;
        let mut catalog = SidecarCatalog::open(temp.path().join("catalog.json"))?;
        let id = catalog.add_photo(&source)?;

        let (tx, rx) = mpsc::channel();
        catalog.request_thumbnail(
            &id,
            16,
            16,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        )?;
        let bytes = rx.recv_timeout(Duration::from_secs(5))??;
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes)?;
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
        Ok(())
    }
}
