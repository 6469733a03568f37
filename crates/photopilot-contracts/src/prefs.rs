use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Map, Value};

pub const PREF_API_KEY: &str = "api_key";
pub const PREF_MODEL: &str = "model";
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// JSON-backed preferences. Reads always refresh from disk so two processes
/// sharing a file see each other's writes; flushes merge only the keys this
/// instance changed.
#[derive(Debug, Clone)]
pub struct PrefsStore {
    path: PathBuf,
    payload: Map<String, Value>,
    dirty_keys: Vec<String>,
}

impl PrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            payload: Map::new(),
            dirty_keys: Vec::new(),
        }
    }

    /// `<config_dir>/photopilot/prefs.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("photopilot").join("prefs.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_string(&mut self, key: &str) -> Option<String> {
        self.refresh();
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn set_string(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.refresh();
        let snapshot = Value::String(value.trim().to_string());
        if self.payload.get(key) == Some(&snapshot) {
            return Ok(());
        }
        self.payload.insert(key.to_string(), snapshot);
        if !self.dirty_keys.iter().any(|dirty| dirty == key) {
            self.dirty_keys.push(key.to_string());
        }
        self.flush()
    }

    pub fn flush(&mut self) -> anyhow::Result<()> {
        if self.dirty_keys.is_empty() {
            return Ok(());
        }
        let mut on_disk = read_json_object(&self.path).unwrap_or_default();
        for key in &self.dirty_keys {
            if let Some(value) = self.payload.get(key) {
                on_disk.insert(key.clone(), value.clone());
            }
        }
        write_json_object(&self.path, &on_disk)?;
        self.payload = on_disk;
        self.dirty_keys.clear();
        Ok(())
    }

    fn refresh(&mut self) {
        let mut on_disk = read_json_object(&self.path).unwrap_or_default();
        for key in &self.dirty_keys {
            if let Some(value) = self.payload.get(key) {
                on_disk.insert(key.clone(), value.clone());
            }
        }
        self.payload = on_disk;
    }
}

/// Stored key first, then the environment. `None` is reported as
/// `CredentialMissing` when a request is attempted, not at startup.
pub fn resolve_api_key(prefs: &mut PrefsStore) -> Option<String> {
    resolve_api_key_with(prefs, |name| std::env::var(name).ok())
}

fn resolve_api_key_with(
    prefs: &mut PrefsStore,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    prefs.get_string(PREF_API_KEY).or_else(|| {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| env(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    })
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload.clone()))?,
    )
    .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{resolve_api_key_with, PrefsStore, PREF_API_KEY, PREF_MODEL};

    #[test]
    fn set_string_persists_and_trims() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("prefs.json");
        let mut prefs = PrefsStore::new(&path);
        prefs.set_string(PREF_MODEL, "  gemini-2.5-pro ")?;

        let mut reloaded = PrefsStore::new(&path);
        assert_eq!(reloaded.get_string(PREF_MODEL), Some("gemini-2.5-pro".to_string()));
        Ok(())
    }

    #[test]
    fn flush_merges_with_concurrent_writer() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("prefs.json");
        let mut prefs_a = PrefsStore::new(&path);
        let mut prefs_b = PrefsStore::new(&path);

        prefs_a.set_string(PREF_API_KEY, "key-a")?;
        prefs_b.set_string(PREF_MODEL, "gemini-2.0-flash")?;

        let mut reloaded = PrefsStore::new(&path);
        assert_eq!(reloaded.get_string(PREF_API_KEY), Some("key-a".to_string()));
        assert_eq!(reloaded.get_string(PREF_MODEL), Some("gemini-2.0-flash".to_string()));
        assert_eq!(prefs_a.get_string(PREF_MODEL), Some("gemini-2.0-flash".to_string()));
        Ok(())
    }

    #[test]
    fn blank_values_read_as_missing() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("prefs.json");
        std::fs::write(&path, r#"{"api_key": "   ", "model": 3}"#)?;
        let mut prefs = PrefsStore::new(&path);
        assert_eq!(prefs.get_string(PREF_API_KEY), None);
        assert_eq!(prefs.get_string(PREF_MODEL), None);
        Ok(())
    }

    #[test]
    fn api_key_prefers_stored_value_then_env_order() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut prefs = PrefsStore::new(temp.path().join("prefs.json"));

        let env = |name: &str| match name {
            "GEMINI_API_KEY" => Some(" ".to_string()),
            "GOOGLE_API_KEY" => Some("google-key".to_string()),
            _ => None,
        };
        assert_eq!(resolve_api_key_with(&mut prefs, env), Some("google-key".to_string()));

        prefs.set_string(PREF_API_KEY, "stored")?;
        assert_eq!(resolve_api_key_with(&mut prefs, env), Some("stored".to_string()));
        assert_eq!(resolve_api_key_with(&mut prefs, |_| None), Some("stored".to_string()));
        Ok(())
    }

    #[test]
    fn missing_everywhere_is_none() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut prefs = PrefsStore::new(temp.path().join("prefs.json"));
        assert_eq!(resolve_api_key_with(&mut prefs, |_| None), None);
        Ok(())
    }
}
