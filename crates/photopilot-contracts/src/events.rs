use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Context};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

const RESERVED_KEYS: [&str; 4] = ["type", "session_id", "seq", "ts"];

/// Append-only JSONL log of one chat session.
///
/// Every line carries `type`, `session_id`, a per-session `seq` and `ts`;
/// caller fields may not shadow those. The file is opened on first write
/// and kept open for the life of the log.
#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    session_id: String,
    seq: AtomicU64,
    file: Mutex<Option<File>>,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            session_id: session_id.into(),
            seq: AtomicU64::new(0),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Appends one event. `fields` must be a JSON object or null.
    pub fn record(&self, kind: &str, fields: Value) -> anyhow::Result<Value> {
        let fields = match fields {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => bail!("event fields must be an object, got {other}"),
        };

        let mut guard = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("event log lock poisoned"))?;
        if guard.is_none() {
            *guard = Some(self.open()?);
        }

        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(kind.to_string()));
        event.insert("session_id".to_string(), Value::String(self.session_id.clone()));
        event.insert(
            "seq".to_string(),
            Value::from(self.seq.fetch_add(1, Ordering::SeqCst)),
        );
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        for (key, value) in fields {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                event.insert(key, value);
            }
        }

        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes())
                .with_context(|| format!("appending to {}", self.path.display()))?;
        }
        Ok(Value::Object(event))
    }

    fn open(&self) -> anyhow::Result<File> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))
    }
}

/// Parses a log back into events, skipping blank lines.
pub fn read_events(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{} line {}", path.display(), index + 1))
        })
        .collect()
}

pub(crate) fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
