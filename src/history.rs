use chrono::{DateTime, Local};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::format::two_decimals;
use crate::level::Level;
use crate::util;

/// One successful attempt. Created on an exact-match submit and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub level: Level,
    /// Seconds from start to submit
    #[serde(with = "decimal")]
    pub time: f64,
    #[serde(with = "decimal")]
    pub wpm: f64,
    #[serde(with = "decimal")]
    pub accuracy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Local>>,
}

impl AttemptRecord {
    pub fn new(level: Level, time: f64, wpm: f64, accuracy: f64) -> Self {
        Self {
            level,
            time,
            wpm,
            accuracy,
            recorded_at: None,
        }
    }

    pub fn recorded_at(mut self, at: DateTime<Local>) -> Self {
        self.recorded_at = Some(at);
        self
    }
}

/// Numbers are persisted as two-decimal strings; either strings or JSON
/// numbers are accepted on read.
mod decimal {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::two_decimals(*val))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(t) => t
                .trim()
                .parse::<f64>()
                .map_err(|e| de::Error::custom(format!("invalid decimal `{t}`: {e}"))),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history io error: {0}")]
    Io(#[from] io::Error),
    #[error("history encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history export error: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only list of attempt records, in chronological order
pub trait HistoryStore: std::fmt::Debug {
    /// All records; absent or unreadable data is an empty history.
    fn load_all(&self) -> Vec<AttemptRecord>;
    fn append(&mut self, record: AttemptRecord) -> Result<(), HistoryError>;
    fn clear(&mut self) -> Result<(), HistoryError>;
}

/// Records persisted as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::history_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &[AttemptRecord]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl Default for FileHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore for FileHistoryStore {
    fn load_all(&self) -> Vec<AttemptRecord> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "history unreadable");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Option<Vec<AttemptRecord>>>(&bytes) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "history malformed, treating as empty");
                Vec::new()
            }
        }
    }

    fn append(&mut self, record: AttemptRecord) -> Result<(), HistoryError> {
        let mut records = self.load_all();
        records.push(record);
        self.write_all(&records)?;
        tracing::info!(count = records.len(), path = %self.path.display(), "attempt recorded");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        tracing::info!(path = %self.path.display(), "history cleared");
        Ok(())
    }
}

/// Non-persistent store, used by `--no-save` and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    records: Vec<AttemptRecord>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<AttemptRecord>) -> Self {
        Self { records }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load_all(&self) -> Vec<AttemptRecord> {
        self.records.clone()
    }

    fn append(&mut self, record: AttemptRecord) -> Result<(), HistoryError> {
        self.records.push(record);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.records.clear();
        Ok(())
    }
}

/// Write `records` as CSV with a header row
pub fn export_csv<W: io::Write>(records: &[AttemptRecord], writer: W) -> Result<(), HistoryError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["level", "time", "wpm", "accuracy", "recorded_at"])?;
    for r in records {
        wtr.write_record([
            r.level.to_string(),
            two_decimals(r.time),
            two_decimals(r.wpm),
            two_decimals(r.accuracy),
            r.recorded_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummary {
    pub level: Level,
    pub attempts: usize,
    pub best_wpm: f64,
    pub average_wpm: f64,
    pub wpm_std_dev: f64,
    pub best_time: f64,
}

/// Per-level aggregates in level order; levels without attempts are left out
pub fn summarize(records: &[AttemptRecord]) -> Vec<LevelSummary> {
    let by_level = records.iter().into_group_map_by(|r| r.level);

    Level::ALL
        .iter()
        .filter_map(|level| {
            let group = by_level.get(level)?;
            let wpms = group.iter().map(|r| r.wpm).collect::<Vec<f64>>();
            let times = group.iter().map(|r| r.time).collect::<Vec<f64>>();
            Some(LevelSummary {
                level: *level,
                attempts: group.len(),
                best_wpm: util::max(&wpms).unwrap_or(0.0),
                average_wpm: util::mean(&wpms).unwrap_or(0.0),
                wpm_std_dev: util::std_dev(&wpms).unwrap_or(0.0),
                best_time: util::min(&times).unwrap_or(0.0),
            })
        })
        .collect()
}
