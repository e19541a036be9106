//! Activity log: one JSON line per backend request outcome.
//!
//! Failures the dashboard deliberately keeps off screen (a failed search, a
//! failed poll) are recorded here, along with stale and dropped responses.
//! Routine successes are not. Writes are best-effort; an unwritable log
//! never affects the dashboard.
//!
//! The file is capped at [`MAX_LOG_BYTES`]. Crossing the cap compacts it to
//! the newest half.

use std::collections::VecDeque;
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::config::schema::LoggingConfig;

/// File name of the activity log inside the data directory.
const LOG_FILE_NAME: &str = "activity.jsonl";

/// Size at which the log is compacted.
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// What happened to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Applied to the view.
    Ok,
    /// The backend call failed.
    Failed,
    /// Superseded by a newer request and discarded.
    Stale,
    /// Arrived after its view was torn down.
    Dropped,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Stale => "stale",
            Self::Dropped => "dropped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub timestamp: String,
    /// Panel that issued the request (`chat`, `memory`, `stats`, ...).
    pub view: String,
    /// Endpoint path.
    pub request: String,
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ActivityEvent {
    pub fn new(view: &str, request: &str, outcome: Outcome, detail: Option<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            view: view.to_string(),
            request: request.to_string(),
            outcome,
            detail,
        }
    }
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: Option<PathBuf>,
    max_bytes: u64,
}

impl ActivityLog {
    /// Log under the data directory, or a disabled log when logging is off
    /// or there is no home directory.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: default_log_path(),
            max_bytes: MAX_LOG_BYTES,
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: None,
            max_bytes: MAX_LOG_BYTES,
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            max_bytes: MAX_LOG_BYTES,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, event: &ActivityEvent) {
        let Some(path) = &self.path else {
            return;
        };
        let _ = append_event(path, event, self.max_bytes);
    }

    /// The last `limit` events, oldest first. Malformed lines are skipped;
    /// a missing file reads as empty. Only `limit` events are held at once.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEvent> {
        let Some(lines) = self.lines() else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let mut tail = VecDeque::with_capacity(limit.min(256));
        for event in lines.filter_map(|line| serde_json::from_str::<ActivityEvent>(&line).ok()) {
            if tail.len() == limit {
                tail.pop_front();
            }
            tail.push_back(event);
        }
        tail.into()
    }

    /// Number of lines in the log, without parsing them.
    pub fn entry_count(&self) -> usize {
        self.lines()
            .map(|lines| lines.filter(|l| !l.trim().is_empty()).count())
            .unwrap_or(0)
    }

    fn lines(&self) -> Option<impl Iterator<Item = String>> {
        let file = fs::File::open(self.path.as_ref()?).ok()?;
        Some(BufReader::new(file).lines().map_while(Result::ok))
    }
}

pub fn default_log_path() -> Option<PathBuf> {
    config::data_dir().map(|dir| dir.join(LOG_FILE_NAME))
}

fn append_event(path: &Path, event: &ActivityEvent, max_bytes: u64) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(event)?;
    writeln!(file, "{json}")?;

    if file.metadata()?.len() > max_bytes {
        drop(file);
        compact(path, max_bytes / 2)?;
    }
    Ok(())
}

/// Rewrite the log keeping the newest whole lines that fit in `budget` bytes.
fn compact(path: &Path, budget: u64) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();

    let mut used = 0u64;
    let mut start = lines.len();
    while start > 0 {
        let len = lines[start - 1].len() as u64 + 1;
        if used + len > budget {
            break;
        }
        used += len;
        start -= 1;
    }

    let mut kept = lines[start..].join("\n");
    if !kept.is_empty() {
        kept.push('\n');
    }
    fs::write(path, kept)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
