//! Append-only run log for generation requests.
//!
//! Events are stored in NDJSON format (one JSON object per line) so a run
//! can be audited after the fact: which tasks ran, how long they took,
//! what failed. The log is optional; without one the pipeline runs silent.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: the action performed (request_start, task_complete, ...)
//! - `actor`: the owner string (e.g., `user@HOST`)
//! - `task`: optional task name for task-level events
//! - `details`: freeform object with action-specific details

use crate::error::{PlumeError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A generation request started.
    RequestStart,
    /// A task entered Running.
    TaskStart,
    /// A task reached Completed.
    TaskComplete,
    /// A task reached Failed.
    TaskFail,
    /// The request finished with a letter.
    RequestComplete,
    /// The request aborted.
    RequestFail,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::RequestStart => write!(f, "request_start"),
            EventAction::TaskStart => write!(f, "task_start"),
            EventAction::TaskComplete => write!(f, "task_complete"),
            EventAction::TaskFail => write!(f, "task_fail"),
            EventAction::RequestComplete => write!(f, "request_complete"),
            EventAction::RequestFail => write!(f, "request_fail"),
        }
    }
}

/// An event record for the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The actor who performed the action (e.g., `user@HOST`).
    pub actor: String,

    /// Optional task name for task-level events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action, stamped now.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string(),
            task: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the task name for this event.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PlumeError::Config(format!("failed to serialize event: {}", e)))
    }
}

/// Get the actor string for event metadata.
fn actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append-only NDJSON log bound to one file path.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    /// Bind a log to a path. Nothing is created until the first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single JSON line, creating the file and its
    /// parent directory on first use. The write is synced so the log
    /// survives a crash right after a state transition.
    pub fn append(&self, event: &Event) -> Result<()> {
        let json_line = event.to_ndjson_line()?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                PlumeError::Config(format!(
                    "failed to create event log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                PlumeError::Config(format!(
                    "failed to open event log '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            PlumeError::Config(format!(
                "failed to write event to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            PlumeError::Config(format!(
                "failed to sync event log '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}
