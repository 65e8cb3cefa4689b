use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tracker_core::{BatchSnapshot, TaskMode, TaskSnapshot, TrackerViewModel};

/// Body of `GET /api/batch/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchStatusResponse {
    #[serde(default)]
    pub batch_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub sub_tasks: BTreeMap<String, SubTaskStatus>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubTaskStatus {
    pub status: String,
}

/// Body of `GET /api/task/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemStatus {
    pub busy: bool,
    #[serde(default)]
    pub queue_length: u64,
}

impl BatchStatusResponse {
    pub fn into_snapshot(self) -> BatchSnapshot {
        BatchSnapshot {
            status: self.status,
            sub_tasks: self
                .sub_tasks
                .into_iter()
                .map(|(id, sub)| (id, sub.status))
                .collect(),
            progress_percentage: self.progress_percentage,
        }
    }
}

impl TaskStatusResponse {
    pub fn into_snapshot(self) -> TaskSnapshot {
        TaskSnapshot {
            mode: TaskMode::from_wire(self.mode.as_deref()),
            status: self.status,
            filename: self.filename,
            error: self.error,
            progress: self.progress,
            progress_percentage: self.progress_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("response too large (max {max_bytes}, actual {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// A non-success HTTP answer is the signal that an id is not of the queried kind.
    pub fn is_not_found_signal(&self) -> bool {
        matches!(self, ClientError::HttpStatus(_))
    }
}

/// Events published by a running tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    ViewChanged(TrackerViewModel),
    /// The tracker shut down; no further events follow.
    Stopped,
}
