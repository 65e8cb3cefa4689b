//! Classification of status responses into tracker outcomes.
//!
//! Markers are compared verbatim against the server's strings. The batch
//! aggregate status is authoritative: sub-task statuses only feed the
//! progress text and never decide completion.
use std::collections::BTreeMap;

use crate::download::{DownloadLabel, DownloadLink, TaskMode};

/// Wire strings the server uses for each status family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMarkers {
    pub processing: Vec<String>,
    pub completed: Vec<String>,
    pub pending_cleanup: Vec<String>,
    pub failed: Vec<String>,
    pub batch_completed: Vec<String>,
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self {
            processing: vec!["processing".to_string()],
            completed: vec!["completed".to_string(), "已完成".to_string()],
            pending_cleanup: vec![
                "被下载过进入清理倒计时".to_string(),
                "cleanup_pending".to_string(),
            ],
            failed: vec!["failed".to_string()],
            batch_completed: vec!["已完成".to_string(), "completed".to_string()],
        }
    }
}

fn contains(markers: &[String], status: &str) -> bool {
    markers.iter().any(|marker| marker == status)
}

impl StatusMarkers {
    pub fn is_processing(&self, status: &str) -> bool {
        contains(&self.processing, status)
    }

    pub fn is_completed(&self, status: &str) -> bool {
        contains(&self.completed, status)
    }

    pub fn is_pending_cleanup(&self, status: &str) -> bool {
        contains(&self.pending_cleanup, status)
    }

    pub fn is_failed(&self, status: &str) -> bool {
        contains(&self.failed, status)
    }

    pub fn is_batch_completed(&self, status: &str) -> bool {
        contains(&self.batch_completed, status)
    }
}

/// Aggregate batch status as returned by `GET /api/batch/{id}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchSnapshot {
    pub status: String,
    /// Sub-task id to its individual status.
    pub sub_tasks: BTreeMap<String, String>,
    pub progress_percentage: Option<f64>,
}

/// Single task status as returned by `GET /api/task/{id}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskSnapshot {
    pub status: String,
    pub mode: TaskMode,
    pub filename: Option<String>,
    pub error: Option<String>,
    pub progress: Option<String>,
    pub progress_percentage: Option<f64>,
}

/// How soon a non-terminal task should be queried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recheck {
    /// Regular poll interval.
    Interval,
    /// Status not recognized as processing (queued and similar); check sooner.
    Soon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Processing {
        text: String,
        recheck: Recheck,
    },
    Completed {
        progress: Option<String>,
        link: Option<DownloadLink>,
    },
    Failed {
        message: String,
    },
}

impl Classification {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Classification::Processing { .. })
    }
}

pub fn classify_batch(
    batch_id: &str,
    snapshot: &BatchSnapshot,
    markers: &StatusMarkers,
) -> Classification {
    let total = snapshot.sub_tasks.len();
    let done = snapshot
        .sub_tasks
        .values()
        .filter(|status| markers.is_completed(status) || markers.is_pending_cleanup(status))
        .count();
    let text = match snapshot.progress_percentage {
        Some(percentage) => format!(
            "Progress: {done}/{total} ({})",
            format_percentage(percentage)
        ),
        None => format!("Progress: {done}/{total}"),
    };

    if markers.is_batch_completed(&snapshot.status) {
        Classification::Completed {
            progress: Some(text),
            link: Some(DownloadLink::for_batch(batch_id)),
        }
    } else {
        Classification::Processing {
            text,
            recheck: Recheck::Interval,
        }
    }
}

pub fn classify_task(snapshot: &TaskSnapshot, markers: &StatusMarkers) -> Classification {
    let status = snapshot.status.as_str();

    let label = if markers.is_completed(status) {
        Some(DownloadLabel::File)
    } else if markers.is_pending_cleanup(status) {
        Some(DownloadLabel::FilePendingCleanup)
    } else {
        None
    };
    if let Some(label) = label {
        let link = snapshot
            .filename
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| DownloadLink::for_task(snapshot.mode, name, label));
        return Classification::Completed {
            progress: None,
            link,
        };
    }

    if markers.is_failed(status) {
        let reason = snapshot
            .error
            .as_deref()
            .filter(|error| !error.is_empty())
            .unwrap_or("unknown error");
        return Classification::Failed {
            message: format!("Processing failed: {reason}"),
        };
    }

    let recheck = if markers.is_processing(status) {
        Recheck::Interval
    } else {
        Recheck::Soon
    };
    Classification::Processing {
        text: progress_text(snapshot, recheck),
        recheck,
    }
}

fn progress_text(snapshot: &TaskSnapshot, recheck: Recheck) -> String {
    if let Some(percentage) = snapshot.progress_percentage {
        return format_percentage(percentage);
    }
    if let Some(progress) = snapshot.progress.as_deref().filter(|p| !p.trim().is_empty()) {
        return progress.to_string();
    }
    match recheck {
        Recheck::Interval => "Processing...".to_string(),
        Recheck::Soon => snapshot.status.clone(),
    }
}

/// `40.0` renders as `40%`, `12.5` as `12.5%`.
pub fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}%")
    } else {
        format!("{value}%")
    }
}
