use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracker_core::{PollSettings, StatusMarkers};
use tracker_engine::{ClientSettings, TrackerSettings};

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "tracker.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Contents of `tracker.ron`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub single_retry_delay_ms: u64,
    pub batch_retry_delay_ms: u64,
    pub unrecognized_status_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_body_bytes: u64,
    pub query_timeout_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub markers: MarkerConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let poll = PollSettings::default();
        Self {
            base_url: client.base_url,
            poll_interval_ms: millis(poll.poll_interval),
            single_retry_delay_ms: millis(poll.single_retry_delay),
            batch_retry_delay_ms: millis(poll.batch_retry_delay),
            unrecognized_status_delay_ms: millis(poll.unrecognized_status_delay),
            connect_timeout_ms: millis(client.connect_timeout),
            request_timeout_ms: millis(client.request_timeout),
            max_body_bytes: client.max_body_bytes,
            query_timeout_ms: 15_000,
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
            markers: MarkerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub processing: Vec<String>,
    pub completed: Vec<String>,
    pub pending_cleanup: Vec<String>,
    pub failed: Vec<String>,
    pub batch_completed: Vec<String>,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        let markers = StatusMarkers::default();
        Self {
            processing: markers.processing,
            completed: markers.completed,
            pending_cleanup: markers.pending_cleanup,
            failed: markers.failed,
            batch_completed: markers.batch_completed,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl TrackerConfig {
    /// The explicit path, else `./tracker.ron` when present.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILENAME);
                default_path.is_file().then(|| default_path.to_path_buf())
            }
        }
    }

    /// Reads `path`, or falls back to defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            client: self.client_settings(),
            poll: PollSettings {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                single_retry_delay: Duration::from_millis(self.single_retry_delay_ms),
                batch_retry_delay: Duration::from_millis(self.batch_retry_delay_ms),
                unrecognized_status_delay: Duration::from_millis(
                    self.unrecognized_status_delay_ms,
                ),
            },
            markers: self.status_markers(),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_body_bytes: self.max_body_bytes,
        }
    }

    pub fn status_markers(&self) -> StatusMarkers {
        StatusMarkers {
            processing: self.markers.processing.clone(),
            completed: self.markers.completed.clone(),
            pending_cleanup: self.markers.pending_cleanup.clone(),
            failed: self.markers.failed.clone(),
            batch_completed: self.markers.batch_completed.clone(),
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
