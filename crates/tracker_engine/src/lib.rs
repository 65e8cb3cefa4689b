//! Tracker engine: status API client and effect execution.
mod client;
mod lookup;
mod tracker;
mod types;

pub use client::{ClientSettings, ReqwestStatusClient, StatusClient};
pub use lookup::{query_once, QueryOutcome};
pub use tracker::{TrackerHandle, TrackerSettings};
pub use types::{
    BatchStatusResponse, ClientError, SubTaskStatus, SystemStatus, TaskStatusResponse,
    TrackerEvent,
};
