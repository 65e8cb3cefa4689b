//! Tracker core: pure polling state machine and view-model helpers.
mod classify;
mod download;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use classify::{
    classify_batch, classify_task, format_percentage, BatchSnapshot, Classification, Recheck,
    StatusMarkers, TaskSnapshot,
};
pub use download::{DownloadLabel, DownloadLink, TaskMode};
pub use effect::Effect;
pub use msg::{LookupResult, Msg};
pub use state::{
    normalize_task_id, Generation, PollSettings, PollTicket, TaskKind, TaskPhase, TrackerState,
};
pub use update::update;
pub use view_model::{Notice, Outcome, TrackedView, TrackerViewModel, NOT_FOUND_TEXT};
