use crate::{DownloadLink, Generation, TaskKind, TaskPhase};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { link: Option<DownloadLink> },
    Failed { message: String },
    NotFound,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

pub const NOT_FOUND_TEXT: &str = "Task not found. Check the task ID and try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    EmptyId,
    Stopped { id: String },
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::EmptyId => "Please enter a task ID".to_string(),
            Notice::Stopped { id } => format!("Stopped tracking {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedView {
    pub id: String,
    pub kind: Option<TaskKind>,
    pub phase: TaskPhase,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerViewModel {
    pub tracked: Option<TrackedView>,
    pub status_text: Option<String>,
    pub outcome: Option<Outcome>,
    pub notice: Option<Notice>,
    pub dirty: bool,
}
