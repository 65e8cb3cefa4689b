use std::time::Duration;

use crate::classify::StatusMarkers;
use crate::view_model::{Notice, Outcome, TrackedView, TrackerViewModel};

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Single,
    Batch,
}

/// Last known status of the tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Querying,
    Processing,
    Completed,
    Failed,
    NotFound,
}

impl TaskPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskPhase::Completed | TaskPhase::Failed | TaskPhase::NotFound
        )
    }
}

/// Identity captured by every scheduled tick and in-flight query.
///
/// A ticket is honoured only while it equals the tracker's current ticket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollTicket {
    pub id: String,
    pub generation: Generation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub single_retry_delay: Duration,
    pub batch_retry_delay: Duration,
    pub unrecognized_status_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            single_retry_delay: Duration::from_millis(2000),
            batch_retry_delay: Duration::from_millis(2000),
            unrecognized_status_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackedTask {
    pub(crate) ticket: PollTicket,
    /// `None` until a lookup has succeeded or the caller supplied it.
    pub(crate) kind: Option<TaskKind>,
    pub(crate) phase: TaskPhase,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerState {
    settings: PollSettings,
    markers: StatusMarkers,
    tracked: Option<TrackedTask>,
    last_generation: Generation,
    status_text: Option<String>,
    outcome: Option<Outcome>,
    notice: Option<Notice>,
    dirty: bool,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(settings: PollSettings, markers: StatusMarkers) -> Self {
        Self {
            settings,
            markers,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn markers(&self) -> &StatusMarkers {
        &self.markers
    }

    pub fn view(&self) -> TrackerViewModel {
        TrackerViewModel {
            tracked: self.tracked.as_ref().map(|task| TrackedView {
                id: task.ticket.id.clone(),
                kind: task.kind,
                phase: task.phase,
                generation: task.ticket.generation,
            }),
            status_text: self.status_text.clone(),
            outcome: self.outcome.clone(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Ticket of the live poll loop; `None` when idle, stopped, or terminal.
    pub fn active_ticket(&self) -> Option<&PollTicket> {
        self.tracked
            .as_ref()
            .filter(|task| !task.phase.is_terminal())
            .map(|task| &task.ticket)
    }

    pub fn is_current(&self, ticket: &PollTicket) -> bool {
        self.active_ticket() == Some(ticket)
    }

    /// Returns true if the state changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn tracked_kind(&self) -> Option<TaskKind> {
        self.tracked.as_ref().and_then(|task| task.kind)
    }

    pub(crate) fn begin_tracking(&mut self, id: String, kind: Option<TaskKind>) -> PollTicket {
        self.last_generation += 1;
        let ticket = PollTicket {
            id,
            generation: self.last_generation,
        };
        self.tracked = Some(TrackedTask {
            ticket: ticket.clone(),
            kind,
            phase: TaskPhase::Querying,
        });
        self.status_text = None;
        self.outcome = None;
        self.notice = None;
        self.dirty = true;
        ticket
    }

    pub(crate) fn stop_tracking(&mut self) {
        if let Some(task) = self.tracked.take() {
            self.notice = Some(Notice::Stopped {
                id: task.ticket.id,
            });
            self.dirty = true;
        }
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        if self.notice.as_ref() != Some(&notice) {
            self.notice = Some(notice);
            self.dirty = true;
        }
    }

    pub(crate) fn resolve_kind(&mut self, kind: TaskKind) {
        if let Some(task) = self.tracked.as_mut() {
            if task.kind != Some(kind) {
                task.kind = Some(kind);
                self.dirty = true;
            }
        }
    }

    pub(crate) fn set_phase(&mut self, phase: TaskPhase) {
        if let Some(task) = self.tracked.as_mut() {
            if task.phase != phase {
                task.phase = phase;
                self.dirty = true;
            }
        }
    }

    pub(crate) fn set_status_text(&mut self, text: String) {
        if self.status_text.as_deref() != Some(text.as_str()) {
            self.status_text = Some(text);
            self.dirty = true;
        }
    }

    pub(crate) fn finish(&mut self, phase: TaskPhase, outcome: Outcome) {
        self.set_phase(phase);
        self.outcome = Some(outcome);
        self.dirty = true;
    }
}

/// Trims surrounding whitespace; an id that is empty afterwards is rejected.
pub fn normalize_task_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
