use crate::classify::{BatchSnapshot, TaskSnapshot};
use crate::{PollTicket, TaskKind};

/// Result of one status lookup as seen by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult<T> {
    Found(T),
    /// The server answered with a non-success HTTP status.
    Missing { status: u16 },
    /// Transport failure, timeout, or an unreadable body.
    Unreachable { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted an id, either from task creation or manual entry.
    StartTracking {
        id: String,
        kind: Option<TaskKind>,
    },
    /// User abandoned the current task.
    StopTracking,
    /// A scheduled poll delay elapsed.
    TickFired { ticket: PollTicket },
    /// `GET /api/batch/{id}` finished.
    BatchLookedUp {
        ticket: PollTicket,
        result: LookupResult<BatchSnapshot>,
    },
    /// `GET /api/task/{id}` finished.
    TaskLookedUp {
        ticket: PollTicket,
        result: LookupResult<TaskSnapshot>,
    },
}
