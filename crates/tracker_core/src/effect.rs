use std::time::Duration;

use crate::PollTicket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    QueryBatch { ticket: PollTicket },
    QueryTask { ticket: PollTicket },
    /// Replaces any pending tick.
    ScheduleTick { ticket: PollTicket, delay: Duration },
    CancelTick,
}
