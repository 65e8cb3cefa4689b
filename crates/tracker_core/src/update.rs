use crate::{
    classify_batch, classify_task, normalize_task_id, Classification, Effect, LookupResult, Msg,
    Notice, Outcome, PollTicket, Recheck, TaskKind, TaskPhase, TrackerState,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Every message carrying a ticket is dropped unless the ticket still names
/// the live poll loop, so superseded loops end on their next tick or response.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartTracking { id, kind } => {
            let Some(id) = normalize_task_id(&id) else {
                state.set_notice(Notice::EmptyId);
                return (state, Vec::new());
            };
            let had_loop = state.active_ticket().is_some();
            let ticket = state.begin_tracking(id, kind);
            let mut effects = Vec::with_capacity(1 + usize::from(had_loop));
            if had_loop {
                effects.push(Effect::CancelTick);
            }
            effects.push(query_for(kind, ticket));
            effects
        }
        Msg::StopTracking => {
            if state.active_ticket().is_some() {
                state.stop_tracking();
                vec![Effect::CancelTick]
            } else {
                Vec::new()
            }
        }
        Msg::TickFired { ticket } => {
            if !state.is_current(&ticket) {
                return (state, Vec::new());
            }
            vec![query_for(state.tracked_kind(), ticket)]
        }
        Msg::BatchLookedUp { ticket, result } => {
            if !state.is_current(&ticket) {
                return (state, Vec::new());
            }
            match result {
                LookupResult::Found(snapshot) => {
                    state.resolve_kind(TaskKind::Batch);
                    let classification = classify_batch(&ticket.id, &snapshot, state.markers());
                    apply_classification(&mut state, ticket, classification)
                }
                // Not a batch id: fall through to the single-task endpoint.
                LookupResult::Missing { .. } if state.tracked_kind().is_none() => {
                    vec![Effect::QueryTask { ticket }]
                }
                LookupResult::Missing { .. } | LookupResult::Unreachable { .. } => {
                    let delay = state.settings().batch_retry_delay;
                    vec![Effect::ScheduleTick { ticket, delay }]
                }
            }
        }
        Msg::TaskLookedUp { ticket, result } => {
            if !state.is_current(&ticket) {
                return (state, Vec::new());
            }
            match result {
                LookupResult::Found(snapshot) => {
                    state.resolve_kind(TaskKind::Single);
                    let classification = classify_task(&snapshot, state.markers());
                    apply_classification(&mut state, ticket, classification)
                }
                // Neither a batch nor a task: definitive, never retried.
                LookupResult::Missing { .. } if state.tracked_kind().is_none() => {
                    state.finish(TaskPhase::NotFound, Outcome::NotFound);
                    Vec::new()
                }
                LookupResult::Missing { .. } | LookupResult::Unreachable { .. } => {
                    let delay = state.settings().single_retry_delay;
                    vec![Effect::ScheduleTick { ticket, delay }]
                }
            }
        }
    };

    (state, effects)
}

/// Unresolved ids are looked up as a batch first.
fn query_for(kind: Option<TaskKind>, ticket: PollTicket) -> Effect {
    match kind {
        Some(TaskKind::Single) => Effect::QueryTask { ticket },
        Some(TaskKind::Batch) | None => Effect::QueryBatch { ticket },
    }
}

fn apply_classification(
    state: &mut TrackerState,
    ticket: PollTicket,
    classification: Classification,
) -> Vec<Effect> {
    match classification {
        Classification::Processing { text, recheck } => {
            state.set_phase(TaskPhase::Processing);
            state.set_status_text(text);
            let delay = match recheck {
                Recheck::Interval => state.settings().poll_interval,
                Recheck::Soon => state.settings().unrecognized_status_delay,
            };
            vec![Effect::ScheduleTick { ticket, delay }]
        }
        Classification::Completed { progress, link } => {
            if let Some(text) = progress {
                state.set_status_text(text);
            }
            state.finish(TaskPhase::Completed, Outcome::Completed { link });
            Vec::new()
        }
        Classification::Failed { message } => {
            state.finish(TaskPhase::Failed, Outcome::Failed { message });
            Vec::new()
        }
    }
}
