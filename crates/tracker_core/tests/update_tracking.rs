use std::sync::Once;
use std::time::Duration;

use tracker_core::{
    update, BatchSnapshot, Effect, LookupResult, Msg, Notice, PollSettings, PollTicket,
    StatusMarkers, TaskKind, TaskPhase, TaskSnapshot, TrackerState,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn start(state: TrackerState, id: &str) -> (TrackerState, PollTicket) {
    let (state, effects) = update(
        state,
        Msg::StartTracking {
            id: id.to_string(),
            kind: None,
        },
    );
    let ticket = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::QueryBatch { ticket } => Some(ticket.clone()),
            _ => None,
        })
        .expect("batch query effect");
    (state, ticket)
}

fn processing_task(ticket: &PollTicket, percentage: f64) -> Msg {
    Msg::TaskLookedUp {
        ticket: ticket.clone(),
        result: LookupResult::Found(TaskSnapshot {
            status: "processing".to_string(),
            progress_percentage: Some(percentage),
            ..TaskSnapshot::default()
        }),
    }
}

fn batch_missing(ticket: &PollTicket) -> Msg {
    Msg::BatchLookedUp {
        ticket: ticket.clone(),
        result: LookupResult::Missing { status: 404 },
    }
}

#[test]
fn start_tracking_queries_batch_first() {
    init_logging();
    let (mut state, effects) = update(
        TrackerState::new(),
        Msg::StartTracking {
            id: "  T1 ".to_string(),
            kind: None,
        },
    );

    let ticket = PollTicket {
        id: "T1".to_string(),
        generation: 1,
    };
    assert_eq!(effects, vec![Effect::QueryBatch { ticket }]);
    let view = state.view();
    let tracked = view.tracked.expect("tracked task");
    assert_eq!(tracked.id, "T1");
    assert_eq!(tracked.phase, TaskPhase::Querying);
    assert_eq!(tracked.kind, None);
    assert!(state.consume_dirty());
}

#[test]
fn known_single_kind_skips_batch_lookup() {
    init_logging();
    let (_state, effects) = update(
        TrackerState::new(),
        Msg::StartTracking {
            id: "T9".to_string(),
            kind: Some(TaskKind::Single),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::QueryTask {
            ticket: PollTicket {
                id: "T9".to_string(),
                generation: 1
            }
        }]
    );
}

#[test]
fn empty_id_is_rejected_without_touching_current_loop() {
    init_logging();
    let (state, ticket) = start(TrackerState::new(), "T1");
    let (mut state, effects) = update(
        state,
        Msg::StartTracking {
            id: "   ".to_string(),
            kind: None,
        },
    );

    assert!(effects.is_empty());
    assert!(state.is_current(&ticket));
    assert_eq!(state.view().notice, Some(Notice::EmptyId));
    assert!(state.consume_dirty());
}

#[test]
fn batch_miss_falls_back_to_single_then_processing_reschedules() {
    init_logging();
    let (state, ticket) = start(TrackerState::new(), "T1");

    let (state, effects) = update(state, batch_missing(&ticket));
    assert_eq!(
        effects,
        vec![Effect::QueryTask {
            ticket: ticket.clone()
        }]
    );

    let (mut state, effects) = update(state, processing_task(&ticket, 40.0));
    assert_eq!(
        effects,
        vec![Effect::ScheduleTick {
            ticket: ticket.clone(),
            delay: Duration::from_millis(2000),
        }]
    );
    let view = state.view();
    assert_eq!(view.status_text.as_deref(), Some("40%"));
    assert_eq!(view.outcome, None);
    let tracked = view.tracked.expect("tracked task");
    assert_eq!(tracked.phase, TaskPhase::Processing);
    assert_eq!(tracked.kind, Some(TaskKind::Single));
    assert!(state.consume_dirty());

    // The resolved kind sticks: the next tick goes straight to the task endpoint.
    let (_state, effects) = update(
        state,
        Msg::TickFired {
            ticket: ticket.clone(),
        },
    );
    assert_eq!(effects, vec![Effect::QueryTask { ticket }]);
}

#[test]
fn missing_on_both_endpoints_is_terminal_not_found() {
    init_logging();
    let (state, ticket) = start(TrackerState::new(), "nope");
    let (state, _) = update(state, batch_missing(&ticket));
    let (mut state, effects) = update(
        state,
        Msg::TaskLookedUp {
            ticket: ticket.clone(),
            result: LookupResult::Missing { status: 404 },
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.view().outcome, Some(tracker_core::Outcome::NotFound));
    assert!(state.active_ticket().is_none());
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::TickFired { ticket });
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn taking_over_makes_old_ticks_and_responses_inert() {
    init_logging();
    let (state, ticket_a) = start(TrackerState::new(), "A");
    let (state, _) = update(state, batch_missing(&ticket_a));
    let (state, _) = update(state, processing_task(&ticket_a, 10.0));

    let (mut state, effects) = update(
        state,
        Msg::StartTracking {
            id: "B".to_string(),
            kind: None,
        },
    );
    let ticket_b = PollTicket {
        id: "B".to_string(),
        generation: 2,
    };
    assert_eq!(
        effects,
        vec![
            Effect::CancelTick,
            Effect::QueryBatch {
                ticket: ticket_b.clone()
            }
        ]
    );
    assert!(state.consume_dirty());
    let before = state.view();

    let (mut state, effects) = update(
        state,
        Msg::TickFired {
            ticket: ticket_a.clone(),
        },
    );
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    let (mut state, effects) = update(state, processing_task(&ticket_a, 90.0));
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view(), before);
    assert!(state.is_current(&ticket_b));
}

#[test]
fn restarting_the_same_id_supersedes_the_old_generation() {
    init_logging();
    let (state, first) = start(TrackerState::new(), "T1");
    let (state, second) = start(state, "T1");

    assert_ne!(first, second);
    let (mut state, effects) = update(state, Msg::TickFired { ticket: first });
    assert!(effects.is_empty());
    state.consume_dirty();
    assert!(state.is_current(&second));
}

#[test]
fn stop_tracking_cancels_and_is_idempotent() {
    init_logging();
    let (state, ticket) = start(TrackerState::new(), "T1");
    let (mut state, effects) = update(state, Msg::StopTracking);
    assert_eq!(effects, vec![Effect::CancelTick]);
    assert_eq!(
        state.view().notice,
        Some(Notice::Stopped {
            id: "T1".to_string()
        })
    );
    assert!(state.view().tracked.is_none());
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::StopTracking);
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    for _ in 0..3 {
        let (next, effects) = update(
            state,
            Msg::TickFired {
                ticket: ticket.clone(),
            },
        );
        assert!(effects.is_empty());
        state = next;
    }
    let (mut state, effects) = update(state, processing_task(&ticket, 50.0));
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
}

#[test]
fn stop_tracking_when_idle_does_nothing() {
    init_logging();
    let state = TrackerState::new();
    let (next, effects) = update(state.clone(), Msg::StopTracking);
    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn transport_failure_retries_without_rerendering() {
    init_logging();
    let (state, ticket) = start(TrackerState::new(), "B1");
    let (mut state, _) = update(
        state,
        Msg::BatchLookedUp {
            ticket: ticket.clone(),
            result: LookupResult::Found(BatchSnapshot {
                status: "处理中".to_string(),
                sub_tasks: [("s1".to_string(), "processing".to_string())]
                    .into_iter()
                    .collect(),
                progress_percentage: Some(0.0),
            }),
        },
    );
    assert!(state.consume_dirty());
    let before = state.view();

    let (mut state, effects) = update(
        state,
        Msg::BatchLookedUp {
            ticket: ticket.clone(),
            result: LookupResult::Unreachable {
                reason: "connection refused".to_string(),
            },
        },
    );
    assert_eq!(
        effects,
        vec![Effect::ScheduleTick {
            ticket: ticket.clone(),
            delay: Duration::from_millis(2000),
        }]
    );
    assert!(!state.consume_dirty());
    assert_eq!(state.view(), before);
    assert_eq!(before.status_text.as_deref(), Some("Progress: 0/1 (0%)"));
}

#[test]
fn resolved_single_task_retries_http_failures() {
    init_logging();
    let (state, _effects) = update(
        TrackerState::new(),
        Msg::StartTracking {
            id: "T2".to_string(),
            kind: Some(TaskKind::Single),
        },
    );
    let ticket = state.active_ticket().cloned().expect("active ticket");
    let (mut state, effects) = update(
        state,
        Msg::TaskLookedUp {
            ticket: ticket.clone(),
            result: LookupResult::Missing { status: 503 },
        },
    );
    assert_eq!(
        effects,
        vec![Effect::ScheduleTick {
            ticket,
            delay: Duration::from_millis(2000),
        }]
    );
    assert!(state.active_ticket().is_some());
    state.consume_dirty();
}

#[test]
fn known_batch_kind_retries_http_failures_on_batch_endpoint() {
    init_logging();
    let settings = PollSettings {
        batch_retry_delay: Duration::from_millis(3000),
        ..PollSettings::default()
    };
    let state = TrackerState::with_config(settings, StatusMarkers::default());
    let (state, effects) = update(
        state,
        Msg::StartTracking {
            id: "B5".to_string(),
            kind: Some(TaskKind::Batch),
        },
    );
    let ticket = PollTicket {
        id: "B5".to_string(),
        generation: 1,
    };
    assert_eq!(
        effects,
        vec![Effect::QueryBatch {
            ticket: ticket.clone()
        }]
    );

    // A resolved batch never falls through to the single-task endpoint.
    let (mut state, effects) = update(state, batch_missing(&ticket));
    assert_eq!(
        effects,
        vec![Effect::ScheduleTick {
            ticket: ticket.clone(),
            delay: Duration::from_millis(3000),
        }]
    );
    assert_eq!(state.active_ticket(), Some(&ticket));
    assert_eq!(state.view().outcome, None);
    state.consume_dirty();

    let (_state, effects) = update(
        state,
        Msg::TickFired {
            ticket: ticket.clone(),
        },
    );
    assert_eq!(effects, vec![Effect::QueryBatch { ticket }]);
}
