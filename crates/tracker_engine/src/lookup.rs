use tracker_core::{
    classify_batch, classify_task, Classification, LookupResult, StatusMarkers, TaskKind,
};
use tracker_logging::{tracker_debug, tracker_info};

use crate::{ClientError, StatusClient};

/// Maps a client result into what the state machine consumes.
pub(crate) fn to_lookup<W, S>(
    result: Result<W, ClientError>,
    into_snapshot: impl FnOnce(W) -> S,
) -> LookupResult<S> {
    match result {
        Ok(body) => LookupResult::Found(into_snapshot(body)),
        Err(ClientError::HttpStatus(status)) => LookupResult::Missing { status },
        Err(err) => LookupResult::Unreachable {
            reason: err.to_string(),
        },
    }
}

/// Result of a one-shot manual lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Found {
        kind: TaskKind,
        classification: Classification,
    },
    NotFound,
    Failed(ClientError),
}

/// Looks an id up once, batch first, without polling.
pub async fn query_once(
    client: &dyn StatusClient,
    id: &str,
    markers: &StatusMarkers,
) -> QueryOutcome {
    match client.batch_status(id).await {
        Ok(body) => {
            let snapshot = body.into_snapshot();
            return QueryOutcome::Found {
                kind: TaskKind::Batch,
                classification: classify_batch(id, &snapshot, markers),
            };
        }
        Err(err) if err.is_not_found_signal() => {
            tracker_debug!("{} is not a batch ({}), trying single task", id, err);
        }
        Err(err) => return QueryOutcome::Failed(err),
    }

    match client.task_status(id).await {
        Ok(body) => QueryOutcome::Found {
            kind: TaskKind::Single,
            classification: classify_task(&body.into_snapshot(), markers),
        },
        Err(err) if err.is_not_found_signal() => {
            tracker_info!("{} is neither a batch nor a task", id);
            QueryOutcome::NotFound
        }
        Err(err) => QueryOutcome::Failed(err),
    }
}
