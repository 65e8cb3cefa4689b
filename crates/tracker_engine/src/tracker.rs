use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker_core::{
    update, Effect, Msg, PollSettings, PollTicket, StatusMarkers, TaskKind, TrackerState,
};
use tracker_logging::{tracker_debug, tracker_error, tracker_info, tracker_warn};

use crate::client::{ClientSettings, ReqwestStatusClient, StatusClient};
use crate::lookup::to_lookup;
use crate::{BatchStatusResponse, ClientError, TaskStatusResponse, TrackerEvent};

#[derive(Debug, Clone, Default)]
pub struct TrackerSettings {
    pub client: ClientSettings,
    pub poll: PollSettings,
    pub markers: StatusMarkers,
}

enum Command {
    Dispatch(Msg),
    Shutdown,
}

/// Owns one tracker instance running on a dedicated thread.
///
/// Dropping the handle shuts the tracker down and releases any pending timer.
pub struct TrackerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    event_rx: mpsc::UnboundedReceiver<TrackerEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl TrackerHandle {
    pub fn new(settings: TrackerSettings) -> Result<Self, ClientError> {
        let client = ReqwestStatusClient::new(settings.client)?;
        Ok(Self::with_client(
            Arc::new(client),
            settings.poll,
            settings.markers,
        ))
    }

    pub fn with_client(
        client: Arc<dyn StatusClient>,
        poll: PollSettings,
        markers: StatusMarkers,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let driver = Driver {
            state: TrackerState::with_config(poll, markers),
            client,
            cmd_tx: cmd_tx.clone(),
            event_tx,
            pending_tick: None,
        };

        let worker = thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracker_error!("Failed to start tracker runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(driver.run(cmd_rx));
        });

        Self {
            cmd_tx,
            event_rx,
            worker: Some(worker),
        }
    }

    pub fn start_tracking(&self, id: impl Into<String>, kind: Option<TaskKind>) {
        self.dispatch(Msg::StartTracking {
            id: id.into(),
            kind,
        });
    }

    pub fn stop_tracking(&self) {
        self.dispatch(Msg::StopTracking);
    }

    fn dispatch(&self, msg: Msg) {
        let _ = self.cmd_tx.send(Command::Dispatch(msg));
    }

    pub fn try_recv(&mut self) -> Option<TrackerEvent> {
        self.event_rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<TrackerEvent> {
        self.event_rx.recv().await
    }

    /// Blocks the calling thread. Must not be called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<TrackerEvent> {
        self.event_rx.blocking_recv()
    }

    pub fn shutdown(mut self) {
        self.shutdown_worker();
    }

    fn shutdown_worker(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracker_error!("Tracker worker panicked");
            }
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.shutdown_worker();
    }
}

struct Driver {
    state: TrackerState,
    client: Arc<dyn StatusClient>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    event_tx: mpsc::UnboundedSender<TrackerEvent>,
    pending_tick: Option<CancellationToken>,
}

impl Driver {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = cmd_rx.recv().await {
            match command {
                Command::Dispatch(msg) => self.dispatch(msg),
                Command::Shutdown => break,
            }
        }
        self.cancel_tick();
        tracker_debug!("Tracker stopped");
        let _ = self.event_tx.send(TrackerEvent::Stopped);
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            if let Some(outcome) = &view.outcome {
                if let Some(tracked) = &view.tracked {
                    tracker_info!("Task {} finished: {:?}", tracked.id, outcome);
                }
            }
            let _ = self.event_tx.send(TrackerEvent::ViewChanged(view));
        }
        self.state = state;

        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::QueryBatch { ticket } => {
                let client = self.client.clone();
                let cmd_tx = self.cmd_tx.clone();
                tokio::spawn(async move {
                    let result: Result<BatchStatusResponse, ClientError> =
                        client.batch_status(&ticket.id).await;
                    log_lookup("batch", &ticket, result.as_ref().err());
                    let msg = Msg::BatchLookedUp {
                        result: to_lookup(result, BatchStatusResponse::into_snapshot),
                        ticket,
                    };
                    let _ = cmd_tx.send(Command::Dispatch(msg));
                });
            }
            Effect::QueryTask { ticket } => {
                let client = self.client.clone();
                let cmd_tx = self.cmd_tx.clone();
                tokio::spawn(async move {
                    let result: Result<TaskStatusResponse, ClientError> =
                        client.task_status(&ticket.id).await;
                    log_lookup("task", &ticket, result.as_ref().err());
                    let msg = Msg::TaskLookedUp {
                        result: to_lookup(result, TaskStatusResponse::into_snapshot),
                        ticket,
                    };
                    let _ = cmd_tx.send(Command::Dispatch(msg));
                });
            }
            Effect::ScheduleTick { ticket, delay } => {
                self.cancel_tick();
                let token = CancellationToken::new();
                let cancelled = token.clone();
                let cmd_tx = self.cmd_tx.clone();
                tracker_debug!(
                    "Next poll for {} (generation {}) in {:?}",
                    ticket.id,
                    ticket.generation,
                    delay
                );
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancelled.cancelled() => {}
                        _ = tokio::time::sleep(delay) => {
                            let _ = cmd_tx.send(Command::Dispatch(Msg::TickFired { ticket }));
                        }
                    }
                });
                self.pending_tick = Some(token);
            }
            Effect::CancelTick => self.cancel_tick(),
        }
    }

    fn cancel_tick(&mut self) {
        if let Some(token) = self.pending_tick.take() {
            token.cancel();
        }
    }
}

fn log_lookup(endpoint: &str, ticket: &PollTicket, error: Option<&ClientError>) {
    match error {
        None => tracker_debug!("{} lookup for {} succeeded", endpoint, ticket.id),
        Some(err) if err.is_not_found_signal() => {
            tracker_debug!("{} lookup for {} answered {}", endpoint, ticket.id, err)
        }
        Some(err) => tracker_warn!(
            "{} lookup for {} failed, will retry: {}",
            endpoint,
            ticket.id,
            err
        ),
    }
}
