use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracker_core::{normalize_task_id, Notice, Outcome, TaskKind, TrackerViewModel};
use tracker_engine::{
    query_once, QueryOutcome, ReqwestStatusClient, StatusClient, TrackerEvent, TrackerHandle,
};
use tracker_logging::{parse_level, tracker_info, tracker_warn};
use url::Url;

use crate::config::TrackerConfig;
use crate::{logging, render};

/// Follow video-processing tasks until they finish.
#[derive(Debug, Parser)]
#[command(name = "tracker", version, about)]
pub struct Cli {
    /// Config file (defaults to ./tracker.ron when present).
    #[arg(long, global = true, env = "TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the task API; overrides the config file.
    #[arg(long, global = true, env = "TRACKER_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll a task or batch until it completes, fails, or is not found.
    ///
    /// From a terminal, typing another id switches to it and "stop" stops tracking.
    Watch {
        id: String,
        /// Skip kind resolution when the id is known to be a batch or a single task.
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Look an id up once and print its current state.
    Query { id: String },
    /// Show whether the server is busy and how long its queue is.
    Status,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Batch,
    Single,
}

impl From<KindArg> for TaskKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Batch => TaskKind::Batch,
            KindArg::Single => TaskKind::Single,
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = TrackerConfig::locate(cli.config.as_deref());
    let mut config = TrackerConfig::load(config_path.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    logging::initialize(config.log_destination, parse_level(&config.log_level));
    match &config_path {
        Some(path) => tracker_info!("Loaded config from {:?}", path),
        None => tracker_info!("No config file, using defaults"),
    }

    let base = Url::parse(&config.base_url)
        .with_context(|| format!("invalid base url {:?}", config.base_url))?;

    match cli.command {
        Command::Watch { id, kind } => watch(&config, &base, id, kind.map(TaskKind::from)),
        Command::Query { id } => query(&config, &base, &id),
        Command::Status => status(&config),
    }
}

/// A line typed while watching.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WatchInput {
    /// Replace the tracked id.
    Track(String),
    Stop,
}

fn parse_watch_input(line: &str) -> Option<WatchInput> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else if line.eq_ignore_ascii_case("stop") {
        Some(WatchInput::Stop)
    } else {
        Some(WatchInput::Track(line.to_string()))
    }
}

/// Forwards stdin lines until EOF; the channel closes when the reader ends.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn is_active(view: &TrackerViewModel) -> bool {
    view.tracked
        .as_ref()
        .is_some_and(|tracked| !tracked.phase.is_terminal())
}

fn watch(
    config: &TrackerConfig,
    base: &Url,
    id: String,
    kind: Option<TaskKind>,
) -> anyhow::Result<ExitCode> {
    let mut handle =
        TrackerHandle::new(config.tracker_settings()).context("failed to start tracker")?;
    let runtime = build_runtime()?;
    // Piped or redirected stdin keeps the single-id behaviour.
    let input = io::stdin().is_terminal().then(|| {
        println!("Type another task id to switch, or \"stop\" to stop tracking.");
        spawn_input_reader()
    });

    tracker_info!("Watching {} via {}", id.trim(), base);
    handle.start_tracking(id, kind);
    let code = runtime.block_on(watch_loop(&mut handle, input, base));
    handle.shutdown();
    Ok(code)
}

async fn watch_loop(
    handle: &mut TrackerHandle,
    mut input: Option<mpsc::UnboundedReceiver<String>>,
    base: &Url,
) -> ExitCode {
    let mut code = ExitCode::FAILURE;
    let mut active = true;

    loop {
        tokio::select! {
            event = handle.recv() => match event {
                Some(TrackerEvent::ViewChanged(view)) => {
                    print_view(&view, base);
                    if let Some(outcome) = &view.outcome {
                        code = exit_code(outcome);
                    }
                    active = is_active(&view);
                    if !active && input.is_none() {
                        return code;
                    }
                }
                Some(TrackerEvent::Stopped) | None => {
                    tracker_warn!("Tracker stopped before the task finished");
                    return ExitCode::FAILURE;
                }
            },
            line = recv_input(&mut input), if input.is_some() => match line {
                Some(line) => match parse_watch_input(&line) {
                    Some(WatchInput::Track(id)) => {
                        tracker_info!("Switching to {}", id);
                        code = ExitCode::FAILURE;
                        active = true;
                        handle.start_tracking(id, None);
                    }
                    Some(WatchInput::Stop) => handle.stop_tracking(),
                    None => {}
                },
                None => {
                    input = None;
                    if !active {
                        return code;
                    }
                    handle.stop_tracking();
                }
            },
        }
    }
}

async fn recv_input(input: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match input {
        Some(rx) => rx.recv().await,
        None => None,
    }
}

fn query(config: &TrackerConfig, base: &Url, raw_id: &str) -> anyhow::Result<ExitCode> {
    let Some(id) = normalize_task_id(raw_id) else {
        println!("{}", Notice::EmptyId.text());
        return Ok(ExitCode::FAILURE);
    };
    let client = ReqwestStatusClient::new(config.client_settings())?;
    let markers = config.status_markers();
    let runtime = build_runtime()?;

    let outcome = runtime.block_on(async {
        tokio::time::timeout(config.query_timeout(), query_once(&client, &id, &markers)).await
    });
    let Ok(outcome) = outcome else {
        println!("{id}: Query failed (timed out)");
        return Ok(ExitCode::FAILURE);
    };

    for line in render::render_query(&id, &outcome, base) {
        println!("{line}");
    }
    let success = match &outcome {
        QueryOutcome::Found { classification, .. } => {
            !matches!(classification, tracker_core::Classification::Failed { .. })
        }
        QueryOutcome::NotFound | QueryOutcome::Failed(_) => false,
    };
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn status(config: &TrackerConfig) -> anyhow::Result<ExitCode> {
    let client = ReqwestStatusClient::new(config.client_settings())?;
    let runtime = build_runtime()?;
    let status = runtime
        .block_on(async {
            tokio::time::timeout(config.query_timeout(), client.system_status()).await
        })
        .context("status query timed out")?
        .context("status query failed")?;
    println!("{}", render::render_system_status(&status));
    Ok(ExitCode::SUCCESS)
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")
}

fn print_view(view: &TrackerViewModel, base: &Url) {
    let stamp = Local::now().format("%H:%M:%S");
    for line in render::render_view(view, base) {
        println!("[{stamp}] {line}");
    }
}

fn exit_code(outcome: &Outcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
