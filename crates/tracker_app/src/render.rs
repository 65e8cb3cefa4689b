use tracker_core::{
    Classification, DownloadLink, Outcome, TaskKind, TrackerViewModel, NOT_FOUND_TEXT,
};
use tracker_engine::{QueryOutcome, SystemStatus};
use url::Url;

/// Renders a tracker view into terminal lines.
pub fn render_view(view: &TrackerViewModel, base: &Url) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(notice) = &view.notice {
        lines.push(notice.text());
    }
    let Some(tracked) = &view.tracked else {
        return lines;
    };

    let id = &tracked.id;
    match &view.outcome {
        None => {
            let status = view.status_text.as_deref().unwrap_or("Querying...");
            lines.push(format!("{} {id}: {status}", kind_tag(tracked.kind)));
        }
        Some(outcome) => {
            if let Some(status) = &view.status_text {
                lines.push(format!("{} {id}: {status}", kind_tag(tracked.kind)));
            }
            lines.push(outcome_line(id, outcome, base));
        }
    }
    lines
}

/// Renders the result of a one-shot `query`.
pub fn render_query(id: &str, outcome: &QueryOutcome, base: &Url) -> Vec<String> {
    match outcome {
        QueryOutcome::Found {
            kind,
            classification,
        } => {
            let tag = kind_tag(Some(*kind));
            match classification {
                Classification::Processing { text, .. } => vec![format!("{tag} {id}: {text}")],
                Classification::Completed { progress, link } => {
                    let mut lines = Vec::new();
                    if let Some(progress) = progress {
                        lines.push(format!("{tag} {id}: {progress}"));
                    }
                    lines.push(outcome_line(id, &Outcome::Completed { link: link.clone() }, base));
                    lines
                }
                Classification::Failed { message } => vec![format!("{tag} {id}: {message}")],
            }
        }
        QueryOutcome::NotFound => vec![format!("{id}: {NOT_FOUND_TEXT}")],
        QueryOutcome::Failed(err) => vec![format!("{id}: Query failed ({err})")],
    }
}

pub fn render_system_status(status: &SystemStatus) -> String {
    let busy = if status.busy { "busy" } else { "idle" };
    format!("System: {busy} | queue: {}", status.queue_length)
}

fn kind_tag(kind: Option<TaskKind>) -> &'static str {
    match kind {
        Some(TaskKind::Batch) => "[batch]",
        Some(TaskKind::Single) => "[task]",
        None => "[?]",
    }
}

fn outcome_line(id: &str, outcome: &Outcome, base: &Url) -> String {
    match outcome {
        Outcome::Completed { link: Some(link) } => {
            format!("{id}: completed. {}: {}", link.label.text(), link_target(link, base))
        }
        Outcome::Completed { link: None } => format!("{id}: completed (no output file reported)"),
        Outcome::Failed { message } => format!("{id}: {message}"),
        Outcome::NotFound => format!("{id}: {NOT_FOUND_TEXT}"),
    }
}

fn link_target(link: &DownloadLink, base: &Url) -> String {
    link.resolve(base)
        .map(String::from)
        .unwrap_or_else(|_| link.href.clone())
}
