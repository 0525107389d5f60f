use std::fmt::Write;

use tracker_core::{FeedItem, JobStatus, PhaseState, TrackerView};

/// Renders one frame of the progress display.
///
/// `clock` is the wall-clock label printed in the header.
pub fn render(view: &TrackerView, clock: &str) -> String {
    let mut out = String::new();
    let Some(job) = &view.job else {
        return "No job selected.\n".to_string();
    };

    let _ = write!(out, "[{clock}] Job {}", job.id);
    match &view.snapshot {
        _ if view.is_loading => out.push_str(" (loading...)"),
        Some(snapshot) => {
            let _ = write!(out, " [{}]", snapshot.status);
            if let Some(progress) = &snapshot.progress {
                let _ = write!(out, " {progress}");
            }
        }
        None => {}
    }
    out.push('\n');

    if let Some(error) = &view.error {
        let _ = writeln!(out, "  Error: {error}");
        return out;
    }

    for row in &view.phases {
        let marker = match row.state {
            PhaseState::Done => "[x]",
            PhaseState::Current => "[>]",
            PhaseState::Pending => "[ ]",
        };
        let _ = writeln!(out, "  {marker} {}", row.label);
    }

    if let Some(snapshot) = &view.snapshot {
        if let Some(warning) = &snapshot.warning {
            let _ = writeln!(out, "  Warning: {warning}");
        }
        for item in &view.feed {
            let bullet = match item {
                FeedItem::Highlight { .. } => '*',
                FeedItem::Ticker { .. } => '~',
            };
            let _ = writeln!(out, "    {bullet} {}", item.text());
        }
        match snapshot.status {
            JobStatus::Completed => {
                let summary = snapshot.summary.unwrap_or_default();
                let _ = writeln!(out, "  Done: {}", summary.describe());
            }
            JobStatus::Failed => {
                let reason = snapshot.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(out, "  Failed: {reason}");
            }
            JobStatus::Pending | JobStatus::Processing => {}
        }
    }
    out
}
