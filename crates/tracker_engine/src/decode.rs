use serde::Deserialize;
use tracker_core::{Highlight, JobSnapshot, JobStatus, JobSummary, Progress};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed job row: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Malformed(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WireStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireProgress {
    Count(u64),
    Number(f64),
    Label(String),
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    text: Option<String>,
    message: Option<String>,
    label: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireHighlight {
    Text(String),
    Event(WireEvent),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireSummary {
    evidence_count: u64,
    work_history_count: u64,
    claims_created: u64,
    claims_updated: u64,
}

#[derive(Debug, Deserialize)]
struct WireRow {
    id: String,
    status: WireStatus,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    progress: Option<WireProgress>,
    #[serde(default)]
    highlights: Option<Vec<WireHighlight>>,
    #[serde(default)]
    warning: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    summary: Option<WireSummary>,
}

/// Change feeds deliver either the bare row or an envelope holding the new row.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireNotification {
    Envelope { new: WireRow },
    Row(WireRow),
}

/// Decode a job row as returned by a point read.
pub fn decode_snapshot(bytes: &[u8]) -> Result<JobSnapshot, DecodeError> {
    let row: WireRow = serde_json::from_slice(bytes)?;
    Ok(row.into_snapshot())
}

/// Decode one change notification into the replacement row it carries.
pub fn decode_notification(bytes: &[u8]) -> Result<JobSnapshot, DecodeError> {
    let row = match serde_json::from_slice(bytes)? {
        WireNotification::Envelope { new } => new,
        WireNotification::Row(row) => row,
    };
    Ok(row.into_snapshot())
}

impl WireRow {
    fn into_snapshot(self) -> JobSnapshot {
        let status = match self.status {
            WireStatus::Pending => JobStatus::Pending,
            WireStatus::Processing => JobStatus::Processing,
            WireStatus::Completed => JobStatus::Completed,
            WireStatus::Failed => JobStatus::Failed,
        };
        JobSnapshot {
            id: self.id,
            status,
            phase: self.phase.filter(|p| !p.is_empty()),
            progress: self.progress.map(|progress| match progress {
                WireProgress::Count(n) => Progress::Count(n),
                WireProgress::Number(n) => Progress::Label(n.to_string()),
                WireProgress::Label(label) => Progress::Label(label),
            }),
            highlights: self
                .highlights
                .unwrap_or_default()
                .into_iter()
                .filter_map(WireHighlight::into_highlight)
                .collect(),
            warning: self.warning,
            error: self.error,
            summary: self.summary.map(|s| JobSummary {
                evidence_count: s.evidence_count,
                work_history_count: s.work_history_count,
                claims_created: s.claims_created,
                claims_updated: s.claims_updated,
            }),
        }
        .normalized()
    }
}

impl WireHighlight {
    fn into_highlight(self) -> Option<Highlight> {
        let text = match self {
            WireHighlight::Text(text) => text,
            WireHighlight::Event(event) => event.describe()?,
        };
        let text = text.trim();
        (!text.is_empty()).then(|| Highlight::new(text))
    }
}

impl WireEvent {
    fn describe(self) -> Option<String> {
        if let Some(text) = self.text.or(self.message).or(self.label) {
            return Some(text);
        }
        let kind = self.kind?.replace('_', " ");
        Some(match self.count {
            Some(count) => format!("{kind}: {count}"),
            None => kind,
        })
    }
}
