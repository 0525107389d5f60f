use std::fmt;

pub type JobId = String;
pub type PhaseId = String;

/// Which ingestion pipeline produced a job. Each kind walks its own phase list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobKind {
    Resume,
    Story,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// `Completed` and `Failed` never change again once reached.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form progress marker written by the pipeline, e.g. a batch index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Count(u64),
    Label(String),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Count(n) => write!(f, "{n}"),
            Progress::Label(label) => f.write_str(label),
        }
    }
}

/// One server-confirmed event, e.g. "Found 5 evidence items".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub text: String,
}

impl Highlight {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Result counters, present only once a job has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobSummary {
    pub evidence_count: u64,
    pub work_history_count: u64,
    pub claims_created: u64,
    pub claims_updated: u64,
}

impl JobSummary {
    /// One-line human summary, skipping zero counters.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = [
            (self.evidence_count, "evidence item", "evidence items"),
            (self.work_history_count, "role", "roles"),
            (self.claims_created, "claim created", "claims created"),
            (self.claims_updated, "claim updated", "claims updated"),
        ]
        .into_iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, one, many)| {
            let noun = if count == 1 { one } else { many };
            format!("{count} {noun}")
        })
        .collect();

        if parts.is_empty() {
            "nothing new found".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Authoritative server-side state of one ingestion job.
///
/// The tracker only ever reads these; every notification carries a full
/// replacement row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub phase: Option<PhaseId>,
    pub progress: Option<Progress>,
    /// Oldest first, append-only.
    pub highlights: Vec<Highlight>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub summary: Option<JobSummary>,
}

impl JobSnapshot {
    pub fn new(id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status,
            phase: None,
            progress: None,
            highlights: Vec::new(),
            warning: None,
            error: None,
            summary: None,
        }
    }

    pub fn processing(id: impl Into<JobId>, phase: impl Into<PhaseId>) -> Self {
        Self {
            phase: Some(phase.into()),
            ..Self::new(id, JobStatus::Processing)
        }
    }

    /// Drops fields that are only meaningful in another status:
    /// `phase` outside processing, `summary` outside completed, `error`
    /// outside failed.
    pub fn normalized(mut self) -> Self {
        if self.status != JobStatus::Processing {
            self.phase = None;
        }
        if self.status != JobStatus::Completed {
            self.summary = None;
        }
        if self.status != JobStatus::Failed {
            self.error = None;
        }
        self
    }

    /// The phase the pipeline is working on right now, if any.
    pub fn active_phase(&self) -> Option<&str> {
        match self.status {
            JobStatus::Processing => self.phase.as_deref(),
            _ => None,
        }
    }
}

/// A job the caller asked to track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedJob {
    pub id: JobId,
    pub kind: JobKind,
}

impl TrackedJob {
    pub fn new(id: impl Into<JobId>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}
