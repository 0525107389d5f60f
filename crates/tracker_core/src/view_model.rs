use crate::{FeedItem, FetchFailure, JobSnapshot, PhaseRow, TrackedJob};

/// What a renderer sees of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerView {
    pub job: Option<TrackedJob>,
    pub snapshot: Option<JobSnapshot>,
    pub is_loading: bool,
    pub error: Option<FetchFailure>,
    pub feed: Vec<FeedItem>,
    pub phases: Vec<PhaseRow>,
}

impl TrackerView {
    /// True once the tracked job reached `completed` or `failed`.
    pub fn is_finished(&self) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.status.is_terminal())
    }
}
