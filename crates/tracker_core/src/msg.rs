use crate::{FetchFailure, JobSnapshot, TrackedJob};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Caller picked a job to track, or `None` to stop tracking.
    JobSelected(Option<TrackedJob>),
    /// The initial point read finished.
    SnapshotFetched {
        epoch: u64,
        result: Result<JobSnapshot, FetchFailure>,
    },
    /// The subscription delivered a full replacement row.
    SnapshotChanged { epoch: u64, snapshot: JobSnapshot },
    /// The ticker timer fired.
    TickerFired { generation: u64 },
    /// The owner is going away; release everything.
    Disposed,
}
