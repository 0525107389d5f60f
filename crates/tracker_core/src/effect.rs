use crate::JobId;

/// Work the runner must perform on behalf of the reducer.
///
/// Results flow back as [`crate::Msg`] values tagged with the `epoch` or
/// `generation` they were issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSnapshot { epoch: u64, job_id: JobId },
    Subscribe { epoch: u64, job_id: JobId },
    Unsubscribe,
    /// Replace any running timer with a new one for `generation`.
    StartTicker { generation: u64 },
    StopTicker,
}
