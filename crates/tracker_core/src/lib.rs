//! Tracker core: pure session state machine, phase progress, ticker and feed
//! merging for ingestion-job progress.
mod catalog;
mod effect;
mod feed;
mod msg;
mod phase;
mod snapshot;
mod state;
mod ticker;
mod update;
mod view_model;

pub use catalog::PhaseCatalog;
pub use effect::Effect;
pub use feed::{merge_feed, FeedItem, FEED_CAPACITY};
pub use msg::Msg;
pub use phase::{completed_phases, phase_rows, PhaseRow, PhaseState};
pub use snapshot::{
    Highlight, JobId, JobKind, JobSnapshot, JobStatus, JobSummary, PhaseId, Progress, TrackedJob,
};
pub use state::{FetchFailure, TrackerState};
pub use ticker::{TickerMessage, TickerState, TICKER_CAPACITY};
pub use update::update;
pub use view_model::TrackerView;
