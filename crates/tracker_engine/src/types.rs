use std::time::Duration;

use thiserror::Error;
use tracker_core::FetchFailure;

use crate::DecodeError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("job not found")]
    NotFound,
    #[error("invalid store url: {0}")]
    InvalidUrl(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("store closed")]
    Closed,
}

impl From<StoreError> for FetchFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => FetchFailure::NotFound,
            other => FetchFailure::Store(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("job tracker must be created inside a tokio runtime")]
    NoRuntime,
}

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Delay between synthetic ticker messages after the immediate first one.
    pub ticker_interval: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            ticker_interval: Duration::from_millis(4000),
        }
    }
}
