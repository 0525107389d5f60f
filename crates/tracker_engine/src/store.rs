use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracker_core::{JobId, JobSnapshot};

use crate::StoreError;

/// The external store holding one row per ingestion job.
///
/// The tracker only reads from it: one point read per session plus a change
/// subscription scoped to the tracked job.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn fetch(&self, job_id: &str) -> Result<JobSnapshot, StoreError>;

    async fn subscribe(&self, job_id: &str) -> Result<Subscription, StoreError>;
}

/// A live change feed for one job. Cancelled on `cancel()` or drop.
#[derive(Debug)]
pub struct Subscription {
    job_id: JobId,
    rx: mpsc::Receiver<JobSnapshot>,
    cancel: CancellationToken,
}

impl Subscription {
    /// Pairs a receiver with the token its producer watches.
    pub fn new(
        job_id: impl Into<JobId>,
        rx: mpsc::Receiver<JobSnapshot>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            rx,
            cancel,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Next replacement row, or `None` once cancelled or the producer ended.
    pub async fn next(&mut self) -> Option<JobSnapshot> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            snapshot = self.rx.recv() => snapshot,
        }
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
