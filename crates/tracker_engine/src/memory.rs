use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracker_core::{JobId, JobSnapshot};
use tracker_logging::{tracker_debug, tracker_error, tracker_warn};

use crate::decode::decode_notification;
use crate::{SnapshotStore, StoreError, Subscription};

#[derive(Debug, Clone)]
enum Payload {
    Row(JobSnapshot),
    Raw(String),
}

#[derive(Debug, Clone)]
struct Notification {
    job_id: JobId,
    payload: Payload,
}

/// In-process job store. Rows are held in a map; every `publish` fans out to
/// the subscriptions of that job.
#[derive(Debug)]
pub struct MemorySnapshotStore {
    rows: Mutex<HashMap<JobId, JobSnapshot>>,
    updates: broadcast::Sender<Notification>,
    channel_capacity: usize,
}

impl Default for MemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        let channel_capacity = channel_capacity.max(1);
        let (updates, _) = broadcast::channel(channel_capacity);
        Self {
            rows: Mutex::new(HashMap::new()),
            updates,
            channel_capacity,
        }
    }

    /// Stores a row without notifying anyone.
    pub fn insert(&self, snapshot: JobSnapshot) {
        match self.rows.lock() {
            Ok(mut rows) => {
                rows.insert(snapshot.id.clone(), snapshot);
            }
            Err(_) => tracker_error!("Memory store rows poisoned; dropping insert"),
        }
    }

    /// Stores a row and notifies its subscribers.
    pub fn publish(&self, snapshot: JobSnapshot) {
        self.insert(snapshot.clone());
        let _ = self.updates.send(Notification {
            job_id: snapshot.id.clone(),
            payload: Payload::Row(snapshot),
        });
    }

    /// Sends an undecoded JSON payload on `job_id`'s channel, as a remote
    /// change feed would. The stored row is left untouched.
    pub fn publish_raw(&self, job_id: impl Into<JobId>, json: impl Into<String>) {
        let _ = self.updates.send(Notification {
            job_id: job_id.into(),
            payload: Payload::Raw(json.into()),
        });
    }

    pub fn remove(&self, job_id: &str) -> Option<JobSnapshot> {
        self.rows.lock().ok().and_then(|mut rows| rows.remove(job_id))
    }

    /// Number of live subscriptions across all jobs.
    pub fn subscriber_count(&self) -> usize {
        self.updates.receiver_count()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn fetch(&self, job_id: &str) -> Result<JobSnapshot, StoreError> {
        let rows = self.rows.lock().map_err(|_| StoreError::Closed)?;
        rows.get(job_id).cloned().ok_or(StoreError::NotFound)
    }

    async fn subscribe(&self, job_id: &str) -> Result<Subscription, StoreError> {
        let updates = self.updates.subscribe();
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let cancel = CancellationToken::new();
        tokio::spawn(forward(job_id.to_string(), updates, tx, cancel.clone()));
        Ok(Subscription::new(job_id, rx, cancel))
    }
}

async fn forward(
    job_id: JobId,
    mut updates: broadcast::Receiver<Notification>,
    tx: mpsc::Sender<JobSnapshot>,
    cancel: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => return,
            received = updates.recv() => received,
        };
        let notification = match received {
            Ok(notification) => notification,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracker_warn!("Subscription for job {} skipped {} notifications", job_id, missed);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return,
        };
        if notification.job_id != job_id {
            continue;
        }
        let snapshot = match notification.payload {
            Payload::Row(snapshot) => snapshot,
            Payload::Raw(json) => match decode_notification(json.as_bytes()) {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    tracker_warn!("Dropping notification for job {}: {}", job_id, err);
                    continue;
                }
            },
        };
        tracker_debug!("Job {} changed: status={}", job_id, snapshot.status);
        if tx.send(snapshot).await.is_err() {
            return;
        }
    }
}
