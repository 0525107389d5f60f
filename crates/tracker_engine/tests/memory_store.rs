use std::time::Duration;

use pretty_assertions::assert_eq;
use tracker_core::{JobSnapshot, JobStatus};
use tracker_engine::{MemorySnapshotStore, SnapshotStore, StoreError};

#[tokio::test]
async fn fetch_returns_latest_row() {
    let store = MemorySnapshotStore::new();
    assert_eq!(store.fetch("job-1").await.unwrap_err(), StoreError::NotFound);

    store.insert(JobSnapshot::new("job-1", JobStatus::Pending));
    store.publish(JobSnapshot::processing("job-1", "parsing"));
    let snapshot = store.fetch("job-1").await.unwrap();
    assert_eq!(snapshot.phase.as_deref(), Some("parsing"));

    assert!(store.remove("job-1").is_some());
    assert_eq!(store.fetch("job-1").await.unwrap_err(), StoreError::NotFound);
}

#[tokio::test]
async fn subscription_only_sees_its_own_job() {
    let store = MemorySnapshotStore::new();
    let mut subscription = store.subscribe("job-1").await.unwrap();

    store.publish(JobSnapshot::processing("job-2", "parsing"));
    store.publish_raw("job-1", "garbage");
    store.publish(JobSnapshot::processing("job-1", "extracting"));

    let snapshot = tokio::time::timeout(Duration::from_secs(1), subscription.next())
        .await
        .expect("delivered")
        .expect("open");
    assert_eq!(snapshot.id, "job-1");
    assert_eq!(snapshot.phase.as_deref(), Some("extracting"));
}

#[tokio::test]
async fn dropping_subscription_unregisters_it() {
    let store = MemorySnapshotStore::new();
    let subscription = store.subscribe("job-1").await.unwrap();
    assert_eq!(store.subscriber_count(), 1);

    drop(subscription);
    for _ in 0..50 {
        if store.subscriber_count() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("subscription still registered");
}
