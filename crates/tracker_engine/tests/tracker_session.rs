use std::sync::{Arc, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use tracker_core::{
    FetchFailure, Highlight, JobKind, JobSnapshot, JobStatus, JobSummary, PhaseCatalog,
    TrackedJob, TrackerView,
};
use tracker_engine::{
    JobTracker, MemorySnapshotStore, SnapshotStore, StoreError, Subscription, TrackerError,
    TrackerSettings,
};

const TICK: Duration = Duration::from_millis(4000);

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tracker_logging::initialize_for_tests);
}

fn catalog() -> Arc<PhaseCatalog> {
    Arc::new(
        PhaseCatalog::new()
            .with_phases(JobKind::Resume, ["parsing", "extracting", "classifying"])
            .with_ticker_messages("extracting", ["Reading roles", "Spotting skills"])
            .with_ticker_messages(
                "classifying",
                ["Sorting evidence", "Matching claims", "Weighing sources"],
            ),
    )
}

fn job(id: &str) -> TrackedJob {
    TrackedJob::new(id, JobKind::Resume)
}

fn tracker(store: Arc<dyn SnapshotStore>) -> JobTracker {
    JobTracker::new(store, catalog(), TrackerSettings::default()).expect("inside runtime")
}

/// Lets spawned tasks run without reaching the next ticker deadline.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Sleeps past the next `n` ticker deadlines.
async fn ticks(n: u32) {
    tokio::time::sleep(TICK * n + Duration::from_millis(1)).await;
}

async fn wait_for(tracker: &JobTracker, pred: impl FnMut(&TrackerView) -> bool) -> TrackerView {
    let mut views = tracker.watch();
    let view = tokio::time::timeout(Duration::from_secs(1), views.wait_for(pred))
        .await
        .expect("view did not reach expected state")
        .expect("tracker alive");
    view.clone()
}

async fn wait_subscribed(store: &MemorySnapshotStore, count: usize) {
    for _ in 0..100 {
        if store.subscriber_count() == count {
            return;
        }
        settle().await;
    }
    panic!("expected {count} subscribers, got {}", store.subscriber_count());
}

fn feed_texts(view: &TrackerView) -> Vec<String> {
    view.feed.iter().map(|item| item.text().to_string()).collect()
}

fn phase_of(view: &TrackerView) -> Option<String> {
    view.snapshot.as_ref().and_then(|s| s.phase.clone())
}

struct FailingStore;

#[async_trait::async_trait]
impl SnapshotStore for FailingStore {
    async fn fetch(&self, _job_id: &str) -> Result<JobSnapshot, StoreError> {
        Err(StoreError::Network("connection refused".to_string()))
    }

    async fn subscribe(&self, job_id: &str) -> Result<Subscription, StoreError> {
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(Subscription::new(job_id, rx, CancellationToken::new()))
    }
}

#[tokio::test(start_paused = true)]
async fn no_job_exposes_empty_view() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    let tracker = tracker(store.clone());

    tracker.select(None);
    settle().await;

    assert_eq!(tracker.view(), TrackerView::default());
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn processing_job_shows_ticker_message_right_after_fetch() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    assert!(tracker.view().is_loading);

    let view = wait_for(&tracker, |v| !v.is_loading).await;
    assert_eq!(view.error, None);
    assert_eq!(feed_texts(&view), vec!["Reading roles"]);

    ticks(1).await;
    assert_eq!(
        feed_texts(&tracker.view()),
        vec!["Spotting skills", "Reading roles"]
    );
}

#[tokio::test(start_paused = true)]
async fn phase_change_restarts_ticker_with_one_timer() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    wait_for(&tracker, |v| !v.is_loading).await;
    wait_subscribed(&store, 1).await;

    store.publish(JobSnapshot::processing("job-1", "classifying"));
    let view = wait_for(&tracker, |v| phase_of(v).as_deref() == Some("classifying")).await;
    assert_eq!(feed_texts(&view), vec!["Sorting evidence"]);

    ticks(3).await;
    assert_eq!(
        feed_texts(&tracker.view()),
        vec![
            "Sorting evidence",
            "Weighing sources",
            "Matching claims",
            "Sorting evidence"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn completion_stops_ticker_permanently() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    wait_for(&tracker, |v| !v.is_loading).await;
    wait_subscribed(&store, 1).await;

    let mut done = JobSnapshot::new("job-1", JobStatus::Completed);
    done.highlights.push(Highlight::new("Found 5 evidence items"));
    done.summary = Some(JobSummary {
        evidence_count: 5,
        ..JobSummary::default()
    });
    store.publish(done);

    let finished = wait_for(&tracker, TrackerView::is_finished).await;
    assert_eq!(
        feed_texts(&finished),
        vec!["Found 5 evidence items", "Reading roles"]
    );

    ticks(5).await;
    assert_eq!(tracker.view(), finished);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_sets_error_and_no_ticker() {
    init_logging();
    let tracker = tracker(Arc::new(FailingStore));

    tracker.select(Some(job("job-1")));
    let view = wait_for(&tracker, |v| !v.is_loading).await;

    assert_eq!(view.snapshot, None);
    assert_eq!(
        view.error,
        Some(FetchFailure::Store(
            "network error: connection refused".to_string()
        ))
    );
    ticks(2).await;
    assert!(tracker.view().feed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_job_reports_not_found() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    let tracker = tracker(store);

    tracker.select(Some(job("ghost")));
    let view = wait_for(&tracker, |v| !v.is_loading).await;
    assert_eq!(view.error, Some(FetchFailure::NotFound));
}

#[tokio::test(start_paused = true)]
async fn malformed_and_foreign_notifications_are_dropped() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    wait_for(&tracker, |v| !v.is_loading).await;
    wait_subscribed(&store, 1).await;

    store.publish_raw("job-1", "{not json");
    store.publish_raw(
        "job-1",
        r#"{"id": "job-2", "status": "failed", "error": "wrong job"}"#,
    );
    store.publish_raw(
        "job-1",
        r#"{"new": {"id": "job-1", "status": "processing", "phase": "classifying"}}"#,
    );

    let view = wait_for(&tracker, |v| phase_of(v).as_deref() == Some("classifying")).await;
    assert_eq!(view.error, None);
    assert_eq!(
        view.snapshot.map(|s| s.status),
        Some(JobStatus::Processing)
    );
}

#[tokio::test(start_paused = true)]
async fn dispose_twice_releases_everything_once() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    wait_for(&tracker, |v| !v.is_loading).await;
    wait_subscribed(&store, 1).await;

    tracker.dispose();
    tracker.dispose();
    wait_subscribed(&store, 0).await;
    let disposed = tracker.view();
    assert_eq!(disposed, TrackerView::default());

    store.publish(JobSnapshot::processing("job-1", "classifying"));
    ticks(3).await;
    assert_eq!(tracker.view(), disposed);
}

#[tokio::test(start_paused = true)]
async fn switching_jobs_moves_the_subscription() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    store.insert(JobSnapshot::new("job-2", JobStatus::Pending));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    wait_for(&tracker, |v| !v.is_loading).await;
    tracker.select(Some(job("job-2")));
    let view = wait_for(&tracker, |v| !v.is_loading).await;
    assert_eq!(view.job, Some(job("job-2")));
    assert!(view.feed.is_empty());
    wait_subscribed(&store, 1).await;

    store.publish(JobSnapshot::processing("job-1", "classifying"));
    ticks(2).await;
    let view = tracker.view();
    assert_eq!(
        view.snapshot.map(|s| s.status),
        Some(JobStatus::Pending)
    );
    assert!(view.feed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn dropping_tracker_releases_subscription() {
    init_logging();
    let store = Arc::new(MemorySnapshotStore::new());
    store.insert(JobSnapshot::processing("job-1", "extracting"));
    let tracker = tracker(store.clone());

    tracker.select(Some(job("job-1")));
    wait_subscribed(&store, 1).await;

    drop(tracker);
    wait_subscribed(&store, 0).await;
}

#[test]
fn tracker_requires_a_runtime() {
    let store = Arc::new(MemorySnapshotStore::new());
    let result = JobTracker::new(store, catalog(), TrackerSettings::default());
    assert!(matches!(result, Err(TrackerError::NoRuntime)));
}
