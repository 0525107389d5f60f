use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracker_core::{
    update, Effect, JobId, Msg, PhaseCatalog, TrackedJob, TrackerState, TrackerView,
};
use tracker_logging::{tracker_debug, tracker_error, tracker_info, tracker_warn};

use crate::{SnapshotStore, TrackerError, TrackerSettings};

/// A tracking session for at most one ingestion job at a time.
///
/// Fetch results, change notifications and ticker ticks all funnel through one
/// lock into [`tracker_core::update`], so they never interleave. The latest
/// view is published on a watch channel after every visible change.
pub struct JobTracker {
    shared: Arc<Mutex<Inner>>,
    views: watch::Receiver<TrackerView>,
}

struct Inner {
    me: Weak<Mutex<Inner>>,
    state: TrackerState,
    store: Arc<dyn SnapshotStore>,
    settings: TrackerSettings,
    runtime: Handle,
    view_tx: watch::Sender<TrackerView>,
    fetch: Option<JoinHandle<()>>,
    subscription: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl JobTracker {
    /// Must be called from within a tokio runtime; tasks are spawned on it.
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        catalog: Arc<PhaseCatalog>,
        settings: TrackerSettings,
    ) -> Result<Self, TrackerError> {
        let runtime = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;
        let state = TrackerState::new(catalog);
        let (view_tx, views) = watch::channel(state.view());

        let shared = Arc::new_cyclic(|me| {
            Mutex::new(Inner {
                me: me.clone(),
                state,
                store,
                settings,
                runtime,
                view_tx,
                fetch: None,
                subscription: None,
                ticker: None,
            })
        });

        Ok(Self { shared, views })
    }

    /// Starts tracking `job`, or stops tracking with `None`. Any previous
    /// subscription and timer are cancelled before this returns.
    pub fn select(&self, job: Option<TrackedJob>) {
        dispatch(&self.shared, Msg::JobSelected(job));
    }

    /// Releases the subscription and timer. Safe to call repeatedly.
    pub fn dispose(&self) {
        dispatch(&self.shared, Msg::Disposed);
    }

    /// The most recently published view.
    pub fn view(&self) -> TrackerView {
        self.views.borrow().clone()
    }

    /// A receiver that wakes on every published view.
    pub fn watch(&self) -> watch::Receiver<TrackerView> {
        self.views.clone()
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn dispatch(shared: &Mutex<Inner>, msg: Msg) {
    match shared.lock() {
        Ok(mut inner) => inner.apply(msg),
        Err(_) => tracker_error!("Tracker state poisoned; dropping {:?}", msg),
    }
}

/// Dispatch from a spawned task. Returns `false` once the tracker is gone.
fn dispatch_weak(me: &Weak<Mutex<Inner>>, msg: Msg) -> bool {
    match me.upgrade() {
        Some(shared) => {
            dispatch(&shared, msg);
            true
        }
        None => false,
    }
}

impl Inner {
    fn apply(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.consume_dirty().then(|| state.view());
        let idle = state.job().is_none();
        self.state = state;

        for effect in effects {
            self.run_effect(effect);
        }
        if idle {
            abort(&mut self.fetch);
        }
        if let Some(view) = view {
            self.view_tx.send_replace(view);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchSnapshot { epoch, job_id } => {
                abort(&mut self.fetch);
                self.fetch = Some(self.spawn_fetch(epoch, job_id));
            }
            Effect::Subscribe { epoch, job_id } => {
                abort(&mut self.subscription);
                self.subscription = Some(self.spawn_subscription(epoch, job_id));
            }
            Effect::Unsubscribe => {
                if abort(&mut self.subscription) {
                    tracker_debug!("Subscription cancelled");
                }
            }
            Effect::StartTicker { generation } => {
                abort(&mut self.ticker);
                self.ticker = Some(self.spawn_ticker(generation));
            }
            Effect::StopTicker => {
                abort(&mut self.ticker);
            }
        }
    }

    fn spawn_fetch(&self, epoch: u64, job_id: JobId) -> JoinHandle<()> {
        let me = self.me.clone();
        let store = Arc::clone(&self.store);
        self.runtime.spawn(async move {
            let result = store.fetch(&job_id).await;
            if let Err(err) = &result {
                tracker_warn!("Initial read of job {} failed: {}", job_id, err);
            }
            dispatch_weak(
                &me,
                Msg::SnapshotFetched {
                    epoch,
                    result: result.map_err(Into::into),
                },
            );
        })
    }

    fn spawn_subscription(&self, epoch: u64, job_id: JobId) -> JoinHandle<()> {
        let me = self.me.clone();
        let store = Arc::clone(&self.store);
        self.runtime.spawn(async move {
            let mut subscription = match store.subscribe(&job_id).await {
                Ok(subscription) => subscription,
                Err(err) => {
                    tracker_warn!("Could not subscribe to job {}: {}", job_id, err);
                    return;
                }
            };
            tracker_info!("Subscribed to job {}", job_id);
            while let Some(snapshot) = subscription.next().await {
                if snapshot.id != job_id {
                    tracker_warn!(
                        "Dropping notification for job {} on subscription for {}",
                        snapshot.id,
                        job_id
                    );
                    continue;
                }
                if !dispatch_weak(&me, Msg::SnapshotChanged { epoch, snapshot }) {
                    return;
                }
            }
            tracker_info!("Change feed for job {} ended; no further updates", job_id);
        })
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let me = self.me.clone();
        let period = self.settings.ticker_interval.max(Duration::from_millis(1));
        self.runtime.spawn(async move {
            // The first message was emitted when the ticker started.
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !dispatch_weak(&me, Msg::TickerFired { generation }) {
                    return;
                }
            }
        })
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        abort(&mut self.fetch);
        abort(&mut self.subscription);
        abort(&mut self.ticker);
    }
}

/// Returns whether a task was running.
fn abort(slot: &mut Option<JoinHandle<()>>) -> bool {
    match slot.take() {
        Some(handle) => {
            handle.abort();
            true
        }
        None => false,
    }
}
