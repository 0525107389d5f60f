use std::fmt;
use std::sync::Arc;

use crate::feed::merge_feed;
use crate::phase::phase_rows;
use crate::view_model::TrackerView;
use crate::{Effect, JobSnapshot, JobStatus, PhaseCatalog, TickerState, TrackedJob};

/// Why the initial point read produced no snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    NotFound,
    Store(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::NotFound => write!(f, "job not found"),
            FetchFailure::Store(message) => write!(f, "could not load job: {message}"),
        }
    }
}

/// Everything one tracking session knows. Only mutated through
/// [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    catalog: Arc<PhaseCatalog>,
    job: Option<TrackedJob>,
    epoch: u64,
    snapshot: Option<JobSnapshot>,
    is_loading: bool,
    error: Option<FetchFailure>,
    ticker: TickerState,
    subscribed: bool,
    notified: bool,
    terminal_seen: bool,
    disposed: bool,
    dirty: bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self::new(Arc::new(PhaseCatalog::default()))
    }
}

impl TrackerState {
    pub fn new(catalog: Arc<PhaseCatalog>) -> Self {
        Self {
            catalog,
            job: None,
            epoch: 0,
            snapshot: None,
            is_loading: false,
            error: None,
            ticker: TickerState::new(),
            subscribed: false,
            notified: false,
            terminal_seen: false,
            disposed: false,
            dirty: false,
        }
    }

    pub fn view(&self) -> TrackerView {
        TrackerView {
            job: self.job.clone(),
            snapshot: self.snapshot.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            feed: merge_feed(
                self.snapshot
                    .as_ref()
                    .map(|s| s.highlights.as_slice())
                    .unwrap_or(&[]),
                self.ticker.messages(),
            ),
            phases: self
                .job
                .as_ref()
                .map(|job| phase_rows(&self.catalog, job, self.snapshot.as_ref()))
                .unwrap_or_default(),
        }
    }

    pub fn job(&self) -> Option<&TrackedJob> {
        self.job.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn ticker(&self) -> &TickerState {
        &self.ticker
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn select(&mut self, next: Option<TrackedJob>) -> Vec<Effect> {
        if self.disposed || next == self.job {
            return Vec::new();
        }
        let mut effects = self.teardown();
        if let Some(job) = next {
            self.epoch += 1;
            self.is_loading = true;
            self.subscribed = true;
            effects.push(Effect::FetchSnapshot {
                epoch: self.epoch,
                job_id: job.id.clone(),
            });
            effects.push(Effect::Subscribe {
                epoch: self.epoch,
                job_id: job.id.clone(),
            });
            self.job = Some(job);
        }
        self.dirty = true;
        effects
    }

    pub(crate) fn apply_fetch(
        &mut self,
        epoch: u64,
        result: Result<JobSnapshot, FetchFailure>,
    ) -> Vec<Effect> {
        if !self.is_current(epoch) || !self.is_loading {
            return Vec::new();
        }
        self.is_loading = false;
        self.dirty = true;
        if self.notified {
            // The subscription already delivered a newer row.
            return Vec::new();
        }
        match result {
            Ok(snapshot) if self.routes_to_job(&snapshot) => self.apply_snapshot(snapshot),
            Ok(_) => {
                self.error = Some(FetchFailure::NotFound);
                Vec::new()
            }
            Err(failure) => {
                self.error = Some(failure);
                Vec::new()
            }
        }
    }

    pub(crate) fn apply_notification(&mut self, epoch: u64, snapshot: JobSnapshot) -> Vec<Effect> {
        if !self.is_current(epoch) || !self.routes_to_job(&snapshot) {
            return Vec::new();
        }
        self.notified = true;
        self.error = None;
        self.apply_snapshot(snapshot)
    }

    pub(crate) fn apply_tick(&mut self, generation: u64) -> Vec<Effect> {
        if self.ticker.tick(generation) {
            self.dirty = true;
        }
        Vec::new()
    }

    pub(crate) fn dispose(&mut self) -> Vec<Effect> {
        let effects = self.teardown();
        if !self.disposed {
            self.disposed = true;
            self.dirty = true;
        }
        effects
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.job.is_some() && epoch == self.epoch
    }

    fn routes_to_job(&self, snapshot: &JobSnapshot) -> bool {
        self.job.as_ref().is_some_and(|job| job.id == snapshot.id)
    }

    fn apply_snapshot(&mut self, snapshot: JobSnapshot) -> Vec<Effect> {
        let mut effects = Vec::new();
        let previous_phase = self.snapshot.as_ref().and_then(|s| s.phase.clone());

        if snapshot.status.is_terminal() {
            self.terminal_seen = true;
            if self.ticker.stop() {
                effects.push(Effect::StopTicker);
            }
        } else if snapshot.status == JobStatus::Processing
            && !self.terminal_seen
            && snapshot.phase != previous_phase
        {
            effects.extend(self.restart_ticker(snapshot.phase.as_deref()));
        }

        self.snapshot = Some(snapshot);
        self.dirty = true;
        effects
    }

    fn restart_ticker(&mut self, phase: Option<&str>) -> Option<Effect> {
        let was_active = self.ticker.is_active();
        let running = match phase {
            Some(phase) => self.ticker.start(phase, self.catalog.ticker_messages(phase)),
            None => {
                self.ticker.reset();
                false
            }
        };
        if running {
            Some(Effect::StartTicker {
                generation: self.ticker.generation(),
            })
        } else if was_active {
            Some(Effect::StopTicker)
        } else {
            None
        }
    }

    fn teardown(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.job.take().is_none() {
            return effects;
        }
        if std::mem::take(&mut self.subscribed) {
            effects.push(Effect::Unsubscribe);
        }
        if self.ticker.reset() {
            effects.push(Effect::StopTicker);
        }
        self.epoch += 1;
        self.snapshot = None;
        self.is_loading = false;
        self.error = None;
        self.notified = false;
        self.terminal_seen = false;
        self.dirty = true;
        effects
    }
}
