use std::sync::Arc;
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime};

use crate::counter::{BoundedGauge, Counter};
use crate::vu::VuId;

/// Run lifecycle as seen by stats queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum RunPhase {
    Uninitialized,
    Running,
    Finished,
}

/// Terminal outcome of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    Completed,
    Interrupted,
}

/// Slice of a distributed run handled by this instance (`index` of `count`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSegment {
    index: u64,
    count: u64,
}

impl ExecutionSegment {
    /// Returns `None` unless `index < count`.
    pub fn new(index: u64, count: u64) -> Option<Self> {
        (index < count).then_some(Self { index, count })
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Maps a 1-based instance-local VU id to its id across all instances.
    pub fn global_vu_id(&self, local: u64) -> u64 {
        local
            .saturating_sub(1)
            .saturating_mul(self.count)
            .saturating_add(self.index)
            .saturating_add(1)
    }
}

impl Default for ExecutionSegment {
    fn default() -> Self {
        Self { index: 0, count: 1 }
    }
}

/// Per-run execution state, shared by every VU of the run.
#[derive(Debug)]
pub struct ExecutionState {
    segment: ExecutionSegment,
    active_vus: BoundedGauge,
    initialized_vus: Counter,
    iterations_completed: Counter,
    iterations_interrupted: Counter,
    started: OnceLock<(Instant, SystemTime)>,
    finished: OnceLock<Instant>,
}

impl ExecutionState {
    pub fn new(max_vus: u64) -> Self {
        Self::with_segment(max_vus, ExecutionSegment::default())
    }

    pub fn with_segment(max_vus: u64, segment: ExecutionSegment) -> Self {
        Self {
            segment,
            active_vus: BoundedGauge::new(max_vus),
            initialized_vus: Counter::default(),
            iterations_completed: Counter::default(),
            iterations_interrupted: Counter::default(),
            started: OnceLock::new(),
            finished: OnceLock::new(),
        }
    }

    pub fn segment(&self) -> ExecutionSegment {
        self.segment
    }

    pub fn max_vus(&self) -> u64 {
        self.active_vus.max()
    }

    pub fn active_vus(&self) -> u64 {
        self.active_vus.get()
    }

    pub fn initialized_vus(&self) -> u64 {
        self.initialized_vus.get()
    }

    pub fn iterations_completed(&self) -> u64 {
        self.iterations_completed.get()
    }

    pub fn iterations_interrupted(&self) -> u64 {
        self.iterations_interrupted.get()
    }

    /// Adds `delta` to the active VU count (clamped to `[0, max_vus]`).
    pub fn adjust_active_vus(&self, delta: i64) -> u64 {
        self.active_vus.adjust(delta)
    }

    /// Counts one more active VU until the returned guard is dropped.
    ///
    /// Returns `None` when `max_vus` VUs are already active.
    pub fn enter_active_vu(self: &Arc<Self>) -> Option<ActiveVuGuard> {
        self.active_vus.try_incr().then(|| ActiveVuGuard {
            execution: self.clone(),
        })
    }

    pub fn record_iteration(&self, outcome: IterationOutcome) {
        match outcome {
            IterationOutcome::Completed => self.iterations_completed.incr(),
            IterationOutcome::Interrupted => self.iterations_interrupted.incr(),
        }
    }

    /// Allocates the id of the next initialized VU.
    pub fn next_vu_id(&self) -> VuId {
        let local = self.initialized_vus.next().saturating_add(1);
        VuId {
            local,
            global: self.segment.global_vu_id(local),
        }
    }

    /// Marks the run as started. Only the first call has an effect.
    pub fn mark_started(&self) -> Instant {
        self.started
            .get_or_init(|| (Instant::now(), SystemTime::now()))
            .0
    }

    /// Marks the run as finished. Only the first call has an effect.
    pub fn mark_finished(&self) {
        let _ = self.finished.set(Instant::now());
    }

    pub fn phase(&self) -> RunPhase {
        match (self.started.get(), self.finished.get()) {
            (_, Some(_)) => RunPhase::Finished,
            (Some(_), None) => RunPhase::Running,
            (None, None) => RunPhase::Uninitialized,
        }
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started.get().map(|(_, wall)| *wall)
    }

    /// Time since the run started; zero before the start, frozen once finished.
    pub fn elapsed(&self) -> Duration {
        let Some((started, _)) = self.started.get() else {
            return Duration::ZERO;
        };
        match self.finished.get() {
            Some(finished) => finished.saturating_duration_since(*started),
            None => started.elapsed(),
        }
    }
}

/// Keeps one VU counted as active; decrements the count on drop.
#[derive(Debug)]
pub struct ActiveVuGuard {
    execution: Arc<ExecutionState>,
}

impl Drop for ActiveVuGuard {
    fn drop(&mut self) {
        self.execution.adjust_active_vus(-1);
    }
}
