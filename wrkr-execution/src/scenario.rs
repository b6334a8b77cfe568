use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::counter::Counter;
use crate::execution::ExecutionSegment;

/// Executor-reported progress of a scenario at one instant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioProgress {
    /// Completion fraction in `0.0..=1.0`.
    pub fraction: f64,
    /// Executor-specific descriptions, e.g. `["2 VUs", "4/10 shared iters"]`.
    pub details: Vec<String>,
}

impl ScenarioProgress {
    pub fn new(fraction: f64, details: Vec<String>) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            details,
        }
    }
}

/// Progress callback supplied by the executor that owns a scenario.
///
/// Called synchronously from stats queries, so it must not block.
pub type ProgressFn = Arc<dyn Fn() -> ScenarioProgress + Send + Sync + 'static>;

/// Source of per-iteration counters, bound to a VU when it is activated.
pub trait IterationCounters: Send + Sync {
    /// Claims the `(local, global)` counters for one new iteration.
    fn next_iteration_counters(&self) -> (u64, u64);
}

impl<F> IterationCounters for F
where
    F: Fn() -> (u64, u64) + Send + Sync,
{
    fn next_iteration_counters(&self) -> (u64, u64) {
        self()
    }
}

/// State of one running scenario.
pub struct ScenarioState {
    name: Arc<str>,
    executor: Arc<str>,
    started_at: SystemTime,
    started: Instant,
    progress: ProgressFn,

    local_iterations: Counter,
    global_iterations: Counter,
    global_stride: u64,
}

impl ScenarioState {
    pub fn new(
        name: impl Into<Arc<str>>,
        executor: impl Into<Arc<str>>,
        progress: ProgressFn,
    ) -> Self {
        Self::starting_at(name, executor, Instant::now(), progress)
    }

    /// Like [`ScenarioState::new`], with the start instant chosen by the caller so
    /// progress callbacks can share it.
    pub fn starting_at(
        name: impl Into<Arc<str>>,
        executor: impl Into<Arc<str>>,
        started: Instant,
        progress: ProgressFn,
    ) -> Self {
        let started_at = SystemTime::now()
            .checked_sub(started.elapsed())
            .unwrap_or_else(SystemTime::now);

        Self {
            name: name.into(),
            executor: executor.into(),
            started_at,
            started,
            progress,
            local_iterations: Counter::default(),
            global_iterations: Counter::default(),
            global_stride: 1,
        }
    }

    /// Numbers global iterations within `segment`: they start at the segment index
    /// and advance by the segment count.
    #[must_use]
    pub fn with_segment(mut self, segment: ExecutionSegment) -> Self {
        self.global_iterations = Counter::new(segment.index());
        self.global_stride = segment.count().max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn executor(&self) -> &str {
        &self.executor
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Evaluates the executor's progress callback now.
    pub fn progress(&self) -> ScenarioProgress {
        (self.progress)()
    }

    /// Iterations issued by this scenario so far.
    pub fn iterations_issued(&self) -> u64 {
        self.local_iterations.get()
    }
}

impl IterationCounters for ScenarioState {
    fn next_iteration_counters(&self) -> (u64, u64) {
        let local = self.local_iterations.next();
        let global = self.global_iterations.next_by(self.global_stride);
        (local, global)
    }
}

impl std::fmt::Debug for ScenarioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioState")
            .field("name", &self.name)
            .field("executor", &self.executor)
            .field("started_at", &self.started_at)
            .field("local_iterations", &self.local_iterations.get())
            .field("global_iterations", &self.global_iterations.get())
            .finish_non_exhaustive()
    }
}
