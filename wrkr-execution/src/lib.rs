//! Execution state of a VU-based load test: who is running, which iteration this
//! is, and how far the run has come.
//!
//! The counters are owned by [`ExecutionState`], [`ScenarioState`] and
//! [`VuState`]; script code reads them through the [`stats`] queries, which only
//! work inside an iteration.

mod counter;
mod execution;
mod scenario;
mod vu;

pub mod runner;
pub mod stats;

pub use counter::{BoundedGauge, Counter};
pub use execution::{ActiveVuGuard, ExecutionSegment, ExecutionState, IterationOutcome, RunPhase};
pub use scenario::{IterationCounters, ProgressFn, ScenarioProgress, ScenarioState};
pub use stats::{
    QueryNotAvailable, ScenarioStats, StatsKind, TestStats, VuStats, scenario_stats, test_stats,
    vu_stats,
};
pub use vu::{
    ActivationParams, IterationContext, IterationNumbers, VuActivation, VuId, VuState,
};
