//! Read-only stats queries available to script code while an iteration runs.
//!
//! Each query takes the ambient iteration context, if any. Outside an iteration
//! (init code, setup, anything before the first VU is activated) every query
//! fails with [`QueryNotAvailable`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Serialize, Serializer};

use crate::vu::IterationContext;

/// Which kind of information a query asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum StatsKind {
    #[strum(serialize = "VU")]
    Vu,
    #[strum(serialize = "scenario")]
    Scenario,
    #[strum(serialize = "test")]
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("getting {kind} information in the init context is not supported")]
pub struct QueryNotAvailable {
    pub kind: StatsKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VuStats {
    pub id: u64,
    pub id_global: u64,
    /// Iteration of this VU across every scenario it ran.
    pub iteration: u64,
    /// Iteration of this VU within the current scenario.
    pub iteration_scenario: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioStats {
    pub name: String,
    pub executor: String,
    #[serde(serialize_with = "serialize_epoch_millis")]
    pub start_time: SystemTime,
    pub progress: f64,
    pub progress_details: Vec<String>,
    /// Scenario iteration within this instance, across all VUs.
    pub iteration: u64,
    /// Scenario iteration across all instances of the run.
    pub iteration_global: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestStats {
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    pub vus_active: u64,
    pub vus_max: u64,
    pub iterations_completed: u64,
    pub iterations_interrupted: u64,
}

fn require(
    ctx: Option<&IterationContext>,
    kind: StatsKind,
) -> Result<&IterationContext, QueryNotAvailable> {
    ctx.ok_or(QueryNotAvailable { kind })
}

pub fn vu_stats(ctx: Option<&IterationContext>) -> Result<VuStats, QueryNotAvailable> {
    let ctx = require(ctx, StatsKind::Vu)?;
    let counters = ctx.counters();
    let id = ctx.vu();

    Ok(VuStats {
        id: id.local,
        id_global: id.global,
        iteration: counters.vu,
        iteration_scenario: counters.vu_scenario,
    })
}

pub fn scenario_stats(ctx: Option<&IterationContext>) -> Result<ScenarioStats, QueryNotAvailable> {
    let ctx = require(ctx, StatsKind::Scenario)?;
    let scenario = ctx.scenario();
    let counters = ctx.counters();
    let progress = scenario.progress();

    Ok(ScenarioStats {
        name: scenario.name().to_string(),
        executor: scenario.executor().to_string(),
        start_time: scenario.started_at(),
        progress: progress.fraction,
        progress_details: progress.details,
        iteration: counters.scenario_local,
        iteration_global: counters.scenario_global,
    })
}

pub fn test_stats(ctx: Option<&IterationContext>) -> Result<TestStats, QueryNotAvailable> {
    let ctx = require(ctx, StatsKind::Test)?;
    let execution = ctx.execution();

    Ok(TestStats {
        duration: execution.elapsed(),
        vus_active: execution.active_vus(),
        vus_max: execution.max_vus(),
        iterations_completed: execution.iterations_completed(),
        iterations_interrupted: execution.iterations_interrupted(),
    })
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

fn serialize_epoch_millis<S: Serializer>(t: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    let millis = t
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u64::MAX as u128) as u64)
        .unwrap_or(0);
    s.serialize_u64(millis)
}
