use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use super::config::{RunConfig, ScenarioConfig, planned_max_vus};
use super::error::{Error, Result};
use super::executor::{ScenarioRun, ScenarioSummary, run_scenario};
use super::pool::{PooledVu, VuPool};
use super::vu::VuFactory;
use crate::execution::ExecutionState;
use crate::vu::VuState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub duration: Duration,
    pub vus_max: u64,
    pub iterations_completed: u64,
    pub iterations_interrupted: u64,
    /// In the order the scenarios were given.
    pub scenarios: Vec<ScenarioSummary>,
}

impl RunSummary {
    pub fn scenario(&self, name: &str) -> Option<&ScenarioSummary> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    pub fn dropped_iterations(&self) -> u64 {
        self.scenarios.iter().map(|s| s.dropped_iterations).sum()
    }
}

/// Initializes every VU the scenarios need, then runs the scenarios on them.
///
/// VUs are created one at a time, before the run starts; a failing VU aborts the
/// run before any iteration starts.
pub async fn run_scenarios<F: VuFactory>(
    scenarios: Vec<ScenarioConfig>,
    cfg: &RunConfig,
    factory: F,
) -> Result<RunSummary> {
    let vus_max = planned_max_vus(&scenarios);
    let execution = Arc::new(ExecutionState::with_segment(vus_max, cfg.segment));

    let mut vus = Vec::new();
    for _ in 0..vus_max {
        let id = execution.next_vu_id();
        let runtime = factory
            .new_vu(id, &execution)
            .await
            .map_err(|err| Error::Vu(err.to_string()))?;
        tracing::debug!(vu = id.local, vu_global = id.global, "VU initialized");
        vus.push(PooledVu {
            state: Arc::new(VuState::new(id)),
            runtime,
        });
    }
    let pool = Arc::new(VuPool::new(vus));

    let run_started = execution.mark_started();
    tracing::info!(
        scenarios = scenarios.len(),
        vus_max,
        segment = ?execution.segment(),
        "run started"
    );

    let mut running = JoinSet::new();
    for (idx, config) in scenarios.into_iter().enumerate() {
        let run = ScenarioRun {
            config,
            execution: execution.clone(),
            pool: pool.clone(),
            run_started,
        };
        running.spawn(async move { (idx, run_scenario(run).await) });
    }

    let joined = join_scenarios(&mut running).await;
    if joined.is_err() {
        running.abort_all();
        while running.join_next().await.is_some() {}
    }
    execution.mark_finished();

    let summaries = match joined {
        Ok(summaries) => summaries,
        Err(err) => {
            tracing::warn!(
                phase = %execution.phase(),
                duration = ?execution.elapsed(),
                error = %err,
                "run failed, remaining scenarios stopped"
            );
            return Err(err);
        }
    };

    let summary = RunSummary {
        duration: execution.elapsed(),
        vus_max,
        iterations_completed: execution.iterations_completed(),
        iterations_interrupted: execution.iterations_interrupted(),
        scenarios: summaries,
    };
    tracing::info!(
        phase = %execution.phase(),
        duration = ?summary.duration,
        iterations_completed = summary.iterations_completed,
        iterations_interrupted = summary.iterations_interrupted,
        "run finished"
    );
    Ok(summary)
}

/// Waits for every scenario, in completion order; stops at the first failure.
async fn join_scenarios(
    running: &mut JoinSet<(usize, Result<ScenarioSummary>)>,
) -> Result<Vec<ScenarioSummary>> {
    let mut done = Vec::with_capacity(running.len());
    while let Some(joined) = running.join_next().await {
        let (idx, summary) = joined?;
        done.push((idx, summary?));
    }

    done.sort_by_key(|(idx, _)| *idx);
    Ok(done.into_iter().map(|(_, summary)| summary).collect())
}
