use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinSet;

use super::config::{ScenarioConfig, ScenarioExecutor, ScenarioExecutorKind, arrival_interval};
use super::error::{Error, Result};
use super::gate::IterationGate;
use super::pool::{PooledVu, VuPool};
use super::vu::VuRuntime;
use crate::counter::Counter;
use crate::execution::{ExecutionState, IterationOutcome};
use crate::scenario::{ProgressFn, ScenarioProgress, ScenarioState};
use crate::vu::{ActivationParams, VuActivation};

/// How long a starting scenario waits for VUs still held by a finishing one.
const VU_RETURN_WAIT: Duration = Duration::from_secs(10);

/// Per-scenario totals reported once the scenario finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub name: String,
    pub executor: ScenarioExecutorKind,
    /// Iterations started by the scenario.
    pub iterations: u64,
    /// Arrival-rate iterations skipped because no VU was free.
    pub dropped_iterations: u64,
}

pub(crate) struct ScenarioRun<V> {
    pub config: ScenarioConfig,
    pub execution: Arc<ExecutionState>,
    pub pool: Arc<VuPool<V>>,
    pub run_started: Instant,
}

/// Scenario-wide timing, shared by every VU task.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    /// No iteration starts after this.
    deadline: Instant,
    /// Iterations still running at this point are cancelled.
    hard_stop: Instant,
}

pub(crate) async fn run_scenario<V: VuRuntime>(run: ScenarioRun<V>) -> Result<ScenarioSummary> {
    let ScenarioRun {
        config,
        execution,
        pool,
        run_started,
    } = run;

    tokio::time::sleep_until((run_started + config.start_time).into()).await;

    let started = Instant::now();
    let deadline = started + config.executor.duration();
    let window = Window {
        started,
        deadline,
        hard_stop: deadline + config.graceful_stop,
    };
    let kind = config.executor.kind();
    let done = Arc::new(Counter::default());
    let progress = progress_fn(&config.executor, window, done.clone());
    let scenario = Arc::new(
        ScenarioState::starting_at(config.name.as_str(), kind.to_string(), started, progress)
            .with_segment(execution.segment()),
    );
    let exec: Arc<str> = Arc::from(config.exec.as_str());

    tracing::info!(
        scenario = %config.name,
        executor = %kind,
        exec = %exec,
        "scenario started"
    );

    let scenario_ctx = ScenarioCtx {
        execution,
        scenario: scenario.clone(),
        exec,
        pool,
        window,
        done,
    };

    let dropped_iterations = match config.executor {
        ScenarioExecutor::SharedIterations {
            vus, iterations, ..
        } => {
            let gate = Arc::new(IterationGate::new(Some(iterations), deadline));
            run_closed(&scenario_ctx, &config.name, vus, |_| gate.clone()).await?;
            0
        }
        ScenarioExecutor::PerVuIterations {
            vus, iterations, ..
        } => {
            run_closed(&scenario_ctx, &config.name, vus, |_| {
                Arc::new(IterationGate::new(Some(iterations), deadline))
            })
            .await?;
            0
        }
        ScenarioExecutor::ConstantVus { vus, .. } => {
            let gate = Arc::new(IterationGate::new(None, deadline));
            run_closed(&scenario_ctx, &config.name, vus, |_| gate.clone()).await?;
            0
        }
        ScenarioExecutor::ConstantArrivalRate {
            rate,
            time_unit,
            pre_allocated_vus,
            max_vus,
            ..
        } => {
            let interval = arrival_interval(rate, time_unit)
                .ok_or(Error::RateTooHigh { rate, time_unit })?;
            run_arrival_rate(
                &scenario_ctx,
                &config.name,
                interval,
                pre_allocated_vus,
                max_vus,
            )
            .await?
        }
    };

    let iterations = scenario.iterations_issued();
    tracing::info!(
        scenario = %config.name,
        iterations,
        dropped_iterations,
        elapsed = ?scenario.elapsed(),
        "scenario finished"
    );

    Ok(ScenarioSummary {
        name: config.name,
        executor: kind,
        iterations,
        dropped_iterations,
    })
}

struct ScenarioCtx<V> {
    execution: Arc<ExecutionState>,
    scenario: Arc<ScenarioState>,
    exec: Arc<str>,
    pool: Arc<VuPool<V>>,
    window: Window,
    /// Iterations that ended, whatever their outcome.
    done: Arc<Counter>,
}

impl<V> ScenarioCtx<V> {
    fn activation(&self) -> ActivationParams {
        ActivationParams::for_scenario(
            self.execution.clone(),
            self.scenario.clone(),
            self.exec.clone(),
        )
    }
}

/// Closed model: a fixed set of VUs, each looping while its gate admits iterations.
async fn run_closed<V: VuRuntime>(
    ctx: &ScenarioCtx<V>,
    name: &str,
    vus: u64,
    gate_for: impl Fn(usize) -> Arc<IterationGate>,
) -> Result<()> {
    let assigned = ctx
        .pool
        .acquire_many(vus, VU_RETURN_WAIT)
        .await
        .ok_or_else(|| Error::PoolExhausted(name.to_string()))?;

    // Dropping the set (a failed run) aborts every VU task still running.
    let mut running = JoinSet::new();
    for (idx, mut vu) in assigned.into_iter().enumerate() {
        let gate = gate_for(idx);
        let params = ctx.activation();
        let done = ctx.done.clone();
        let hard_stop = ctx.window.hard_stop;

        running.spawn(async move {
            let mut activation = vu.state.activate(params);
            while gate.next() {
                let finished = run_one(&mut vu.runtime, &mut activation, hard_stop).await;
                done.incr();
                if !finished {
                    break;
                }
            }
            drop(activation);
            vu
        });
    }

    while let Some(vu) = running.join_next().await {
        ctx.pool.release(vu?);
    }
    Ok(())
}

type IdleVus<V> = Arc<Mutex<VecDeque<(PooledVu<V>, VuActivation)>>>;

/// Open model: one iteration every `interval`, on whichever assigned VU has been
/// idle the longest. Returns the number of dropped iterations.
async fn run_arrival_rate<V: VuRuntime>(
    ctx: &ScenarioCtx<V>,
    name: &str,
    interval: Duration,
    pre_allocated_vus: u64,
    max_vus: u64,
) -> Result<u64> {
    let activate = |vu: PooledVu<V>| {
        let activation = vu.state.activate(ctx.activation());
        (vu, activation)
    };

    let pre_allocated = ctx
        .pool
        .acquire_many(pre_allocated_vus, VU_RETURN_WAIT)
        .await
        .ok_or_else(|| Error::PoolExhausted(name.to_string()))?;
    let mut assigned = pre_allocated_vus;
    let idle: IdleVus<V> = Arc::new(Mutex::new(
        pre_allocated.into_iter().map(&activate).collect(),
    ));

    let mut dropped = 0u64;
    let mut running = JoinSet::new();
    let mut next_at = ctx.window.started;
    while next_at < ctx.window.deadline {
        let at = next_at;
        next_at += interval;
        tokio::time::sleep_until(at.into()).await;

        while let Some(finished) = running.try_join_next() {
            finished?;
        }

        let next = idle.lock().pop_front();
        let next = match next {
            Some(slot) => Some(slot),
            None if assigned < max_vus => ctx.pool.acquire().map(|vu| {
                assigned += 1;
                tracing::debug!(scenario = name, vus = assigned, "VU joined");
                activate(vu)
            }),
            None => None,
        };

        let Some((mut vu, mut activation)) = next else {
            dropped += 1;
            tracing::debug!(scenario = name, dropped, "no free VU, iteration dropped");
            continue;
        };

        let idle = idle.clone();
        let done = ctx.done.clone();
        let hard_stop = ctx.window.hard_stop;
        running.spawn(async move {
            run_one(&mut vu.runtime, &mut activation, hard_stop).await;
            done.incr();
            idle.lock().push_back((vu, activation));
        });
    }

    while let Some(finished) = running.join_next().await {
        finished?;
    }

    let slots: Vec<_> = idle.lock().drain(..).collect();
    for (vu, activation) in slots {
        drop(activation);
        ctx.pool.release(vu);
    }

    if dropped > 0 {
        tracing::warn!(scenario = name, dropped, "dropped iterations: not enough VUs");
    }
    Ok(dropped)
}

/// Runs one iteration and records its outcome. Returns `false` when the
/// iteration was cut short by the hard stop.
async fn run_one<V: VuRuntime>(
    runtime: &mut V,
    activation: &mut VuActivation,
    hard_stop: Instant,
) -> bool {
    let ctx = activation.begin_iteration();
    let execution = ctx.execution().clone();

    match tokio::time::timeout_at(hard_stop.into(), runtime.run_iteration(ctx.exec(), &ctx)).await {
        Ok(Ok(())) => {
            execution.record_iteration(IterationOutcome::Completed);
            true
        }
        Ok(Err(err)) => {
            tracing::warn!(
                vu = ctx.vu().local,
                scenario = ctx.scenario().name(),
                error = %err,
                "iteration failed"
            );
            execution.record_iteration(IterationOutcome::Interrupted);
            true
        }
        Err(_) => {
            tracing::debug!(
                vu = ctx.vu().local,
                scenario = ctx.scenario().name(),
                "iteration cancelled after graceful stop"
            );
            execution.record_iteration(IterationOutcome::Interrupted);
            false
        }
    }
}

fn progress_fn(executor: &ScenarioExecutor, window: Window, done: Arc<Counter>) -> ProgressFn {
    match *executor {
        ScenarioExecutor::SharedIterations {
            vus, iterations, ..
        } => Arc::new(move || {
            let done = done.get();
            ScenarioProgress::new(
                done as f64 / iterations as f64,
                vec![
                    format!("{vus} VUs"),
                    format!("{done}/{iterations} shared iters"),
                ],
            )
        }),
        ScenarioExecutor::PerVuIterations {
            vus, iterations, ..
        } => Arc::new(move || {
            let total = vus.saturating_mul(iterations);
            let done = done.get();
            ScenarioProgress::new(
                done as f64 / total as f64,
                vec![
                    format!("{vus} VUs"),
                    format!("{done}/{total} iters, {iterations} per VU"),
                ],
            )
        }),
        ScenarioExecutor::ConstantVus { vus, duration } => Arc::new(move || {
            let elapsed = window.started.elapsed().min(duration);
            ScenarioProgress::new(
                elapsed.as_secs_f64() / duration.as_secs_f64(),
                vec![
                    format!("{vus} VUs"),
                    format!(
                        "{:.1}s/{:.1}s",
                        elapsed.as_secs_f64(),
                        duration.as_secs_f64()
                    ),
                ],
            )
        }),
        ScenarioExecutor::ConstantArrivalRate {
            rate,
            time_unit,
            duration,
            ..
        } => Arc::new(move || {
            let elapsed = window.started.elapsed().min(duration);
            ScenarioProgress::new(
                elapsed.as_secs_f64() / duration.as_secs_f64(),
                vec![
                    format!("{rate} iters per {}", humanize(time_unit)),
                    format!("{} iters done", done.get()),
                ],
            )
        }),
    }
}

fn humanize(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        format!("{}s", d.as_secs())
    } else {
        format!("{}ms", d.as_millis())
    }
}
