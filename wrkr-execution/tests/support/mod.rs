#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use wrkr_execution::runner::{ScenarioConfig, ScenarioExecutor, VuFactory, VuRuntime};
use wrkr_execution::{
    ExecutionState, IterationContext, QueryNotAvailable, ScenarioStats, TestStats, VuId, VuStats,
    scenario_stats, test_stats, vu_stats,
};

#[derive(Debug, thiserror::Error)]
pub enum TestVuError {
    #[error(transparent)]
    Query(#[from] QueryNotAvailable),

    #[error("exec `{0}` failed on purpose")]
    Failed(String),
}

/// What one finished iteration observed.
#[derive(Debug, Clone)]
pub struct Record {
    pub exec: String,
    pub vu: VuStats,
    pub scenario: ScenarioStats,
    pub test: TestStats,
    /// Queried again after the exec's pause.
    pub vu_after: VuStats,
    pub scenario_after: ScenarioStats,
}

impl Record {
    pub fn local(&self) -> u64 {
        self.scenario.iteration
    }

    pub fn global(&self) -> u64 {
        self.scenario.iteration_global
    }
}

/// Builds VUs that query every stats function around a per-exec pause and keep
/// what they saw.
#[derive(Clone, Default)]
pub struct RecordingFactory {
    pub pauses: HashMap<String, Duration>,
    pub fail_exec: Option<String>,
    pub panic_exec: Option<String>,
    pub query_in_init: bool,
    pub records: Arc<Mutex<Vec<Record>>>,
}

impl RecordingFactory {
    pub fn with_pause(mut self, exec: &str, pause: Duration) -> Self {
        self.pauses.insert(exec.to_string(), pause);
        self
    }

    pub fn failing(mut self, exec: &str) -> Self {
        self.fail_exec = Some(exec.to_string());
        self
    }

    pub fn panicking(mut self, exec: &str) -> Self {
        self.panic_exec = Some(exec.to_string());
        self
    }

    pub fn querying_in_init(mut self) -> Self {
        self.query_in_init = true;
        self
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }
}

pub struct RecordingVu {
    pub id: VuId,
    pauses: HashMap<String, Duration>,
    fail_exec: Option<String>,
    panic_exec: Option<String>,
    records: Arc<Mutex<Vec<Record>>>,
}

impl VuFactory for RecordingFactory {
    type Vu = RecordingVu;
    type Error = TestVuError;

    async fn new_vu(
        &self,
        id: VuId,
        _execution: &Arc<ExecutionState>,
    ) -> Result<RecordingVu, TestVuError> {
        if self.query_in_init {
            vu_stats(None)?;
        }

        Ok(RecordingVu {
            id,
            pauses: self.pauses.clone(),
            fail_exec: self.fail_exec.clone(),
            panic_exec: self.panic_exec.clone(),
            records: self.records.clone(),
        })
    }
}

impl VuRuntime for RecordingVu {
    type Error = TestVuError;

    async fn run_iteration(
        &mut self,
        exec: &str,
        ctx: &IterationContext,
    ) -> Result<(), TestVuError> {
        let vu = vu_stats(Some(ctx))?;
        let scenario = scenario_stats(Some(ctx))?;
        let test = test_stats(Some(ctx))?;

        if let Some(pause) = self.pauses.get(exec) {
            tokio::time::sleep(*pause).await;
        }

        if self.panic_exec.as_deref() == Some(exec) {
            panic!("exec `{exec}` panicked on purpose");
        }
        if self.fail_exec.as_deref() == Some(exec) {
            return Err(TestVuError::Failed(exec.to_string()));
        }

        let record = Record {
            exec: exec.to_string(),
            vu,
            scenario,
            test,
            vu_after: vu_stats(Some(ctx))?,
            scenario_after: scenario_stats(Some(ctx))?,
        };
        self.records.lock().push(record);
        Ok(())
    }
}

pub fn scenario(name: &str, executor: ScenarioExecutor) -> ScenarioConfig {
    ScenarioConfig {
        name: name.to_string(),
        exec: name.to_string(),
        executor,
        start_time: Duration::ZERO,
        graceful_stop: Duration::from_secs(1),
    }
}

pub fn by_vu(records: &[Record]) -> HashMap<u64, Vec<Record>> {
    let mut out: HashMap<u64, Vec<Record>> = HashMap::new();
    for r in records {
        out.entry(r.vu.id).or_default().push(r.clone());
    }
    out
}
