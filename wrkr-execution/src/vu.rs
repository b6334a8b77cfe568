use std::sync::Arc;

use crate::counter::Counter;
use crate::execution::{ActiveVuGuard, ExecutionState};
use crate::scenario::{IterationCounters, ScenarioState};

/// Identity of a physical VU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VuId {
    /// 1-based, dense within this instance of the run.
    pub local: u64,
    /// Unique across every instance of the run.
    pub global: u64,
}

/// A physical VU. Survives across scenario assignments.
#[derive(Debug)]
pub struct VuState {
    id: VuId,
    iterations: Counter,
}

impl VuState {
    pub fn new(id: VuId) -> Self {
        Self {
            id,
            iterations: Counter::default(),
        }
    }

    pub fn id(&self) -> VuId {
        self.id
    }

    /// Iterations started by this VU across every scenario so far.
    pub fn iterations(&self) -> u64 {
        self.iterations.get()
    }

    /// Assigns this VU to a scenario.
    pub fn activate(self: &Arc<Self>, params: ActivationParams) -> VuActivation {
        let active = params.execution.enter_active_vu();
        if active.is_none() {
            tracing::debug!(
                vu = self.id.local,
                scenario = params.scenario.name(),
                "activated beyond max_vus; not counted as active"
            );
        }

        VuActivation {
            vu: self.clone(),
            execution: params.execution,
            scenario: params.scenario,
            counters: params.counters,
            exec: params.exec,
            iterations: Counter::default(),
            _active: active,
        }
    }
}

/// What a VU needs to run iterations for one scenario.
pub struct ActivationParams {
    pub execution: Arc<ExecutionState>,
    pub scenario: Arc<ScenarioState>,
    /// Usually the scenario itself.
    pub counters: Arc<dyn IterationCounters>,
    /// Name of the script function to run per iteration.
    pub exec: Arc<str>,
}

impl ActivationParams {
    /// Parameters whose counters come from `scenario`.
    pub fn for_scenario(
        execution: Arc<ExecutionState>,
        scenario: Arc<ScenarioState>,
        exec: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            execution,
            counters: scenario.clone(),
            scenario,
            exec: exec.into(),
        }
    }
}

/// A VU assigned to a scenario. Counts as an active VU until dropped.
pub struct VuActivation {
    vu: Arc<VuState>,
    execution: Arc<ExecutionState>,
    scenario: Arc<ScenarioState>,
    counters: Arc<dyn IterationCounters>,
    exec: Arc<str>,
    iterations: Counter,
    _active: Option<ActiveVuGuard>,
}

impl VuActivation {
    pub fn vu(&self) -> &Arc<VuState> {
        &self.vu
    }

    pub fn scenario(&self) -> &Arc<ScenarioState> {
        &self.scenario
    }

    pub fn exec(&self) -> &str {
        &self.exec
    }

    /// Iterations started under this assignment.
    pub fn iterations(&self) -> u64 {
        self.iterations.get()
    }

    /// Claims the counters of the next iteration.
    ///
    /// Must be called exactly once per iteration, before user code runs; the
    /// returned context stays valid (and unchanged) for the whole iteration.
    pub fn begin_iteration(&mut self) -> IterationContext {
        let (scenario_local, scenario_global) = self.counters.next_iteration_counters();
        let counters = IterationNumbers {
            vu: self.vu.iterations.next(),
            vu_scenario: self.iterations.next(),
            scenario_local,
            scenario_global,
        };

        IterationContext {
            execution: self.execution.clone(),
            scenario: self.scenario.clone(),
            vu: self.vu.id,
            exec: self.exec.clone(),
            counters,
        }
    }
}

impl std::fmt::Debug for VuActivation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VuActivation")
            .field("vu", &self.vu.id)
            .field("scenario", &self.scenario.name())
            .field("exec", &self.exec)
            .field("iterations", &self.iterations.get())
            .finish_non_exhaustive()
    }
}

/// Counter values claimed for one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationNumbers {
    /// VU iteration across all of its scenarios.
    pub vu: u64,
    /// VU iteration within the current assignment.
    pub vu_scenario: u64,
    /// Scenario iteration across all of its VUs, within this instance.
    pub scenario_local: u64,
    /// Scenario iteration across all of its VUs and instances.
    pub scenario_global: u64,
}

/// Immutable view of one running iteration, handed to script code.
#[derive(Debug, Clone)]
pub struct IterationContext {
    execution: Arc<ExecutionState>,
    scenario: Arc<ScenarioState>,
    vu: VuId,
    exec: Arc<str>,
    counters: IterationNumbers,
}

impl IterationContext {
    pub fn execution(&self) -> &Arc<ExecutionState> {
        &self.execution
    }

    pub fn scenario(&self) -> &Arc<ScenarioState> {
        &self.scenario
    }

    pub fn vu(&self) -> VuId {
        self.vu
    }

    pub fn exec(&self) -> &str {
        &self.exec
    }

    pub fn counters(&self) -> IterationNumbers {
        self.counters
    }
}
