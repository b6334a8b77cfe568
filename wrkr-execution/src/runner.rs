mod config;
mod error;
mod executor;
mod gate;
mod pool;
mod run;
mod vu;

pub use config::{
    DEFAULT_EXEC, DEFAULT_GRACEFUL_STOP, DEFAULT_MAX_DURATION, DEFAULT_SCENARIO, RunConfig,
    ScenarioConfig, ScenarioExecutor, ScenarioExecutorKind, ScenarioOptions, ScriptOptions,
    planned_max_vus, scenarios_from_options,
};
pub use error::{Error, Result};
pub use executor::ScenarioSummary;
pub use gate::IterationGate;
pub use pool::{PooledVu, VuPool};
pub use run::{RunSummary, run_scenarios};
pub use vu::{VuFactory, VuRuntime};
