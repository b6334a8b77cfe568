use std::path::Path;

use wrkr_execution::runner::{RunConfig, RunSummary, run_scenarios, scenarios_from_options};

use crate::Result;
use crate::options::parse_script_options;
use crate::vu::LuaVuFactory;

/// Parses the script's options, applies `cfg` and runs every scenario on Lua VUs.
pub async fn run_script(script: &str, script_path: &Path, cfg: &RunConfig) -> Result<RunSummary> {
    let opts = parse_script_options(script, script_path)?;
    let scenarios = scenarios_from_options(opts, cfg)?;

    let execs = scenarios.iter().map(|s| s.exec.clone());
    let factory = LuaVuFactory::new(script, script_path, execs.collect::<Vec<_>>());

    Ok(run_scenarios(scenarios, cfg, factory).await?)
}
