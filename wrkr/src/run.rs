use anyhow::Context as _;
use std::path::Path;

use wrkr_execution::runner::RunConfig;

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    match script_extension(&args.script) {
        "lua" => {}
        ext => {
            return Err(RunError::InvalidInput(anyhow::anyhow!(
                "unsupported script extension `{ext}` (expected .lua): {}",
                args.script.display()
            )));
        }
    }

    let script = tokio::fs::read_to_string(&args.script)
        .await
        .with_context(|| format!("failed to read script {}", args.script.display()))
        .map_err(RunError::InvalidInput)?;

    let cfg = run_config(&args);
    out.print_header(&args.script, &cfg);

    let summary = wrkr_execution_lua::run_script(&script, &args.script, &cfg).await?;
    out.print_summary(&summary)
        .map_err(RunError::RuntimeError)?;

    Ok(ExitCode::Success)
}

fn run_config(args: &RunArgs) -> RunConfig {
    RunConfig {
        iterations: args.iterations,
        vus: args.vus,
        duration: args.duration,
        segment: args.segment.unwrap_or_default(),
    }
}

fn script_extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("")
}
