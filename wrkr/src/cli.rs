use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use wrkr_execution::ExecutionSegment;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    humantime::parse_duration(s)
        .map_err(|err| format!("invalid duration '{s}': {err} (expected e.g. 10s, 250ms, 1m)"))
}

fn parse_segment(input: &str) -> Result<ExecutionSegment, String> {
    let invalid = || format!("invalid segment '{input}' (expected INDEX/COUNT, e.g. 0/2)");

    let (index, count) = input.trim().split_once('/').ok_or_else(invalid)?;
    let index: u64 = index.trim().parse().map_err(|_| invalid())?;
    let count: u64 = count.trim().parse().map_err(|_| invalid())?;

    ExecutionSegment::new(index, count)
        .ok_or_else(|| format!("segment index must be lower than the count (got '{input}')"))
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary.
    HumanReadable,
    /// Emit the summary as one JSON line to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "wrkr",
    author,
    version,
    about = "Scriptable load generator with live execution stats",
    long_about = "wrkr runs a Lua test script on a pool of virtual users.\n\nA test script defines an `options` table (iterations/vus/duration/scenarios) and the functions scenarios execute. While an iteration runs, `require(\"wrkr/execution\")` exposes `vu_stats()`, `scenario_stats()` and `test_stats()`.",
    after_help = "Examples:\n  wrkr run script.lua\n  wrkr run script.lua --vus 50 --duration 30s\n  wrkr run script.lua --iterations 1000 --output json\n  wrkr run script.lua --segment 1/2\n\nSet RUST_LOG (e.g. RUST_LOG=debug) to see runner logs on stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a test script
    #[command(
        long_about = "Run a test script on the configured virtual users.\n\nCLI flags override values from the script's `options` table."
    )]
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Path to the script (.lua)
    pub script: PathBuf,

    /// Override iterations (otherwise use `options.iterations` or default=1)
    #[arg(long)]
    pub iterations: Option<u64>,

    /// Number of virtual users
    #[arg(long)]
    pub vus: Option<u64>,

    /// Test duration (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Share of the run executed by this instance, as INDEX/COUNT
    #[arg(long, value_name = "INDEX/COUNT", value_parser = parse_segment)]
    pub segment: Option<ExecutionSegment>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}
