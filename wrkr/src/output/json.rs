use serde::Serialize;
use std::io::Write as _;
use std::path::Path;

use wrkr_execution::runner::{RunConfig, RunSummary};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _script_path: &Path, _cfg: &RunConfig) {}

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        let line = build_summary_line(summary);
        let mut out = std::io::stdout().lock();
        serde_json::to_writer(&mut out, &line)?;
        writeln!(out)?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine {
    pub kind: &'static str,
    pub duration_ms: f64,
    pub vus_max: u64,
    pub iterations_completed: u64,
    pub iterations_interrupted: u64,
    pub dropped_iterations: u64,
    pub scenarios: Vec<JsonScenarioSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonScenarioSummary {
    pub scenario: String,
    pub executor: &'static str,
    pub iterations: u64,
    pub dropped_iterations: u64,
}

fn build_summary_line(summary: &RunSummary) -> JsonSummaryLine {
    let scenarios = summary
        .scenarios
        .iter()
        .map(|s| JsonScenarioSummary {
            scenario: s.name.clone(),
            executor: s.executor.into(),
            iterations: s.iterations,
            dropped_iterations: s.dropped_iterations,
        })
        .collect();

    JsonSummaryLine {
        kind: "summary",
        duration_ms: summary.duration.as_secs_f64() * 1000.0,
        vus_max: summary.vus_max,
        iterations_completed: summary.iterations_completed,
        iterations_interrupted: summary.iterations_interrupted,
        dropped_iterations: summary.dropped_iterations(),
        scenarios,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;
    use wrkr_execution::runner::{ScenarioExecutorKind, ScenarioSummary};

    #[test]
    fn summary_line_has_totals() {
        let summary = RunSummary {
            duration: Duration::from_millis(1500),
            vus_max: 2,
            iterations_completed: 7,
            iterations_interrupted: 1,
            scenarios: vec![ScenarioSummary {
                name: "s1".to_string(),
                executor: ScenarioExecutorKind::SharedIterations,
                iterations: 8,
                dropped_iterations: 0,
            }],
        };

        let line = build_summary_line(&summary);
        let v: Value = match serde_json::to_value(&line) {
            Ok(v) => v,
            Err(err) => panic!("to_value failed: {err}"),
        };

        assert_eq!(v.get("kind").and_then(Value::as_str), Some("summary"));
        assert_eq!(v.get("duration_ms").and_then(Value::as_f64), Some(1500.0));
        assert_eq!(
            v.get("iterations_interrupted").and_then(Value::as_u64),
            Some(1)
        );
        assert_eq!(
            v.pointer("/scenarios/0/executor").and_then(Value::as_str),
            Some("shared-iterations")
        );
    }
}
