use std::path::Path;
use std::time::Duration;

use wrkr_execution::runner::{RunConfig, RunSummary};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, script_path: &Path, cfg: &RunConfig) {
        println!("script: {}", script_path.display());
        let segment = cfg.segment;
        if segment.count() > 1 {
            println!("segment: {}/{}", segment.index(), segment.count());
        }
        println!();
    }

    fn print_summary(&self, summary: &RunSummary) -> anyhow::Result<()> {
        print!("{}", render(summary));
        Ok(())
    }
}

fn render(summary: &RunSummary) -> String {
    let mut out = String::new();
    for s in &summary.scenarios {
        out.push_str(&format!(
            "scenario: {} executor={} iterations={}",
            s.name, s.executor, s.iterations
        ));
        if s.dropped_iterations > 0 {
            out.push_str(&format!(" dropped={}", s.dropped_iterations));
        }
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!("duration: {}\n", format_duration(summary.duration)));
    out.push_str(&format!("vus_max: {}\n", summary.vus_max));
    out.push_str(&format!(
        "iterations: {} complete, {} interrupted\n",
        summary.iterations_completed, summary.iterations_interrupted
    ));
    out
}

fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
