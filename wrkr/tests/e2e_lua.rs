use std::path::Path;
use std::process::Command;

use anyhow::Context as _;

#[tokio::test]
async fn e2e_lua_prints_json_summary() -> anyhow::Result<()> {
    let script_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts/stats.lua");
    let exe = env!("CARGO_BIN_EXE_wrkr");

    let output = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg(&script_path)
            .arg("--output")
            .arg("json")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run wrkr binary")?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    anyhow::ensure!(
        output.status.success(),
        "wrkr exited with {}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        stdout,
        stderr
    );

    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .context("missing summary line")?;
    let summary: serde_json::Value = serde_json::from_str(line).context("parse summary")?;

    anyhow::ensure!(summary["kind"] == "summary", "unexpected line: {line}");
    anyhow::ensure!(summary["iterations_completed"] == 6, "unexpected summary: {line}");
    anyhow::ensure!(summary["iterations_interrupted"] == 0, "unexpected summary: {line}");
    anyhow::ensure!(summary["vus_max"] == 2, "unexpected summary: {line}");
    anyhow::ensure!(
        summary["scenarios"][0]["executor"] == "shared-iterations",
        "unexpected summary: {line}"
    );

    Ok(())
}

#[tokio::test]
async fn e2e_cli_overrides_take_precedence() -> anyhow::Result<()> {
    let script_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts/stats.lua");
    let exe = env!("CARGO_BIN_EXE_wrkr");

    let output = tokio::task::spawn_blocking(move || {
        Command::new(exe)
            .arg("run")
            .arg(&script_path)
            .arg("--iterations")
            .arg("3")
            .arg("--vus")
            .arg("1")
            .arg("--output")
            .arg("json")
            .output()
    })
    .await
    .context("spawn_blocking join")?
    .context("run wrkr binary")?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    anyhow::ensure!(output.status.success(), "wrkr exited with {}", output.status);

    let line = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .context("missing summary line")?;
    let summary: serde_json::Value = serde_json::from_str(line).context("parse summary")?;
    anyhow::ensure!(summary["iterations_completed"] == 3, "unexpected summary: {line}");
    anyhow::ensure!(summary["vus_max"] == 1, "unexpected summary: {line}");

    Ok(())
}
