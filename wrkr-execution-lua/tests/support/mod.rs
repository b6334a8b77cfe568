#![allow(dead_code)]

use std::path::{Path, PathBuf};

use wrkr_execution_lua::{Result, RunConfig, RunSummary};

pub struct LoadedScript {
    pub path: PathBuf,
    pub text: String,
}

pub fn scripts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("scripts")
}

pub fn load_test_script(name: &str) -> std::io::Result<LoadedScript> {
    let path = scripts_dir().join(name);
    let text = std::fs::read_to_string(&path)?;
    Ok(LoadedScript { path, text })
}

pub async fn run_script(script_name: &str, cfg: RunConfig) -> Result<RunSummary> {
    let script = load_test_script(script_name)?;
    wrkr_execution_lua::run_script(&script.text, &script.path, &cfg).await
}
