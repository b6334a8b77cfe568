pub use wrkr_execution::runner::{
    RunConfig, RunSummary, ScenarioConfig, ScenarioOptions, ScriptOptions,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("core error: {0}")]
    Core(#[from] wrkr_execution::runner::Error),

    #[error("expected function `Default()` in script")]
    MissingDefault,

    #[error("expected function `{0}()` in script")]
    MissingExec(String),

    #[error("`options.vus` must be a positive integer")]
    InvalidVus,

    #[error("`options.iterations` must be a positive integer")]
    InvalidIterations,

    #[error("`options.scenarios[*].{0}` must be a positive integer")]
    InvalidCount(&'static str),

    #[error("`options.scenarios[*].{0}` must be a string")]
    InvalidString(&'static str),

    #[error("`{0}` must be a duration in seconds or a string such as 250ms")]
    InvalidDuration(&'static str),
}

mod loader;
mod modules;
mod options;
mod run;
mod vu;

pub use options::parse_script_options;
pub use run::run_script;
pub use vu::{LuaVu, LuaVuFactory};
