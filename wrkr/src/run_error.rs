use wrkr_execution::runner::Error as CoreError;
use wrkr_execution_lua::Error as LuaError;

use crate::exit_codes::ExitCode;

#[derive(Debug)]
pub enum RunError {
    InvalidInput(anyhow::Error),
    ScriptError(anyhow::Error),
    RuntimeError(anyhow::Error),
}

impl RunError {
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::ScriptError(_) => ExitCode::ScriptError,
            Self::RuntimeError(_) => ExitCode::RuntimeError,
        }
    }

    #[must_use]
    pub fn anyhow(&self) -> &anyhow::Error {
        match self {
            Self::InvalidInput(e) | Self::ScriptError(e) | Self::RuntimeError(e) => e,
        }
    }
}

impl From<LuaError> for RunError {
    fn from(err: LuaError) -> Self {
        let code = match &err {
            LuaError::Lua(_) | LuaError::MissingDefault | LuaError::MissingExec(_) => {
                ExitCode::ScriptError
            }
            LuaError::Io(_) => ExitCode::RuntimeError,
            LuaError::Core(CoreError::Vu(_)) => ExitCode::ScriptError,
            LuaError::Core(CoreError::Join(_) | CoreError::PoolExhausted(_)) => {
                ExitCode::RuntimeError
            }
            LuaError::Core(_)
            | LuaError::InvalidVus
            | LuaError::InvalidIterations
            | LuaError::InvalidCount(_)
            | LuaError::InvalidString(_)
            | LuaError::InvalidDuration(_) => ExitCode::InvalidInput,
        };

        let err = anyhow::Error::from(err);
        match code {
            ExitCode::ScriptError => Self::ScriptError(err),
            ExitCode::InvalidInput => Self::InvalidInput(err),
            _ => Self::RuntimeError(err),
        }
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(e) | Self::ScriptError(e) | Self::RuntimeError(e) => {
                write!(f, "{e:#}")
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.anyhow().as_ref())
    }
}
