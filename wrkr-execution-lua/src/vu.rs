use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use mlua::{Function, Lua, Value};
use wrkr_execution::runner::{DEFAULT_EXEC, VuFactory, VuRuntime};
use wrkr_execution::{ExecutionState, IterationContext, VuId};

use crate::loader::{chunk_name, configure_module_path};
use crate::modules;
use crate::{Error, Result};

/// Creates one Lua state per VU.
#[derive(Debug, Clone)]
pub struct LuaVuFactory {
    script: Arc<str>,
    script_path: PathBuf,
    execs: Vec<String>,
}

impl LuaVuFactory {
    /// `execs` are the functions scenarios may call; each VU checks they exist.
    pub fn new(
        script: impl Into<Arc<str>>,
        script_path: impl Into<PathBuf>,
        execs: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut execs: Vec<String> = execs.into_iter().collect();
        execs.sort();
        execs.dedup();

        Self {
            script: script.into(),
            script_path: script_path.into(),
            execs,
        }
    }
}

pub struct LuaVu {
    id: VuId,
    lua: Lua,
    execs: HashMap<String, Function>,
}

impl std::fmt::Debug for LuaVu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaVu")
            .field("id", &self.id)
            .field("execs", &self.execs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl VuFactory for LuaVuFactory {
    type Vu = LuaVu;
    type Error = Error;

    async fn new_vu(&self, id: VuId, _execution: &Arc<ExecutionState>) -> Result<LuaVu> {
        let lua = Lua::new();
        configure_module_path(&lua, &self.script_path)?;
        modules::register(&lua)?;

        // Init context: no iteration is installed while the script body runs.
        lua.load(self.script.as_ref())
            .set_name(chunk_name(&self.script_path))
            .exec()?;

        let globals = lua.globals();
        let mut execs = HashMap::with_capacity(self.execs.len());
        for name in &self.execs {
            match globals.get::<Value>(name.as_str())? {
                Value::Function(f) => {
                    execs.insert(name.clone(), f);
                }
                _ if name == DEFAULT_EXEC => return Err(Error::MissingDefault),
                _ => return Err(Error::MissingExec(name.clone())),
            }
        }

        Ok(LuaVu { id, lua, execs })
    }
}

impl VuRuntime for LuaVu {
    type Error = Error;

    async fn run_iteration(&mut self, exec: &str, ctx: &IterationContext) -> Result<()> {
        let Some(f) = self.execs.get(exec) else {
            return Err(Error::MissingExec(exec.to_string()));
        };

        let _ctx = InstalledContext::install(&self.lua, ctx.clone());
        f.call_async::<()>(()).await?;
        Ok(())
    }
}

/// Keeps the iteration context visible to stats queries; removes it when dropped,
/// including when the iteration is cancelled mid-call.
struct InstalledContext<'a> {
    lua: &'a Lua,
}

impl<'a> InstalledContext<'a> {
    fn install(lua: &'a Lua, ctx: IterationContext) -> Self {
        let _ = lua.set_app_data(ctx);
        Self { lua }
    }
}

impl Drop for InstalledContext<'_> {
    fn drop(&mut self) {
        let _ = self.lua.remove_app_data::<IterationContext>();
    }
}
