use std::time::Duration;

use mlua::{Lua, Table};

use crate::Result;

pub(super) fn register(lua: &Lua) -> Result<()> {
    let loader = lua.create_function(|lua, ()| {
        let t = lua.create_table()?;

        // Suspends the calling VU only.
        let sleep = lua.create_async_function(|_lua, seconds: f64| async move {
            if let Ok(d) = Duration::try_from_secs_f64(seconds) {
                tokio::time::sleep(d).await;
            }
            Ok(())
        })?;

        let log = lua.create_function(|_lua, msg: String| {
            tracing::info!(target: "wrkr::script", "{msg}");
            Ok(())
        })?;

        let require: mlua::Function = lua.globals().get("require")?;
        let execution: Table = require.call("wrkr/execution")?;

        t.set("sleep", sleep)?;
        t.set("log", log)?;
        t.set("execution", execution)?;
        Ok::<Table, mlua::Error>(t)
    })?;

    super::preload_set(lua, "wrkr", loader)
}
