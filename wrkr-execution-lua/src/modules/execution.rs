use mlua::{Lua, LuaSerdeExt, Table};
use wrkr_execution::{IterationContext, scenario_stats, test_stats, vu_stats};

use crate::Result;

pub(super) fn register(lua: &Lua) -> Result<()> {
    let loader = lua.create_function(|lua, ()| {
        let t = lua.create_table()?;

        let vu = lua.create_function(|lua, ()| {
            let stats = {
                let ctx = lua.app_data_ref::<IterationContext>();
                vu_stats(ctx.as_deref()).map_err(mlua::Error::external)?
            };
            lua.to_value(&stats)
        })?;

        let scenario = lua.create_function(|lua, ()| {
            let stats = {
                let ctx = lua.app_data_ref::<IterationContext>();
                scenario_stats(ctx.as_deref()).map_err(mlua::Error::external)?
            };
            lua.to_value(&stats)
        })?;

        let test = lua.create_function(|lua, ()| {
            let stats = {
                let ctx = lua.app_data_ref::<IterationContext>();
                test_stats(ctx.as_deref()).map_err(mlua::Error::external)?
            };
            lua.to_value(&stats)
        })?;

        t.set("vu_stats", vu)?;
        t.set("scenario_stats", scenario)?;
        t.set("test_stats", test)?;
        Ok::<Table, mlua::Error>(t)
    })?;

    super::preload_set(lua, "wrkr/execution", loader)
}
