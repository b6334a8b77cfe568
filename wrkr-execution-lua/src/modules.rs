use mlua::{Lua, Table};

use crate::Result;

mod execution;
mod wrkr;

fn preload_set(lua: &Lua, name: &str, loader: mlua::Function) -> Result<()> {
    let package: Table = lua.globals().get("package")?;
    let preload: Table = package.get("preload")?;
    preload.set(name, loader)?;
    Ok(())
}

/// Makes the `wrkr` modules available to `require`.
pub fn register(lua: &Lua) -> Result<()> {
    execution::register(lua)?;
    wrkr::register(lua)?;
    Ok(())
}
