use std::path::Path;

use mlua::Lua;

use crate::Result;

fn normalize_for_lua_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn chunk_name(script_path: &Path) -> String {
    let p = script_path
        .canonicalize()
        .unwrap_or_else(|_| script_path.to_path_buf());
    format!("@{}", normalize_for_lua_path(&p))
}

/// Lets scripts `require` modules that sit next to them.
pub fn configure_module_path(lua: &Lua, script_path: &Path) -> Result<()> {
    let Some(dir) = script_path.parent() else {
        return Ok(());
    };

    let package: mlua::Table = lua.globals().get("package")?;
    let old: String = package.get("path")?;
    let dir = normalize_for_lua_path(dir);
    package.set("path", format!("{dir}/?.lua;{dir}/?/init.lua;{old}"))?;
    Ok(())
}
