use std::path::Path;
use std::time::Duration;

use mlua::{Lua, Table, Value};
use wrkr_execution::runner::{ScenarioOptions, ScriptOptions};

use crate::loader::{chunk_name, configure_module_path};
use crate::modules;
use crate::{Error, Result};

/// Reads the global `options` table of a script.
///
/// The script body runs once in a throwaway Lua state, in the init context.
pub fn parse_script_options(script: &str, script_path: &Path) -> Result<ScriptOptions> {
    let lua = Lua::new();
    configure_module_path(&lua, script_path)?;
    modules::register(&lua)?;
    lua.load(script).set_name(chunk_name(script_path)).exec()?;

    let mut out = ScriptOptions::default();
    let options = match lua.globals().get::<Value>("options")? {
        Value::Table(t) => t,
        _ => return Ok(out),
    };

    out.vus = get_count(&options, &["vus"], Error::InvalidVus)?;
    out.iterations = get_count(&options, &["iterations"], Error::InvalidIterations)?;
    out.duration = get_duration(&options, &["duration"], "options.duration")?;

    let scenarios = match options.get::<Value>("scenarios")? {
        Value::Table(t) => t,
        _ => return Ok(out),
    };

    for pair in scenarios.pairs::<Value, Value>() {
        let (k, v) = pair?;
        let name = match k {
            Value::String(s) => s.to_string_lossy().to_string(),
            _ => continue,
        };
        let t = match v {
            Value::Table(t) => t,
            _ => continue,
        };

        out.scenarios.push(ScenarioOptions {
            name,
            exec: get_string(&t, "exec")?,
            executor: get_string(&t, "executor")?,
            vus: get_count(&t, &["vus"], Error::InvalidCount("vus"))?,
            iterations: get_count(&t, &["iterations"], Error::InvalidCount("iterations"))?,
            duration: get_duration(&t, &["duration"], "options.scenarios[*].duration")?,
            max_duration: get_duration(
                &t,
                &["max_duration", "maxDuration"],
                "options.scenarios[*].max_duration",
            )?,
            rate: get_count(&t, &["rate"], Error::InvalidCount("rate"))?,
            time_unit: get_duration(
                &t,
                &["time_unit", "timeUnit"],
                "options.scenarios[*].time_unit",
            )?,
            pre_allocated_vus: get_count(
                &t,
                &["pre_allocated_vus", "preAllocatedVUs"],
                Error::InvalidCount("pre_allocated_vus"),
            )?,
            max_vus: get_count(
                &t,
                &["max_vus", "maxVUs"],
                Error::InvalidCount("max_vus"),
            )?,
            start_time: get_duration(
                &t,
                &["start_time", "startTime"],
                "options.scenarios[*].start_time",
            )?,
            graceful_stop: get_duration(
                &t,
                &["graceful_stop", "gracefulStop"],
                "options.scenarios[*].graceful_stop",
            )?,
        });
    }

    // Lua table order is unspecified.
    out.scenarios.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// First non-nil value among `keys` (snake_case first, then aliases).
fn get_any(t: &Table, keys: &[&str]) -> Result<Option<Value>> {
    for key in keys {
        match t.get::<Value>(*key)? {
            Value::Nil => continue,
            v => return Ok(Some(v)),
        }
    }
    Ok(None)
}

fn get_count(t: &Table, keys: &[&str], err: Error) -> Result<Option<u64>> {
    match get_any(t, keys)? {
        None => Ok(None),
        Some(Value::Integer(i)) if i > 0 => Ok(Some(i as u64)),
        Some(Value::Number(n)) if n.fract() == 0.0 && n > 0.0 => Ok(Some(n as u64)),
        Some(_) => Err(err),
    }
}

fn get_duration(t: &Table, keys: &[&str], what: &'static str) -> Result<Option<Duration>> {
    let seconds = |n: f64| Duration::try_from_secs_f64(n).map_err(|_| Error::InvalidDuration(what));

    match get_any(t, keys)? {
        None => Ok(None),
        Some(Value::Integer(i)) if i >= 0 => Ok(Some(Duration::from_secs(i as u64))),
        Some(Value::Number(n)) => seconds(n).map(Some),
        Some(Value::String(s)) => humantime::parse_duration(&s.to_string_lossy())
            .map(Some)
            .map_err(|_| Error::InvalidDuration(what)),
        Some(_) => Err(Error::InvalidDuration(what)),
    }
}

fn get_string(t: &Table, key: &'static str) -> Result<Option<String>> {
    match t.get::<Value>(key)? {
        Value::Nil => Ok(None),
        Value::String(s) => Ok(Some(s.to_string_lossy().to_string())),
        _ => Err(Error::InvalidString(key)),
    }
}
