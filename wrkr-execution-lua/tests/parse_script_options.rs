mod support;

use std::time::Duration;

use wrkr_execution_lua::{Error, Result};

#[test]
fn parse_script_options_accepts_camel_and_snake_case_aliases() -> Result<()> {
    let script = support::load_test_script("options_aliases.lua")?;
    let opts = wrkr_execution_lua::parse_script_options(&script.text, &script.path)?;

    assert_eq!(opts.vus, Some(3));
    assert_eq!(opts.duration, Some(Duration::from_secs(2)));

    let names: Vec<&str> = opts.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["camel", "snake"]);

    let camel = &opts.scenarios[0];
    assert_eq!(camel.executor.as_deref(), Some("constant-vus"));
    assert_eq!(camel.vus, Some(2));
    assert_eq!(camel.duration, Some(Duration::from_secs(1)));
    assert_eq!(camel.start_time, Some(Duration::from_secs(2)));
    assert_eq!(camel.graceful_stop, Some(Duration::ZERO));

    let snake = &opts.scenarios[1];
    assert_eq!(snake.executor.as_deref(), Some("constant-arrival-rate"));
    assert_eq!(snake.rate, Some(9));
    assert_eq!(snake.time_unit, Some(Duration::from_millis(950)));
    assert_eq!(snake.duration, Some(Duration::from_secs(1)));
    assert_eq!(snake.pre_allocated_vus, Some(2));
    assert_eq!(snake.max_vus, Some(10));
    assert_eq!(snake.graceful_stop, Some(Duration::from_millis(100)));
    Ok(())
}

#[test]
fn parse_script_options_rejects_fractional_vus() -> Result<()> {
    let script = support::load_test_script("options_invalid.lua")?;

    let res = wrkr_execution_lua::parse_script_options(&script.text, &script.path);
    assert!(matches!(res, Err(Error::InvalidCount("vus"))));
    Ok(())
}

#[test]
fn scenario_exec_is_read_verbatim() -> Result<()> {
    let script = support::load_test_script("missing_exec.lua")?;
    let opts = wrkr_execution_lua::parse_script_options(&script.text, &script.path)?;
    assert_eq!(opts.vus, None);
    assert_eq!(opts.scenarios.len(), 1);
    assert_eq!(opts.scenarios[0].exec.as_deref(), Some("Nope"));
    Ok(())
}
