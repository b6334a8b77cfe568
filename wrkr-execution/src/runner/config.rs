use std::collections::HashSet;
use std::time::Duration;

use super::error::{Error, Result};
use crate::execution::ExecutionSegment;

pub const DEFAULT_EXEC: &str = "Default";
pub const DEFAULT_SCENARIO: &str = "default";
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(600);

/// Run-level overrides. When set they win over the script's options.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub iterations: Option<u64>,
    pub vus: Option<u64>,
    pub duration: Option<Duration>,
    pub segment: ExecutionSegment,
}

/// Options as declared by a script, before validation.
#[derive(Debug, Clone, Default)]
pub struct ScriptOptions {
    pub vus: Option<u64>,
    pub iterations: Option<u64>,
    pub duration: Option<Duration>,
    pub scenarios: Vec<ScenarioOptions>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioOptions {
    pub name: String,
    pub exec: Option<String>,

    /// Executor name. Defaults to `per-vu-iterations`.
    pub executor: Option<String>,

    pub vus: Option<u64>,
    pub iterations: Option<u64>,
    pub duration: Option<Duration>,
    pub max_duration: Option<Duration>,

    // Arrival rate
    pub rate: Option<u64>,
    pub time_unit: Option<Duration>,
    pub pre_allocated_vus: Option<u64>,
    pub max_vus: Option<u64>,

    pub start_time: Option<Duration>,
    pub graceful_stop: Option<Duration>,
}

/// Executor kind (the string form used by scripts).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum ScenarioExecutorKind {
    #[strum(serialize = "shared-iterations")]
    SharedIterations,

    #[strum(serialize = "per-vu-iterations")]
    PerVuIterations,

    #[strum(serialize = "constant-vus", serialize = "constant")]
    ConstantVus,

    #[strum(serialize = "constant-arrival-rate")]
    ConstantArrivalRate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioExecutor {
    /// `iterations` shared by a fixed pool of `vus`.
    SharedIterations {
        vus: u64,
        iterations: u64,
        max_duration: Duration,
    },

    /// Every one of `vus` runs exactly `iterations`.
    PerVuIterations {
        vus: u64,
        iterations: u64,
        max_duration: Duration,
    },

    /// `vus` loop for `duration`.
    ConstantVus { vus: u64, duration: Duration },

    /// Open model: `rate` iterations started per `time_unit`, on up to `max_vus`.
    ConstantArrivalRate {
        rate: u64,
        time_unit: Duration,
        duration: Duration,
        pre_allocated_vus: u64,
        max_vus: u64,
    },
}

impl ScenarioExecutor {
    pub fn kind(&self) -> ScenarioExecutorKind {
        match self {
            Self::SharedIterations { .. } => ScenarioExecutorKind::SharedIterations,
            Self::PerVuIterations { .. } => ScenarioExecutorKind::PerVuIterations,
            Self::ConstantVus { .. } => ScenarioExecutorKind::ConstantVus,
            Self::ConstantArrivalRate { .. } => ScenarioExecutorKind::ConstantArrivalRate,
        }
    }

    /// Most VUs this executor ever uses at once.
    pub fn max_vus(&self) -> u64 {
        match self {
            Self::SharedIterations { vus, .. }
            | Self::PerVuIterations { vus, .. }
            | Self::ConstantVus { vus, .. } => *vus,
            Self::ConstantArrivalRate { max_vus, .. } => *max_vus,
        }
    }

    /// Time after which no new iteration starts.
    pub fn duration(&self) -> Duration {
        match self {
            Self::SharedIterations { max_duration, .. }
            | Self::PerVuIterations { max_duration, .. } => *max_duration,
            Self::ConstantVus { duration, .. } | Self::ConstantArrivalRate { duration, .. } => {
                *duration
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub name: String,
    pub exec: String,
    pub executor: ScenarioExecutor,
    /// Offset from the run start.
    pub start_time: Duration,
    /// How long running iterations may continue once the scenario stops starting new ones.
    pub graceful_stop: Duration,
}

impl ScenarioConfig {
    /// When (relative to the run start) the scenario releases its last VU, at the latest.
    pub fn end_offset(&self) -> Duration {
        self.start_time
            .saturating_add(self.executor.duration())
            .saturating_add(self.graceful_stop)
    }
}

pub fn scenarios_from_options(opts: ScriptOptions, cfg: &RunConfig) -> Result<Vec<ScenarioConfig>> {
    let cli_overrides_set = cfg.vus.is_some() || cfg.iterations.is_some() || cfg.duration.is_some();

    // Overrides replace the whole run shape with a single default scenario.
    if opts.scenarios.is_empty() || cli_overrides_set {
        let vus = cfg.vus.or(opts.vus).unwrap_or(1);
        let iterations = cfg.iterations.or(opts.iterations);
        let duration = cfg.duration.or(opts.duration);

        let shape = match (iterations, duration) {
            (Some(iterations), _) => ScenarioOptions {
                executor: Some(ScenarioExecutorKind::SharedIterations.to_string()),
                iterations: Some(iterations),
                max_duration: duration,
                ..ScenarioOptions::default()
            },
            (None, Some(duration)) => ScenarioOptions {
                executor: Some(ScenarioExecutorKind::ConstantVus.to_string()),
                duration: Some(duration),
                ..ScenarioOptions::default()
            },
            (None, None) => ScenarioOptions {
                executor: Some(ScenarioExecutorKind::PerVuIterations.to_string()),
                iterations: Some(1),
                ..ScenarioOptions::default()
            },
        };

        return Ok(vec![scenario_from_options(ScenarioOptions {
            name: DEFAULT_SCENARIO.to_string(),
            vus: Some(vus),
            ..shape
        })?]);
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(opts.scenarios.len());
    for s in opts.scenarios {
        if !seen.insert(s.name.clone()) {
            return Err(Error::DuplicateScenario(s.name));
        }
        out.push(scenario_from_options(s)?);
    }
    Ok(out)
}

fn scenario_from_options(s: ScenarioOptions) -> Result<ScenarioConfig> {
    if s.name.is_empty() {
        return Err(Error::InvalidScenarioName);
    }

    let kind: ScenarioExecutorKind = match s.executor.as_deref() {
        Some(name) => name
            .parse()
            .map_err(|_| Error::InvalidExecutor(name.to_string()))?,
        None => ScenarioExecutorKind::PerVuIterations,
    };

    let positive = |v: Option<u64>, default: u64, err: Error| -> Result<u64> {
        match v.unwrap_or(default) {
            0 => Err(err),
            v => Ok(v),
        }
    };
    let non_zero = |d: Option<Duration>, err: Error| -> Result<Duration> {
        match d {
            Some(d) if !d.is_zero() => Ok(d),
            _ => Err(err),
        }
    };

    let executor = match kind {
        ScenarioExecutorKind::SharedIterations => {
            let vus = positive(s.vus, 1, Error::InvalidVus)?;
            let iterations = positive(s.iterations, 1, Error::InvalidIterations)?;
            if iterations < vus {
                return Err(Error::FewerIterationsThanVus { iterations, vus });
            }
            ScenarioExecutor::SharedIterations {
                vus,
                iterations,
                max_duration: non_zero(
                    Some(s.max_duration.unwrap_or(DEFAULT_MAX_DURATION)),
                    Error::InvalidDuration,
                )?,
            }
        }
        ScenarioExecutorKind::PerVuIterations => ScenarioExecutor::PerVuIterations {
            vus: positive(s.vus, 1, Error::InvalidVus)?,
            iterations: positive(s.iterations, 1, Error::InvalidIterations)?,
            max_duration: non_zero(
                Some(s.max_duration.unwrap_or(DEFAULT_MAX_DURATION)),
                Error::InvalidDuration,
            )?,
        },
        ScenarioExecutorKind::ConstantVus => {
            if s.iterations.is_some() {
                return Err(Error::InvalidIterations);
            }
            ScenarioExecutor::ConstantVus {
                vus: positive(s.vus, 1, Error::InvalidVus)?,
                duration: non_zero(s.duration, Error::InvalidDuration)?,
            }
        }
        ScenarioExecutorKind::ConstantArrivalRate => {
            let pre_allocated_vus = positive(s.pre_allocated_vus, 1, Error::InvalidPreAllocatedVus)?;
            let max_vus = s.max_vus.unwrap_or(pre_allocated_vus);
            if max_vus < pre_allocated_vus {
                return Err(Error::InvalidMaxVus);
            }
            let rate = positive(s.rate, 0, Error::InvalidRate)?;
            let time_unit = non_zero(
                Some(s.time_unit.unwrap_or(Duration::from_secs(1))),
                Error::InvalidTimeUnit,
            )?;
            arrival_interval(rate, time_unit).ok_or(Error::RateTooHigh { rate, time_unit })?;
            ScenarioExecutor::ConstantArrivalRate {
                rate,
                time_unit,
                duration: non_zero(s.duration, Error::InvalidDuration)?,
                pre_allocated_vus,
                max_vus,
            }
        }
    };

    Ok(ScenarioConfig {
        exec: s.exec.unwrap_or_else(|| DEFAULT_EXEC.to_string()),
        name: s.name,
        executor,
        start_time: s.start_time.unwrap_or(Duration::ZERO),
        graceful_stop: s.graceful_stop.unwrap_or(DEFAULT_GRACEFUL_STOP),
    })
}

/// Time between two arrival-rate iterations; `None` when it rounds down to zero.
pub(crate) fn arrival_interval(rate: u64, time_unit: Duration) -> Option<Duration> {
    let nanos = time_unit.as_nanos().checked_div(u128::from(rate))?;
    u64::try_from(nanos)
        .ok()
        .filter(|n| *n > 0)
        .map(Duration::from_nanos)
}

/// Peak number of VUs the scenarios need at the same time.
///
/// A scenario holds its VUs from `start_time` until [`ScenarioConfig::end_offset`].
pub fn planned_max_vus(scenarios: &[ScenarioConfig]) -> u64 {
    scenarios
        .iter()
        .map(|at| {
            scenarios
                .iter()
                .filter(|s| s.start_time <= at.start_time && at.start_time < s.end_offset())
                .map(|s| s.executor.max_vus())
                .fold(0u64, u64::saturating_add)
        })
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(name: &str, executor: &str) -> ScenarioOptions {
        ScenarioOptions {
            name: name.to_string(),
            executor: Some(executor.to_string()),
            ..ScenarioOptions::default()
        }
    }

    #[test]
    fn executor_names_parse() {
        assert_eq!(
            "shared-iterations".parse::<ScenarioExecutorKind>().ok(),
            Some(ScenarioExecutorKind::SharedIterations)
        );
        assert_eq!(
            "constant".parse::<ScenarioExecutorKind>().ok(),
            Some(ScenarioExecutorKind::ConstantVus)
        );
        assert!("ramping-vus".parse::<ScenarioExecutorKind>().is_err());
        assert_eq!(
            ScenarioExecutorKind::ConstantArrivalRate.to_string(),
            "constant-arrival-rate"
        );
    }

    #[test]
    fn arrival_rate_requires_rate_and_duration() {
        let mut s = scenario("carr", "constant-arrival-rate");
        s.duration = Some(Duration::from_secs(1));
        let err = scenarios_from_options(
            ScriptOptions {
                scenarios: vec![s.clone()],
                ..ScriptOptions::default()
            },
            &RunConfig::default(),
        );
        assert!(matches!(err, Err(Error::InvalidRate)));

        s.rate = Some(9);
        s.pre_allocated_vus = Some(2);
        s.max_vus = Some(1);
        let err = scenarios_from_options(
            ScriptOptions {
                scenarios: vec![s],
                ..ScriptOptions::default()
            },
            &RunConfig::default(),
        );
        assert!(matches!(err, Err(Error::InvalidMaxVus)));
    }

    #[test]
    fn arrival_rate_interval_must_be_at_least_a_nanosecond() {
        let mut s = scenario("carr", "constant-arrival-rate");
        s.duration = Some(Duration::from_secs(1));
        s.rate = Some(2_000_000_000);
        let err = scenarios_from_options(
            ScriptOptions {
                scenarios: vec![s.clone()],
                ..ScriptOptions::default()
            },
            &RunConfig::default(),
        );
        assert!(matches!(err, Err(Error::RateTooHigh { rate: 2_000_000_000, .. })));

        s.rate = Some(1_000_000_000);
        assert!(
            scenarios_from_options(
                ScriptOptions {
                    scenarios: vec![s],
                    ..ScriptOptions::default()
                },
                &RunConfig::default(),
            )
            .is_ok()
        );

        assert_eq!(
            arrival_interval(9, Duration::from_millis(950)),
            Some(Duration::from_nanos(105_555_555))
        );
        assert_eq!(arrival_interval(0, Duration::from_secs(1)), None);
    }

    #[test]
    fn shared_iterations_need_at_least_one_iteration_per_vu() {
        let mut s = scenario("shared", "shared-iterations");
        s.vus = Some(5);
        s.iterations = Some(3);
        let err = scenarios_from_options(
            ScriptOptions {
                scenarios: vec![s],
                ..ScriptOptions::default()
            },
            &RunConfig::default(),
        );
        assert!(matches!(
            err,
            Err(Error::FewerIterationsThanVus {
                iterations: 3,
                vus: 5
            })
        ));
    }

    #[test]
    fn duplicate_and_unknown_scenarios_are_rejected() {
        let opts = ScriptOptions {
            scenarios: vec![
                scenario("a", "per-vu-iterations"),
                scenario("a", "per-vu-iterations"),
            ],
            ..ScriptOptions::default()
        };
        assert!(matches!(
            scenarios_from_options(opts, &RunConfig::default()),
            Err(Error::DuplicateScenario(name)) if name == "a"
        ));

        let opts = ScriptOptions {
            scenarios: vec![scenario("b", "ramping-vus")],
            ..ScriptOptions::default()
        };
        assert!(matches!(
            scenarios_from_options(opts, &RunConfig::default()),
            Err(Error::InvalidExecutor(name)) if name == "ramping-vus"
        ));
    }

    #[test]
    fn defaults_to_single_per_vu_iteration() {
        let scenarios = scenarios_from_options(ScriptOptions::default(), &RunConfig::default())
            .unwrap_or_else(|err| panic!("expected default scenario: {err}"));
        assert_eq!(scenarios.len(), 1);
        let s = &scenarios[0];
        assert_eq!(s.name, DEFAULT_SCENARIO);
        assert_eq!(s.exec, DEFAULT_EXEC);
        assert_eq!(s.graceful_stop, DEFAULT_GRACEFUL_STOP);
        assert_eq!(
            s.executor,
            ScenarioExecutor::PerVuIterations {
                vus: 1,
                iterations: 1,
                max_duration: DEFAULT_MAX_DURATION,
            }
        );
    }

    #[test]
    fn run_overrides_replace_script_scenarios() {
        let opts = ScriptOptions {
            vus: Some(3),
            scenarios: vec![scenario("ignored", "constant-arrival-rate")],
            ..ScriptOptions::default()
        };
        let cfg = RunConfig {
            iterations: Some(9),
            ..RunConfig::default()
        };

        let scenarios = scenarios_from_options(opts, &cfg)
            .unwrap_or_else(|err| panic!("expected override scenario: {err}"));
        assert_eq!(scenarios.len(), 1);
        assert_eq!(
            scenarios[0].executor,
            ScenarioExecutor::SharedIterations {
                vus: 3,
                iterations: 9,
                max_duration: DEFAULT_MAX_DURATION,
            }
        );
    }

    #[test]
    fn planned_max_vus_sums_overlapping_scenarios_only() {
        let carr = ScenarioConfig {
            name: "carr".to_string(),
            exec: "carr".to_string(),
            executor: ScenarioExecutor::ConstantArrivalRate {
                rate: 9,
                time_unit: Duration::from_millis(950),
                duration: Duration::from_secs(1),
                pre_allocated_vus: 2,
                max_vus: 10,
            },
            start_time: Duration::ZERO,
            graceful_stop: Duration::from_millis(100),
        };
        let cvus = ScenarioConfig {
            name: "cvus".to_string(),
            exec: "cvus".to_string(),
            executor: ScenarioExecutor::ConstantVus {
                vus: 2,
                duration: Duration::from_secs(1),
            },
            start_time: Duration::from_secs(2),
            graceful_stop: Duration::ZERO,
        };
        assert_eq!(planned_max_vus(&[carr.clone(), cvus.clone()]), 10);

        let overlapping = ScenarioConfig {
            start_time: Duration::from_millis(500),
            ..cvus
        };
        assert_eq!(planned_max_vus(&[carr, overlapping]), 12);
        assert_eq!(planned_max_vus(&[]), 0);
    }
}
