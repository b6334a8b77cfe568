use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("virtual user error: {0}")]
    Vu(String),

    #[error("VU pool exhausted while starting scenario `{0}`")]
    PoolExhausted(String),

    #[error("scenario names must be non-empty")]
    InvalidScenarioName,

    #[error("duplicate scenario `{0}`")]
    DuplicateScenario(String),

    #[error(
        "invalid executor `{0}` (expected `shared-iterations`, `per-vu-iterations`, `constant-vus`, or `constant-arrival-rate`)"
    )]
    InvalidExecutor(String),

    #[error("`vus` must be a positive integer")]
    InvalidVus,

    #[error("`iterations` must be a positive integer")]
    InvalidIterations,

    #[error("`iterations` ({iterations}) must be >= `vus` ({vus})")]
    FewerIterationsThanVus { iterations: u64, vus: u64 },

    #[error("`duration` must be a positive duration")]
    InvalidDuration,

    #[error("`rate` must be a positive integer")]
    InvalidRate,

    #[error("`rate` {rate} per {time_unit:?} leaves less than 1ns between iterations")]
    RateTooHigh { rate: u64, time_unit: Duration },

    #[error("`time_unit` must be a positive duration")]
    InvalidTimeUnit,

    #[error("`pre_allocated_vus` must be a positive integer")]
    InvalidPreAllocatedVus,

    #[error("`max_vus` must be >= `pre_allocated_vus`")]
    InvalidMaxVus,
}
