use thiserror::Error;

/// Why a release wait could not be calculated. Never fatal: the sequencer
/// stays armed and retries on the next trigger.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotComputable {
    #[error("rotation period {period_us} us is out of range (turntable stopped or invalid measurement)")]
    PeriodOutOfRange { period_us: u64 },
    #[error("extrapolation did not reach the fall transit time within {steps} rounds")]
    NoConvergence { steps: u32 },
}

#[derive(Debug, Error, Clone)]
pub enum DropperError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing actuator")]
    MissingActuator,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
