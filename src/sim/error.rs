//! Simulation error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Run mode parameters that cannot produce a run (empty ensemble, NaN speed)
    #[error("invalid run mode: {0}")]
    InvalidRunMode(String),

    /// A parameter or intermediate state that is not a finite number
    #[error("degenerate parameter: {0}")]
    DegenerateParameter(String),

    /// Coins still moving after the run time limit
    #[error("run did not settle within {seconds}s of simulated time")]
    Timeout { seconds: f32 },

    #[error("no run in progress")]
    NoActiveRun,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
