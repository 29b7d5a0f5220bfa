//! Crate error type.
//!
//! Input problems surface as [`ScheduleError::InvalidInput`] at model
//! construction. Engines never fail on feasibility (the decoder is
//! feasible by construction); they only fail on configuration or
//! resource problems.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Errors produced by the problem model and the optimization engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Malformed input record (unknown machine type, yield 0, bad priority, ...).
    #[error("invalid input: {0}")]
    InvalidInput(ValidationError),

    /// Capacity pre-check failed: the stage can never be processed.
    #[error("infeasible problem at stage '{stage}': {reason}")]
    InfeasibleProblem {
        /// Stage whose demand cannot be met.
        stage: String,
        /// Human-readable reason.
        reason: String,
    },

    /// Run configuration rejected before the search starts.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The engine aborted (e.g. worker pool could not be created).
    #[error("engine failure after generation {generation}: {message}")]
    EngineFailure {
        /// Last fully completed generation.
        generation: usize,
        /// Underlying cause.
        message: String,
    },
}

impl From<ValidationError> for ScheduleError {
    fn from(err: ValidationError) -> Self {
        ScheduleError::InvalidInput(err)
    }
}
