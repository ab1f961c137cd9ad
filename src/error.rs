//! Error types for the simulation core.
//!
//! None of these are fatal: every variant is returned to the caller, and the
//! state that existed before the failing call is left untouched.

use thiserror::Error;

/// Result type for simulation operations
pub type SimResult<T> = Result<T, SimulationError>;

/// Recoverable errors reported by the simulation core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// A user-entered quantity fell outside its accepted range
    #[error("{quantity} {value} is outside the accepted range [{min}, {max}]")]
    InputOutOfRange {
        quantity: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Regression requested without enough complete ring pairs
    #[error("need at least {required} complete ring measurements, have {available}")]
    InsufficientData { required: usize, available: usize },

    /// Ring numbers and diameters were supplied with different lengths
    #[error("got {rings} ring numbers but {diameters} diameters")]
    SampleLengthMismatch { rings: usize, diameters: usize },

    /// Every sample has the same ring number, so the slope is undefined
    #[error("regression is degenerate: all samples share one ring number")]
    DegenerateRegression,
}

impl SimulationError {
    /// Build an `InputOutOfRange` error
    pub fn out_of_range(quantity: &'static str, value: f64, min: f64, max: f64) -> Self {
        SimulationError::InputOutOfRange {
            quantity,
            value,
            min,
            max,
        }
    }
}
