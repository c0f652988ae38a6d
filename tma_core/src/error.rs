//! Filter error types.
//!
//! Only conditions that invalidate the whole run are errors. Per-sample
//! degeneracies during `update` are reported as [`crate::ekf::SkipReason`].

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that abort a simulation run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Initial state contains a non-finite component
    #[error("invalid initial state {0:?}: expected four finite numbers")]
    InvalidInitialState(Vec<f64>),

    /// Constructor matrix is empty, ragged, mis-sized or non-finite
    #[error("invalid {name} matrix: {reason}")]
    InvalidMatrix { name: &'static str, reason: String },

    /// `predict` called with a non-finite or non-positive time step
    #[error("invalid time step for prediction: {0}")]
    InvalidTimeStep(f64),

    /// Propagation produced non-finite numbers
    #[error("prediction produced a non-finite {what}")]
    PredictionDiverged { what: &'static str },

    /// Measurement is not a finite [range, bearing] pair
    #[error("invalid measurement: range={range}, bearing={bearing}")]
    InvalidMeasurement { range: f64, bearing: f64 },

    /// Observer position is not finite
    #[error("invalid observer position ({x}, {y})")]
    InvalidObserverPosition { x: f64, y: f64 },
}
