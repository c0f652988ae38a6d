//! Fundamental types used across the entire workspace.

use nalgebra::{Matrix4, Matrix4x2, SMatrix, Vector4};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use sensor_models::{MeasCov, MeasJacobian, MeasVec};

// ---------------------------------------------------------------------------
// Scalar type: f64 throughout; every matrix is fixed-size and stack-allocated.
// ---------------------------------------------------------------------------

/// Contact state vector: [px, py, vx, vy]
pub type StateVec = Vector4<f64>;

/// 4×4 state covariance matrix
pub type StateCov = Matrix4<f64>;

/// 4×2 Kalman gain
pub type KalmanGain = Matrix4x2<f64>;

/// True when every entry of a fixed-size matrix is finite.
pub fn all_finite<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> bool {
    m.iter().all(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in the planar Cartesian frame (meters).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// A single range/bearing observation of the contact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Sample time in simulation seconds
    pub time: f64,
    /// Measured range (meters)
    pub range: f64,
    /// Measured compass bearing (degrees)
    pub bearing: f64,
    /// Observer position at the sample time
    pub observer: Position,
}

impl Observation {
    /// Measurement as handed to the filter: [range, bearing(deg)].
    pub fn measurement(&self) -> [f64; 2] {
        [self.range, self.bearing]
    }
}
