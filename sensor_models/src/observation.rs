//! Observation model: h(x) = [range, bearing] and its Jacobian.
//!
//! # Measurement
//! z = [range, bearing] taken from a (moving) observer, bearing in radians on
//! the compass convention (0 = +y, clockwise).
//!
//! # State
//! x = [px, py, vx, vy]ᵀ; the measurement depends on position only, so the
//! velocity columns of H are always zero.

use crate::compass;
use nalgebra::{Matrix2, Matrix2x4, Vector2, Vector4};
use serde::{Deserialize, Serialize};

/// Measurement vector [range, bearing(rad)]
pub type MeasVec = Vector2<f64>;

/// 2×2 measurement / innovation covariance
pub type MeasCov = Matrix2<f64>;

/// 2×4 measurement Jacobian H
pub type MeasJacobian = Matrix2x4<f64>;

/// Trait for a nonlinear observation model linearised per step.
pub trait ObservationModel {
    /// Map state to expected measurement h(x)
    fn apply(&self, state: &Vector4<f64>) -> MeasVec;
    /// Jacobian ∂h/∂x evaluated at `state`
    fn jacobian(&self, state: &Vector4<f64>) -> MeasJacobian;
}

/// Range/bearing observation of a contact from an observer at a known position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeBearing {
    /// Observer position in world frame (x, y)
    pub observer: [f64; 2],
}

impl RangeBearing {
    pub fn new(observer: [f64; 2]) -> Self {
        Self { observer }
    }

    fn offset(&self, state: &Vector4<f64>) -> (f64, f64) {
        (state[0] - self.observer[0], state[1] - self.observer[1])
    }

    /// Range from the observer to the state's position.
    pub fn range(&self, state: &Vector4<f64>) -> f64 {
        let (dx, dy) = self.offset(state);
        (dx * dx + dy * dy).sqrt()
    }
}

impl ObservationModel for RangeBearing {
    fn apply(&self, state: &Vector4<f64>) -> MeasVec {
        let (dx, dy) = self.offset(state);
        Vector2::new((dx * dx + dy * dy).sqrt(), compass::bearing_rad(dx, dy))
    }

    fn jacobian(&self, state: &Vector4<f64>) -> MeasJacobian {
        let (dx, dy) = self.offset(state);
        let r2 = dx * dx + dy * dy;
        let r = r2.sqrt();

        // bearing = atan2(dx, dy)
        // ∂range/∂px = dx/r,    ∂range/∂py = dy/r
        // ∂bearing/∂px = dy/r², ∂bearing/∂py = −dx/r²
        Matrix2x4::new(
            dx / r,   dy / r,   0., 0.,
            dy / r2, -dx / r2,  0., 0.,
        )
    }
}
