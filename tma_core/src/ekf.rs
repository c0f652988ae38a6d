//! Extended Kalman Filter (EKF) for range/bearing target motion analysis.
//!
//! The motion model is linear (constant velocity); the observation model is
//! not, so the update linearizes h(x) = [range, bearing] with its Jacobian at
//! the predicted state.
//!
//! # Failure policy
//! - `new` / `from_rows` reject malformed inputs.
//! - `predict` fails on a bad `dt` or a non-finite result. Nothing is
//!   committed in that case.
//! - `update` never corrupts the filter: degenerate geometry, a singular
//!   innovation covariance or any non-finite intermediate skips the sample
//!   and leaves the predicted state in place.

use crate::error::{FilterError, FilterResult};
use crate::kf::{ConstantVelocity, MotionModel};
use crate::types::{
    all_finite, KalmanGain, MeasCov, MeasJacobian, MeasVec, Position, StateCov, StateVec,
};
use nalgebra::{Matrix2, SMatrix, Vector2};
use sensor_models::compass::wrap_pi;
use sensor_models::{ObservationModel, RangeBearing};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Below this predicted range the bearing derivative is treated as singular.
pub const MIN_PREDICTED_RANGE: f64 = 0.1;

/// |det(S)| under this is considered singular.
pub const SINGULAR_DET: f64 = 1e-10;

/// Diagonal loading applied to a near-singular S before retrying.
pub const REGULARIZATION: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Update outcome
// ---------------------------------------------------------------------------

/// Why an update was skipped for one sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum SkipReason {
    /// Predicted range below [`MIN_PREDICTED_RANGE`]
    DegenerateGeometry { range: f64 },
    /// S singular even after regularization
    SingularInnovation { det: f64 },
    /// An intermediate matrix had non-finite entries
    NonFinite { stage: &'static str },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DegenerateGeometry { range } => {
                write!(f, "predicted range {range:.4} below {MIN_PREDICTED_RANGE}")
            }
            SkipReason::SingularInnovation { det } => {
                write!(f, "innovation covariance singular (det={det:e})")
            }
            SkipReason::NonFinite { stage } => write!(f, "non-finite {stage}"),
        }
    }
}

/// Result of a successful EKF update, exposed for diagnostics.
#[derive(Clone, Debug)]
pub struct KfUpdateResult {
    pub state: StateVec,
    pub cov: StateCov,
    /// Innovation ν = z − h(x), bearing component in radians
    pub innovation: MeasVec,
    /// Innovation covariance S = H·P·Hᵀ + R
    pub innovation_cov: MeasCov,
    /// Kalman gain K
    pub kalman_gain: KalmanGain,
    /// True when S needed diagonal loading to be inverted
    pub regularized: bool,
}

/// What happened to one measurement.
#[derive(Clone, Debug)]
pub enum UpdateOutcome {
    Applied(KfUpdateResult),
    Skipped(SkipReason),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            UpdateOutcome::Applied(_) => None,
            UpdateOutcome::Skipped(reason) => Some(*reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Innovation ν = z − h(x) with the bearing residual wrapped into (−π, π].
/// `z` and `hx` are [range, bearing(rad)].
pub fn innovation(z: &MeasVec, hx: &MeasVec) -> MeasVec {
    Vector2::new(z[0] - hx[0], wrap_pi(z[1] - hx[1]))
}

/// Closed-form 2×2 inverse with one regularization retry.
/// Returns the inverse and whether regularization was applied.
pub fn invert_innovation_cov(s: &MeasCov) -> Result<(MeasCov, bool), SkipReason> {
    let det = |m: &MeasCov| m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];

    let mut m = *s;
    let mut d = det(&m);
    let mut regularized = false;
    if d.abs() < SINGULAR_DET {
        m[(0, 0)] += REGULARIZATION;
        m[(1, 1)] += REGULARIZATION;
        d = det(&m);
        if d.abs() < SINGULAR_DET {
            return Err(SkipReason::SingularInnovation { det: d });
        }
        regularized = true;
    }

    let inv = Matrix2::new(m[(1, 1)], -m[(0, 1)], -m[(1, 0)], m[(0, 0)]) / d;
    if !all_finite(&inv) {
        return Err(SkipReason::NonFinite {
            stage: "innovation inverse",
        });
    }
    Ok((inv, regularized))
}

fn check_finite<const R: usize, const C: usize>(
    m: &SMatrix<f64, R, C>,
    stage: &'static str,
) -> Result<(), SkipReason> {
    if all_finite(m) {
        Ok(())
    } else {
        Err(SkipReason::NonFinite { stage })
    }
}

fn matrix_from_rows<const R: usize, const C: usize>(
    name: &'static str,
    rows: &[Vec<f64>],
) -> FilterResult<SMatrix<f64, R, C>> {
    let invalid = |reason: String| FilterError::InvalidMatrix { name, reason };

    if rows.is_empty() || rows[0].is_empty() {
        return Err(invalid("matrix is empty".into()));
    }
    let width = rows[0].len();
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(invalid(format!(
            "row {i} has {} columns, expected {width}",
            rows[i].len()
        )));
    }
    if rows.len() != R || width != C {
        return Err(invalid(format!(
            "shape {}x{width}, expected {R}x{C}",
            rows.len()
        )));
    }
    if let Some((i, j)) = rows.iter().enumerate().find_map(|(i, row)| {
        row.iter()
            .position(|v| !v.is_finite())
            .map(|j| (i, j))
    }) {
        return Err(invalid(format!("entry ({i}, {j}) is not finite")));
    }
    Ok(SMatrix::from_fn(|r, c| rows[r][c]))
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Range/bearing EKF over a constant-velocity contact.
#[derive(Clone, Debug)]
pub struct ExtendedKalmanFilter {
    state: StateVec,
    cov: StateCov,
    /// Measurement noise covariance R (range m², bearing rad²)
    r: MeasCov,
    cv: ConstantVelocity,
}

impl ExtendedKalmanFilter {
    /// Build a filter from typed inputs, rejecting non-finite entries.
    pub fn new(
        initial_state: StateVec,
        initial_cov: StateCov,
        q: StateCov,
        r: MeasCov,
    ) -> FilterResult<Self> {
        if !all_finite(&initial_state) {
            return Err(FilterError::InvalidInitialState(
                initial_state.iter().copied().collect(),
            ));
        }
        for (name, ok) in [
            ("initial covariance", all_finite(&initial_cov)),
            ("process noise", all_finite(&q)),
            ("measurement noise", all_finite(&r)),
        ] {
            if !ok {
                return Err(FilterError::InvalidMatrix {
                    name,
                    reason: "contains non-finite entries".into(),
                });
            }
        }
        Ok(Self {
            state: initial_state,
            cov: initial_cov,
            r,
            cv: ConstantVelocity::new(q),
        })
    }

    /// Build a filter from untyped row data as supplied by an external caller.
    pub fn from_rows(
        initial_state: &[f64],
        initial_cov: &[Vec<f64>],
        q: &[Vec<f64>],
        r: &[Vec<f64>],
    ) -> FilterResult<Self> {
        if initial_state.len() != 4 || !initial_state.iter().all(|v| v.is_finite()) {
            return Err(FilterError::InvalidInitialState(initial_state.to_vec()));
        }
        Self::new(
            StateVec::from_column_slice(initial_state),
            matrix_from_rows("initial covariance", initial_cov)?,
            matrix_from_rows("process noise", q)?,
            matrix_from_rows("measurement noise", r)?,
        )
    }

    /// Propagate the estimate forward by `dt` seconds.
    pub fn predict(&mut self, dt: f64) -> FilterResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FilterError::InvalidTimeStep(dt));
        }
        let (state, cov) = self.cv.predict(&self.state, &self.cov, dt);
        if !all_finite(&state) {
            return Err(FilterError::PredictionDiverged { what: "state" });
        }
        if !all_finite(&cov) {
            return Err(FilterError::PredictionDiverged { what: "covariance" });
        }
        self.state = state;
        self.cov = cov;
        Ok(())
    }

    /// Fold in one measurement `[range, bearing(deg)]` taken from `observer`.
    ///
    /// Invalid inputs are errors; numerical trouble is a skipped update.
    pub fn update(
        &mut self,
        measurement: [f64; 2],
        observer: Position,
    ) -> FilterResult<UpdateOutcome> {
        let [range, bearing] = measurement;
        if !range.is_finite() || !bearing.is_finite() {
            return Err(FilterError::InvalidMeasurement { range, bearing });
        }
        if !observer.is_finite() {
            return Err(FilterError::InvalidObserverPosition {
                x: observer.x,
                y: observer.y,
            });
        }

        let z = Vector2::new(range, bearing.to_radians());
        match self.compute_update(&z, observer) {
            Ok(res) => {
                self.state = res.state;
                self.cov = res.cov;
                Ok(UpdateOutcome::Applied(res))
            }
            Err(reason) => {
                debug!(%reason, "skipping EKF update");
                Ok(UpdateOutcome::Skipped(reason))
            }
        }
    }

    /// Compute the posterior without committing it.
    /// `z` is [range, bearing(rad)].
    pub fn compute_update(
        &self,
        z: &MeasVec,
        observer: Position,
    ) -> Result<KfUpdateResult, SkipReason> {
        let model = RangeBearing::new(observer.as_array());

        let predicted_range = model.range(&self.state);
        if predicted_range < MIN_PREDICTED_RANGE {
            return Err(SkipReason::DegenerateGeometry {
                range: predicted_range,
            });
        }

        let hx = model.apply(&self.state);
        let h: MeasJacobian = model.jacobian(&self.state);
        check_finite(&h, "jacobian")?;

        // Innovation: ν = z − h(x)
        let innovation = innovation(z, &hx);
        check_finite(&innovation, "innovation")?;

        // Innovation covariance: S = H·P·Hᵀ + R
        let ph_t = self.cov * h.transpose();
        let s = h * ph_t + self.r;
        check_finite(&s, "innovation covariance")?;
        let (s_inv, regularized) = invert_innovation_cov(&s)?;

        // Kalman gain: K = P·Hᵀ·S⁻¹
        let k: KalmanGain = ph_t * s_inv;
        check_finite(&k, "kalman gain")?;

        // Updated state: x' = x + K·ν
        let state = self.state + k * innovation;
        check_finite(&state, "state")?;

        // Updated covariance: P' = (I − K·H)·P
        let cov = (StateCov::identity() - k * h) * self.cov;
        check_finite(&cov, "covariance")?;

        Ok(KfUpdateResult {
            state,
            cov,
            innovation,
            innovation_cov: s,
            kalman_gain: k,
            regularized,
        })
    }

    /// Flattened estimate [px, py, vx, vy].
    ///
    /// A non-finite entry means "no estimate for this step"; callers must
    /// drop it rather than display it.
    pub fn state(&self) -> [f64; 4] {
        if !all_finite(&self.state) {
            warn!(state = ?self.state.as_slice(), "filter state contains non-finite values");
        }
        [self.state[0], self.state[1], self.state[2], self.state[3]]
    }

    pub fn state_vec(&self) -> &StateVec {
        &self.state
    }

    pub fn covariance(&self) -> &StateCov {
        &self.cov
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
