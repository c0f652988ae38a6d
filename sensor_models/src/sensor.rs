//! Range/bearing sensor parameters.

use crate::observation::MeasCov;
use serde::{Deserialize, Serialize};

/// Smallest range standard deviation fed into R (meters).
pub const MIN_RANGE_STD: f64 = 0.1;

/// Smallest bearing standard deviation fed into R (radians).
pub const MIN_BEARING_STD_RAD: f64 = 0.001;

/// Noise characteristics of the observer's range/bearing sensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorParams {
    /// Range noise standard deviation (meters)
    pub range_noise_std: f64,
    /// Bearing noise standard deviation (degrees)
    pub bearing_noise_std: f64,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            range_noise_std: 0.0,
            bearing_noise_std: 0.0,
        }
    }
}

impl SensorParams {
    pub fn new(range_noise_std: f64, bearing_noise_std: f64) -> Self {
        Self {
            range_noise_std,
            bearing_noise_std,
        }
    }

    /// Measurement noise covariance R = diag(σ_r², σ_b²), bearing in radians.
    ///
    /// Both deviations are floored so R stays invertible even for a
    /// noise-free sensor.
    pub fn noise_cov(&self) -> MeasCov {
        let sigma_r = self.range_noise_std.max(MIN_RANGE_STD);
        let sigma_b = self.bearing_noise_std.to_radians().max(MIN_BEARING_STD_RAD);
        MeasCov::new(sigma_r * sigma_r, 0.0, 0.0, sigma_b * sigma_b)
    }
}
