//! Compass conventions shared by the simulator and the estimator.
//!
//! Angles are compass angles: 0° points along +y and increases clockwise, so
//! a heading θ maps to the unit vector (sin θ, cos θ). Every surfaced angle is
//! normalized to [0, 360).

use std::f64::consts::{PI, TAU};

/// Normalize an angle in degrees to [0, 360).
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Normalize an angle in radians to [0, 2π).
pub fn normalize_radians(rad: f64) -> f64 {
    let r = rad.rem_euclid(TAU);
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Wrap an angle difference in radians into (−π, π].
pub fn wrap_pi(rad: f64) -> f64 {
    let w = (rad + PI).rem_euclid(TAU) - PI;
    if w <= -PI {
        w + TAU
    } else {
        w
    }
}

/// Compass bearing (radians, [0, 2π)) of the offset (dx, dy).
pub fn bearing_rad(dx: f64, dy: f64) -> f64 {
    normalize_radians(dx.atan2(dy))
}

/// Compass bearing (degrees, [0, 360)) of the offset (dx, dy).
pub fn bearing_deg(dx: f64, dy: f64) -> f64 {
    normalize_degrees(dx.atan2(dy).to_degrees())
}

/// Velocity (vx, vy) of a platform moving at `speed` on compass `course_deg`.
pub fn velocity(speed: f64, course_deg: f64) -> (f64, f64) {
    let c = course_deg.to_radians();
    (speed * c.sin(), speed * c.cos())
}

/// Course over ground (degrees, [0, 360)) of a velocity vector.
pub fn course_deg(vx: f64, vy: f64) -> f64 {
    bearing_deg(vx, vy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn compass_axes() {
        assert_abs_diff_eq!(bearing_deg(0.0, 1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(1.0, 0.0), 90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(0.0, -1.0), 180.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bearing_deg(-1.0, 0.0), 270.0, epsilon = 1e-12);
    }

    #[test]
    fn velocity_follows_course() {
        let (vx, vy) = velocity(8.0, 225.0);
        assert_abs_diff_eq!(vx, -8.0 / 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(vy, -8.0 / 2f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(course_deg(vx, vy), 225.0, epsilon = 1e-9);
    }

    #[test]
    fn normalization_ranges() {
        assert_abs_diff_eq!(normalize_degrees(-1.0), 359.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_degrees(725.0), 5.0, epsilon = 1e-12);
        assert!(normalize_degrees(-1e-18) < 360.0);
        assert_abs_diff_eq!(wrap_pi(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_pi(-PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn wraparound_residual_is_short_way() {
        let residual = wrap_pi(1f64.to_radians() - 359f64.to_radians());
        assert_abs_diff_eq!(residual.to_degrees(), 2.0, epsilon = 1e-9);
    }
}
