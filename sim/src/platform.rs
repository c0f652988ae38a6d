//! Platform kinematics: observer and contact motion.
//!
//! Each platform holds a position, a constant speed and a base compass
//! course. A [`MotionProfile`] decides the course actually steered at time
//! `t`; position is integrated in straight segments along it.

use sensor_models::compass;
use serde::{Deserialize, Serialize};
use tma_core::types::Position;

/// Turn rate used when a maneuver is given a non-positive rate (deg/s).
pub const DEFAULT_TURN_RATE: f64 = 1.0;

/// A linear course ramp over an explicit time window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Maneuver {
    /// Simulation time the ramp begins (s)
    pub start_time: f64,
    /// Course at `start_time` (degrees)
    pub start_course: f64,
    /// Course at the end of the ramp (degrees)
    pub end_course: f64,
    /// Turn rate (deg/s), always > 0
    pub rate_of_change: f64,
}

impl Maneuver {
    pub fn new(start_time: f64, start_course: f64, end_course: f64, rate_of_change: f64) -> Self {
        Self {
            start_time,
            start_course,
            end_course,
            rate_of_change,
        }
        .sanitized()
    }

    /// Coerce a non-positive or non-finite turn rate to [`DEFAULT_TURN_RATE`].
    pub fn sanitized(mut self) -> Self {
        if !(self.rate_of_change.is_finite() && self.rate_of_change > 0.0) {
            self.rate_of_change = DEFAULT_TURN_RATE;
        }
        self
    }

    /// Time the ramp reaches `end_course`.
    pub fn end_time(&self) -> f64 {
        self.start_time + (self.end_course - self.start_course).abs() / self.rate_of_change
    }

    /// Course steered at `t`, or `None` outside the (inclusive) ramp window.
    pub fn course_at(&self, t: f64) -> Option<f64> {
        let end = self.end_time();
        if t < self.start_time || t > end {
            return None;
        }
        let span = end - self.start_time;
        if span <= 0.0 {
            return Some(self.start_course);
        }
        let fraction = (t - self.start_time) / span;
        Some(self.start_course + (self.end_course - self.start_course) * fraction)
    }
}

/// How a platform steers over time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum MotionProfile {
    /// Hold the base course throughout.
    #[default]
    ConstantCourse,
    /// Ramp the course inside the maneuver window, base course outside it.
    CourseRamp(Maneuver),
}

impl MotionProfile {
    /// Resolve the steered course at `t` given the platform's base course.
    pub fn course_at(&self, base_course: f64, t: f64) -> f64 {
        match self {
            MotionProfile::ConstantCourse => base_course,
            MotionProfile::CourseRamp(m) => m.course_at(t).unwrap_or(base_course),
        }
    }
}

impl From<Option<Maneuver>> for MotionProfile {
    fn from(maneuver: Option<Maneuver>) -> Self {
        match maneuver {
            Some(m) => MotionProfile::CourseRamp(m.sanitized()),
            None => MotionProfile::ConstantCourse,
        }
    }
}

/// A simulated platform (observer or contact) with ground-truth state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub position: Position,
    /// Speed (units/second)
    pub speed: f64,
    /// Base compass course (degrees)
    pub course: f64,
    pub motion: MotionProfile,
}

impl Platform {
    pub fn new(position: Position, speed: f64, course: f64) -> Self {
        Self {
            position,
            speed,
            course,
            motion: MotionProfile::ConstantCourse,
        }
    }

    pub fn with_motion(mut self, motion: MotionProfile) -> Self {
        self.motion = motion;
        self
    }

    /// Course steered at `t` (degrees, not normalized).
    pub fn course_at(&self, t: f64) -> f64 {
        self.motion.course_at(self.course, t)
    }

    /// Velocity (vx, vy) at `t`.
    pub fn velocity_at(&self, t: f64) -> (f64, f64) {
        compass::velocity(self.speed, self.course_at(t))
    }

    /// Advance the position by `dt` seconds along the course steered at `t`.
    pub fn step(&mut self, t: f64, dt: f64) {
        let (vx, vy) = self.velocity_at(t);
        self.position.x += vx * dt;
        self.position.y += vy * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn non_positive_turn_rate_defaults_to_one() {
        assert_eq!(Maneuver::new(0.0, 0.0, 90.0, 0.0).rate_of_change, 1.0);
        assert_eq!(Maneuver::new(0.0, 0.0, 90.0, -3.0).rate_of_change, 1.0);
        assert_eq!(Maneuver::new(0.0, 0.0, 90.0, f64::NAN).rate_of_change, 1.0);
        assert_eq!(Maneuver::new(0.0, 0.0, 90.0, 2.5).rate_of_change, 2.5);
    }

    #[test]
    fn ramp_interpolates_inside_window_only() {
        // 200° → 290° at 1°/s starting at t=300: window [300, 390]
        let m = Maneuver::new(300.0, 200.0, 290.0, 1.0);
        assert_abs_diff_eq!(m.end_time(), 390.0, epsilon = 1e-9);
        assert_eq!(m.course_at(299.0), None);
        assert_abs_diff_eq!(m.course_at(300.0).unwrap(), 200.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.course_at(345.0).unwrap(), 245.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.course_at(390.0).unwrap(), 290.0, epsilon = 1e-9);
        assert_eq!(m.course_at(390.5), None);

        let profile = MotionProfile::from(Some(m));
        assert_abs_diff_eq!(profile.course_at(180.0, 100.0), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(profile.course_at(180.0, 330.0), 230.0, epsilon = 1e-9);
        assert_abs_diff_eq!(profile.course_at(180.0, 400.0), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn ramp_can_turn_left() {
        let m = Maneuver::new(10.0, 90.0, 0.0, 3.0);
        assert_abs_diff_eq!(m.end_time(), 40.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.course_at(20.0).unwrap(), 60.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_length_ramp_is_instantaneous() {
        let m = Maneuver::new(50.0, 45.0, 45.0, 1.0);
        assert_eq!(m.course_at(50.0), Some(45.0));
        assert_eq!(m.course_at(50.1), None);
    }

    #[test]
    fn step_moves_along_compass_course() {
        let mut p = Platform::new(Position::new(0.0, 0.0), 5.0, 90.0);
        p.step(0.0, 10.0);
        assert_abs_diff_eq!(p.position.x, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.position.y, 0.0, epsilon = 1e-9);

        let mut p = Platform::new(Position::new(0.0, 0.0), 2.0, 0.0);
        p.step(0.0, 3.0);
        assert_abs_diff_eq!(p.position.y, 6.0, epsilon = 1e-9);
    }
}
