//! TMA solution: target course/speed and closest point of approach.
//!
//! For two constant-velocity tracks with relative position p and relative
//! velocity v, separation is minimised at
//!
//!   TCPA = −(p·v) / |v|²,   CPA = |p + v·TCPA|
//!
//! Negative TCPA means the closest approach is already behind us.

use crate::types::{Position, StateVec};
use nalgebra::Vector2;
use sensor_models::compass;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Below this squared relative speed the tracks are treated as co-moving.
pub const MIN_RELATIVE_SPEED_SQ: f64 = 0.001;

/// Time to closest point of approach.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tcpa {
    /// Seconds from the final sample (negative: already passed)
    At(f64),
    /// Co-moving tracks; separation never changes
    Infinite,
}

impl Tcpa {
    /// TCPA in seconds, `f64::INFINITY` for co-moving tracks.
    pub fn seconds(&self) -> f64 {
        match self {
            Tcpa::At(t) => *t,
            Tcpa::Infinite => f64::INFINITY,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Tcpa::At(_))
    }
}

impl fmt::Display for Tcpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tcpa::At(t) => write!(f, "{t:.1} s"),
            Tcpa::Infinite => f.write_str("infinite"),
        }
    }
}

/// Derived tactical picture at the final sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TmaSolution {
    /// Target course (degrees, [0, 360))
    pub target_course: f64,
    /// Target speed (units/second)
    pub target_speed: f64,
    /// Closest point of approach (distance)
    pub cpa: f64,
    /// Time to CPA
    pub tcpa: Tcpa,
}

impl fmt::Display for TmaSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "course {:.1}°, speed {:.2}, CPA {:.1}, TCPA {}",
            self.target_course, self.target_speed, self.cpa, self.tcpa
        )
    }
}

/// CPA distance and TCPA for relative position `rel_pos` and velocity `rel_vel`.
pub fn closest_approach(rel_pos: Vector2<f64>, rel_vel: Vector2<f64>) -> (f64, Tcpa) {
    let rel_speed_sq = rel_vel.norm_squared();
    if rel_speed_sq > MIN_RELATIVE_SPEED_SQ {
        let tcpa = -rel_pos.dot(&rel_vel) / rel_speed_sq;
        ((rel_pos + rel_vel * tcpa).norm(), Tcpa::At(tcpa))
    } else {
        (rel_pos.norm(), Tcpa::Infinite)
    }
}

/// Solve for target course/speed and CPA/TCPA from a contact estimate.
///
/// `observer_velocity` is (vx, vy) on the compass frame.
pub fn solve(state: &StateVec, observer: Position, observer_velocity: (f64, f64)) -> TmaSolution {
    let (vx, vy) = (state[2], state[3]);
    let rel_pos = Vector2::new(state[0] - observer.x, state[1] - observer.y);
    let rel_vel = Vector2::new(vx - observer_velocity.0, vy - observer_velocity.1);
    let (cpa, tcpa) = closest_approach(rel_pos, rel_vel);

    TmaSolution {
        target_course: compass::course_deg(vx, vy),
        target_speed: vx.hypot(vy),
        cpa,
        tcpa,
    }
}
