//! Gaussian measurement noise (Box–Muller).
//!
//! Draws come from any [`rand::Rng`] so runs can be seeded for repeatability.

use rand::Rng;
use std::f64::consts::TAU;

/// Uniform draw on (0, 1); exact zeros are rejected so `ln` stays finite.
fn open_uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    loop {
        let u: f64 = rng.gen();
        if u != 0.0 {
            return u;
        }
    }
}

/// Zero-mean Gaussian sample with standard deviation `std_dev`.
///
/// `std_dev <= 0` (or NaN) returns exactly 0 without touching the RNG.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, std_dev: f64) -> f64 {
    if !(std_dev > 0.0) {
        return 0.0;
    }
    let u = open_uniform(rng);
    let v = open_uniform(rng);
    let z = (-2.0 * u.ln()).sqrt() * (TAU * v).cos();
    z * std_dev
}
