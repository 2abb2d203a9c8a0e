// Kepler Solver - Eccentric anomaly from mean anomaly
// Newton-Raphson on f(E) = E - e*sin(E) - M with a soft iteration budget

use log::debug;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::time_converter::JulianDate;

pub const DEFAULT_TOLERANCE: f64 = 1e-8;
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Above this eccentricity the iteration starts from π instead of M
const HIGH_ECCENTRICITY_START: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    pub eccentric_anomaly: f64,
    pub iterations: u32,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeplerSolver {
    /// Stop once |ΔE| drops below this (radians)
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl KeplerSolver {
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Eccentric anomaly for any real mean anomaly and 0 <= e < 1.
    /// Never fails: an exhausted budget yields the last estimate.
    pub fn solve(&self, mean_anomaly: f64, eccentricity: f64) -> f64 {
        self.solve_detailed(mean_anomaly, eccentricity)
            .eccentric_anomaly
    }

    pub fn solve_detailed(&self, mean_anomaly: f64, eccentricity: f64) -> KeplerSolution {
        if eccentricity == 0.0 {
            return KeplerSolution {
                eccentric_anomaly: mean_anomaly,
                iterations: 0,
                converged: true,
            };
        }

        // Iterate on M reduced to [0, 2π) and restore the whole turns afterwards
        let reduced = normalize_angle(mean_anomaly);
        let turns = mean_anomaly - reduced;

        let mut e_anom = if eccentricity < HIGH_ECCENTRICITY_START {
            reduced
        } else {
            PI
        };

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.max_iterations {
            let f = e_anom - eccentricity * e_anom.sin() - reduced;
            let f_prime = 1.0 - eccentricity * e_anom.cos();
            let delta = f / f_prime;
            e_anom -= delta;
            iterations += 1;

            if delta.abs() < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            debug!(
                "Kepler solve did not converge: M={:.6} e={:.6} after {} iterations",
                mean_anomaly, eccentricity, iterations
            );
        }

        KeplerSolution {
            eccentric_anomaly: e_anom + turns,
            iterations,
            converged,
        }
    }
}

/// Solve with the default tolerance and iteration budget
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> f64 {
    KeplerSolver::default().solve(mean_anomaly, eccentricity)
}

// =============================================================================
// ANOMALY RELATIONS
// =============================================================================

/// Mean anomaly at `time`, normalized into [0, 2π).
/// A zero period marks a fixed body and always yields 0.
pub fn mean_anomaly_at(
    mean_anomaly_at_epoch: f64,
    period_days: f64,
    epoch: JulianDate,
    time: JulianDate,
) -> f64 {
    if period_days == 0.0 {
        return 0.0;
    }
    let mean_motion = TAU / period_days; // rad/day
    normalize_angle(mean_anomaly_at_epoch + mean_motion * time.days_since(epoch))
}

/// Angle reduced into [0, 2π). `rem_euclid` rounds tiny negative inputs up
/// to exactly 2π, which is folded back to 0.
pub fn normalize_angle(angle: f64) -> f64 {
    let reduced = angle.rem_euclid(TAU);
    if reduced >= TAU {
        0.0
    } else {
        reduced
    }
}

/// Half-angle form, stable as e -> 1 and E -> π
pub fn true_anomaly_from_eccentric(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let half = eccentric_anomaly / 2.0;
    2.0 * ((1.0 + eccentricity).sqrt() * half.sin())
        .atan2((1.0 - eccentricity).sqrt() * half.cos())
}

pub fn radius_from_eccentric(
    semi_major_axis: f64,
    eccentricity: f64,
    eccentric_anomaly: f64,
) -> f64 {
    semi_major_axis * (1.0 - eccentricity * eccentric_anomaly.cos())
}

// =============================================================================
// TESTS
// =============================================================================
