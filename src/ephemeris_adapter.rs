// Ephemeris Adapter - Externally propagated bodies (two-line records)
// Wraps the SGP4/SDP4 propagator and normalizes its Earth-centred inertial
// output into the scene convention used by the Keplerian engine.

use log::trace;
use serde::{Deserialize, Serialize};
use sgp4::{Constants, Elements, MinutesSinceEpoch};
use std::f64::consts::TAU;

use crate::config::EphemerisConfig;
use crate::error::OrbitError;
use crate::orbital_engine::Vector3;
use crate::time_converter::{
    greenwich_mean_sidereal_time, julian_date_from_datetime, JulianDate, MINUTES_PER_DAY,
    SECONDS_PER_DAY,
};

// =============================================================================
// EARTH CONSTANTS (WGS-84)
// =============================================================================

pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257223563;
pub const EARTH_MU: f64 = 398600.4418; // km³/s²

// =============================================================================
// TWO-LINE RECORDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TleRecord {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl TleRecord {
    /// Only checks that both lines are present; the propagator owns the format
    pub fn new(name: &str, line1: &str, line2: &str) -> Result<Self, OrbitError> {
        let name = name.trim().to_string();
        for (number, line) in [(1u8, line1), (2u8, line2)] {
            if line.trim().is_empty() {
                return Err(OrbitError::MissingRecordLine { name, line: number });
            }
        }
        Ok(Self {
            name,
            line1: line1.trim().to_string(),
            line2: line2.trim().to_string(),
        })
    }
}

/// Splits name/line1/line2 triplets. Misaligned lines are skipped one at a
/// time until a triplet lines up again.
pub fn parse_tle_text(text: &str) -> Vec<TleRecord> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let mut records = Vec::new();

    let mut i = 0;
    while i + 2 < lines.len() {
        let (name, line1, line2) = (lines[i], lines[i + 1], lines[i + 2]);
        if !line1.starts_with('1') || !line2.starts_with('2') {
            trace!("Skipping misaligned record line: {}", name);
            i += 1;
            continue;
        }
        match TleRecord::new(name, line1, line2) {
            Ok(record) => records.push(record),
            Err(e) => trace!("Rejected record: {}", e),
        }
        i += 3;
    }

    records
}

/// Circular-orbit altitude for a mean motion in revolutions per day
pub fn mean_motion_to_altitude_km(revs_per_day: f64) -> f64 {
    let n = revs_per_day * TAU / SECONDS_PER_DAY; // rad/s
    (EARTH_MU / (n * n)).cbrt() - EARTH_EQUATORIAL_RADIUS_KM
}

// =============================================================================
// PROPAGATION RESULTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64, // [-180, 180]
    pub altitude_km: f64,
}

/// Raw propagator output: Earth-centred inertial frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagatedState {
    /// Scene units, Earth-centred
    pub position: Vector3,
    /// Scene units per second
    pub velocity: Vector3,
    pub geodetic: Geodetic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    InvalidRecord(String),
    Propagator(String),
    /// Below the Earth's surface or numerically broken
    Decayed { radius_km: f64 },
}

/// Per-body, per-instant result; failures hide the body for that instant
#[derive(Debug, Clone, PartialEq)]
pub enum PropagationOutcome {
    Success(PropagatedState),
    Failure(FailureReason),
}

impl PropagationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PropagationOutcome::Success(_))
    }

    pub fn state(self) -> Option<PropagatedState> {
        match self {
            PropagationOutcome::Success(state) => Some(state),
            PropagationOutcome::Failure(_) => None,
        }
    }
}

// =============================================================================
// PROPAGATOR SEAM
// =============================================================================

pub trait EphemerisSource: Send + Sync {
    fn name(&self) -> &str;

    /// Nominal mean motion (revolutions per day)
    fn mean_motion(&self) -> f64;

    fn propagate_eci(&self, time: JulianDate) -> Result<EciState, FailureReason>;

    fn to_geodetic(&self, position_km: &[f64; 3], time: JulianDate) -> Geodetic {
        eci_to_geodetic(position_km, greenwich_mean_sidereal_time(time))
    }
}

/// SGP4/SDP4 via the `sgp4` crate (WGS-72 model constants)
pub struct Sgp4Source {
    record: TleRecord,
    epoch: JulianDate,
    mean_motion: f64,
    constants: Constants,
}

impl Sgp4Source {
    pub fn from_record(record: TleRecord) -> Result<Self, OrbitError> {
        let elements = Elements::from_tle(
            Some(record.name.clone()),
            record.line1.as_bytes(),
            record.line2.as_bytes(),
        )
        .map_err(|e| OrbitError::RecordParse {
            name: record.name.clone(),
            reason: format!("{:?}", e),
        })?;

        let constants = Constants::from_elements(&elements).map_err(|e| OrbitError::RecordParse {
            name: record.name.clone(),
            reason: format!("{:?}", e),
        })?;

        Ok(Self {
            epoch: julian_date_from_datetime(&elements.datetime.and_utc()),
            mean_motion: elements.mean_motion,
            record,
            constants,
        })
    }

    pub fn record(&self) -> &TleRecord {
        &self.record
    }

    pub fn epoch(&self) -> JulianDate {
        self.epoch
    }
}

impl EphemerisSource for Sgp4Source {
    fn name(&self) -> &str {
        &self.record.name
    }

    fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    fn propagate_eci(&self, time: JulianDate) -> Result<EciState, FailureReason> {
        let minutes = time.days_since(self.epoch) * MINUTES_PER_DAY;
        let prediction = self
            .constants
            .propagate(MinutesSinceEpoch(minutes))
            .map_err(|e| FailureReason::Propagator(format!("{:?}", e)))?;
        Ok(EciState {
            position_km: prediction.position,
            velocity_km_s: prediction.velocity,
        })
    }
}

/// Rotate by sidereal angle into the Earth-fixed frame, then solve latitude
/// iteratively on the WGS-84 ellipsoid
pub fn eci_to_geodetic(position_km: &[f64; 3], gmst: f64) -> Geodetic {
    let [x, y, z] = *position_km;
    let a = EARTH_EQUATORIAL_RADIUS_KM;
    let e2 = EARTH_FLATTENING * (2.0 - EARTH_FLATTENING);

    let (sin_g, cos_g) = gmst.sin_cos();
    let x_ecef = x * cos_g + y * sin_g;
    let y_ecef = -x * sin_g + y * cos_g;

    let longitude = y_ecef.atan2(x_ecef);
    let p = (x_ecef * x_ecef + y_ecef * y_ecef).sqrt();
    let mut latitude = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let sin_lat = latitude.sin();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude = (z + e2 * n * sin_lat).atan2(p);
    }

    let (sin_lat, cos_lat) = latitude.sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let altitude_km = if cos_lat.abs() > 1e-10 {
        p / cos_lat - n
    } else {
        z.abs() / sin_lat.abs() - n * (1.0 - e2)
    };

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: longitude.to_degrees(),
        altitude_km,
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ExternalEphemerisAdapter {
    scene_units_per_km: f64,
    path_samples: usize,
}

impl ExternalEphemerisAdapter {
    pub fn new(config: &EphemerisConfig) -> Self {
        Self {
            scene_units_per_km: config.scene_units_per_km,
            path_samples: config.path_samples,
        }
    }

    /// Inertial (x, y, z) -> scene (x, z, -y), then km -> scene units
    pub fn normalize(&self, eci: &[f64; 3]) -> Vector3 {
        Vector3::new(eci[0], eci[2], -eci[1]).scale(self.scene_units_per_km)
    }

    pub fn propagate(&self, source: &dyn EphemerisSource, time: JulianDate) -> PropagationOutcome {
        let eci = match source.propagate_eci(time) {
            Ok(eci) => eci,
            Err(reason) => {
                trace!("{} failed at JD {:.5}: {:?}", source.name(), time.value(), reason);
                return PropagationOutcome::Failure(reason);
            }
        };

        let [x, y, z] = eci.position_km;
        let radius_km = (x * x + y * y + z * z).sqrt();
        let finite = radius_km.is_finite() && eci.velocity_km_s.iter().all(|v| v.is_finite());
        if !finite || radius_km < EARTH_EQUATORIAL_RADIUS_KM {
            trace!("{} decayed at JD {:.5} (r = {} km)", source.name(), time.value(), radius_km);
            return PropagationOutcome::Failure(FailureReason::Decayed { radius_km });
        }

        PropagationOutcome::Success(PropagatedState {
            position: self.normalize(&eci.position_km),
            velocity: self.normalize(&eci.velocity_km_s),
            geodetic: source.to_geodetic(&eci.position_km, time),
        })
    }

    /// Evenly time-spaced samples across one nominal period starting at
    /// `start`; failed instants are dropped
    pub fn generate_path(&self, source: &dyn EphemerisSource, start: JulianDate) -> Vec<Vector3> {
        let mean_motion = source.mean_motion();
        if !(mean_motion > 0.0) || self.path_samples < 2 {
            return Vec::new();
        }
        let period_days = 1.0 / mean_motion;
        let step = period_days / (self.path_samples - 1) as f64;

        (0..self.path_samples)
            .filter_map(|k| {
                self.propagate(source, start.add_days(step * k as f64))
                    .state()
                    .map(|s| s.position)
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
