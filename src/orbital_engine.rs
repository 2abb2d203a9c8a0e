// Orbital Engine - Keplerian positions and orbit paths
// Turns orbital elements and a Julian Date into scene-space positions, and
// samples one revolution into a closed polyline for the renderer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::error::OrbitError;
use crate::kepler_solver::{
    mean_anomaly_at, radius_from_eccentric, true_anomaly_from_eccentric, KeplerSolver,
};
use crate::time_converter::JulianDate;

// =============================================================================
// 3D VECTOR MATHEMATICS
// =============================================================================

/// Scene-space vector. Y is the visual up-axis (orbital-plane height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn scale(&self, s: f64) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    pub fn add(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    pub fn sub(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn distance(&self, other: &Vector3) -> f64 {
        self.sub(other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

// =============================================================================
// KEPLERIAN ORBITAL ELEMENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    /// Semi-major axis (catalog length units; 0 marks a fixed body)
    pub semi_major_axis: f64,
    /// Eccentricity, 0 <= e < 1
    pub eccentricity: f64,
    /// Inclination (radians)
    pub inclination: f64,
    /// Longitude of ascending node (radians)
    pub longitude_ascending_node: f64,
    /// Argument of perihelion (radians)
    pub argument_perihelion: f64,
    /// Mean anomaly at epoch (radians)
    pub mean_anomaly: f64,
    /// Orbital period (days; 0 marks a fixed body)
    pub period: f64,
    /// Epoch of the mean anomaly (Julian Date)
    #[serde(default = "default_epoch")]
    pub epoch: f64,
}

fn default_epoch() -> f64 {
    JulianDate::J2000.value()
}

impl OrbitalElements {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: f64,
        longitude_ascending_node: f64,
        argument_perihelion: f64,
        mean_anomaly: f64,
        period: f64,
        epoch: JulianDate,
    ) -> Result<Self, OrbitError> {
        let elements = Self {
            semi_major_axis,
            eccentricity,
            inclination,
            longitude_ascending_node,
            argument_perihelion,
            mean_anomaly,
            period,
            epoch: epoch.value(),
        };
        elements.validate()?;
        Ok(elements)
    }

    /// Angles in degrees, as published in most element tables
    #[allow(clippy::too_many_arguments)]
    pub fn from_degrees(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination_deg: f64,
        longitude_ascending_node_deg: f64,
        argument_perihelion_deg: f64,
        mean_anomaly_deg: f64,
        period: f64,
        epoch: JulianDate,
    ) -> Result<Self, OrbitError> {
        Self::new(
            semi_major_axis,
            eccentricity,
            inclination_deg.to_radians(),
            longitude_ascending_node_deg.to_radians(),
            argument_perihelion_deg.to_radians(),
            mean_anomaly_deg.to_radians(),
            period,
            epoch,
        )
    }

    /// Sentinel for a body that does not orbit anything (a = 0, T = 0)
    pub fn fixed() -> Self {
        Self {
            semi_major_axis: 0.0,
            eccentricity: 0.0,
            inclination: 0.0,
            longitude_ascending_node: 0.0,
            argument_perihelion: 0.0,
            mean_anomaly: 0.0,
            period: 0.0,
            epoch: default_epoch(),
        }
    }

    /// Rejects parabolic and hyperbolic eccentricities and half-set sentinels
    pub fn validate(&self) -> Result<(), OrbitError> {
        let scalars = [
            self.semi_major_axis,
            self.eccentricity,
            self.inclination,
            self.longitude_ascending_node,
            self.argument_perihelion,
            self.mean_anomaly,
            self.period,
            self.epoch,
        ];
        if scalars.iter().any(|v| !v.is_finite()) {
            return Err(OrbitError::InvalidElements(
                "all elements must be finite".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(OrbitError::NonEllipticalOrbit(self.eccentricity));
        }
        if self.semi_major_axis < 0.0 || self.period < 0.0 {
            return Err(OrbitError::InvalidElements(format!(
                "negative semi-major axis ({}) or period ({})",
                self.semi_major_axis, self.period
            )));
        }
        if (self.semi_major_axis == 0.0) != (self.period == 0.0) {
            return Err(OrbitError::InvalidElements(format!(
                "semi-major axis {} and period {} must both be zero for a fixed body",
                self.semi_major_axis, self.period
            )));
        }
        Ok(())
    }

    pub fn is_fixed(&self) -> bool {
        self.semi_major_axis == 0.0 && self.period == 0.0
    }

    /// Mean motion (rad/day)
    pub fn mean_motion(&self) -> f64 {
        if self.period == 0.0 {
            0.0
        } else {
            TAU / self.period
        }
    }

    pub fn epoch(&self) -> JulianDate {
        JulianDate(self.epoch)
    }

    pub fn perihelion_distance(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    pub fn aphelion_distance(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.eccentricity)
    }

    /// Conic-section radius at true anomaly ν: a(1-e²)/(1+e·cos ν)
    pub fn radius_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        self.semi_major_axis * (1.0 - e * e) / (1.0 + e * true_anomaly.cos())
    }

    /// Combined perifocal -> ecliptic rotation (ω, then i, then Ω)
    fn rotation(&self) -> PerifocalRotation {
        let cos_omega = self.longitude_ascending_node.cos();
        let sin_omega = self.longitude_ascending_node.sin();
        let cos_w = self.argument_perihelion.cos();
        let sin_w = self.argument_perihelion.sin();
        let cos_i = self.inclination.cos();
        let sin_i = self.inclination.sin();

        PerifocalRotation {
            r11: cos_omega * cos_w - sin_omega * sin_w * cos_i,
            r12: -cos_omega * sin_w - sin_omega * cos_w * cos_i,
            r21: sin_omega * cos_w + cos_omega * sin_w * cos_i,
            r22: -sin_omega * sin_w + cos_omega * cos_w * cos_i,
            r31: sin_w * sin_i,
            r32: cos_w * sin_i,
        }
    }
}

struct PerifocalRotation {
    r11: f64,
    r12: f64,
    r21: f64,
    r22: f64,
    r31: f64,
    r32: f64,
}

impl PerifocalRotation {
    /// Ecliptic (x, y, z) mapped to scene (x, z, -y): orbital-plane height
    /// becomes the visual up-axis and the frame stays right-handed.
    fn to_scene(&self, px: f64, py: f64) -> Vector3 {
        let x = self.r11 * px + self.r12 * py;
        let y = self.r21 * px + self.r22 * py;
        let z = self.r31 * px + self.r32 * py;
        Vector3::new(x, z, -y)
    }
}

// =============================================================================
// POSITION COMPUTATION
// =============================================================================

/// Position and velocity of a Keplerian body in scene space.
/// Velocity is in scene units per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeplerianState {
    pub position: Vector3,
    pub velocity: Vector3,
    pub true_anomaly: f64,
    pub radius: f64, // catalog units, unscaled
}

/// Scene position for true anomaly ν at distance r from the focus
pub fn position(elements: &OrbitalElements, true_anomaly: f64, radius: f64, scale: f64) -> Vector3 {
    let px = radius * true_anomaly.cos();
    let py = radius * true_anomaly.sin();
    elements.rotation().to_scene(px, py).scale(scale)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSampling {
    /// Uniform in true anomaly via the conic radius; no Kepler solve
    #[default]
    TrueAnomaly,
    /// Uniform in time (mean anomaly), solved through Kepler's equation
    Time,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrbitalPositionComputer {
    pub solver: KeplerSolver,
}

impl OrbitalPositionComputer {
    pub fn new(solver: KeplerSolver) -> Self {
        Self { solver }
    }

    /// Position only; the scheduler never needs velocity
    pub fn position_at_time(
        &self,
        elements: &OrbitalElements,
        time: JulianDate,
        scale: f64,
    ) -> Vector3 {
        let (true_anomaly, radius) = self.anomaly_and_radius(elements, time);
        position(elements, true_anomaly, radius, scale)
    }

    /// Mean anomaly -> Kepler solve -> true anomaly and radius
    fn anomaly_and_radius(&self, elements: &OrbitalElements, time: JulianDate) -> (f64, f64) {
        let e = elements.eccentricity;
        let mean_anomaly = mean_anomaly_at(
            elements.mean_anomaly,
            elements.period,
            elements.epoch(),
            time,
        );
        let eccentric_anomaly = self.solver.solve(mean_anomaly, e);
        (
            true_anomaly_from_eccentric(eccentric_anomaly, e),
            radius_from_eccentric(elements.semi_major_axis, e, eccentric_anomaly),
        )
    }

    /// Position plus velocity (scene units per day)
    pub fn state_at_time(
        &self,
        elements: &OrbitalElements,
        time: JulianDate,
        scale: f64,
    ) -> KeplerianState {
        let e = elements.eccentricity;
        let a = elements.semi_major_axis;
        let (true_anomaly, radius) = self.anomaly_and_radius(elements, time);

        let rotation = elements.rotation();
        let cos_nu = true_anomaly.cos();
        let sin_nu = true_anomaly.sin();
        let position = rotation
            .to_scene(radius * cos_nu, radius * sin_nu)
            .scale(scale);

        // sqrt(mu/p) with mu = n²a³ and p = a(1-e²)
        let speed_factor = elements.mean_motion() * a / (1.0 - e * e).sqrt();
        let velocity = rotation
            .to_scene(-speed_factor * sin_nu, speed_factor * (e + cos_nu))
            .scale(scale);

        KeplerianState {
            position,
            velocity,
            true_anomaly,
            radius,
        }
    }

    /// One revolution as `segments + 1` points; the last point repeats the
    /// first exactly. Fixed bodies and zero segments yield an empty path.
    pub fn generate_path(
        &self,
        elements: &OrbitalElements,
        segments: usize,
        scale: f64,
        sampling: PathSampling,
    ) -> Vec<Vector3> {
        if elements.is_fixed() || segments == 0 {
            return Vec::new();
        }

        let mut points = Vec::with_capacity(segments + 1);
        for k in 0..segments {
            let fraction = TAU * k as f64 / segments as f64;
            let (true_anomaly, radius) = match sampling {
                PathSampling::TrueAnomaly => {
                    (fraction, elements.radius_at_true_anomaly(fraction))
                }
                PathSampling::Time => {
                    let e = elements.eccentricity;
                    let eccentric_anomaly = self.solver.solve(fraction, e);
                    (
                        true_anomaly_from_eccentric(eccentric_anomaly, e),
                        radius_from_eccentric(elements.semi_major_axis, e, eccentric_anomaly),
                    )
                }
            };
            points.push(position(elements, true_anomaly, radius, scale));
        }
        points.push(points[0]);
        points
    }
}

// =============================================================================
// ORBIT PATH CACHE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitPath {
    pub points: Vec<Vector3>,
    pub reference_jd: JulianDate,
    /// Elements the path was built from; `None` for externally propagated bodies
    pub elements: Option<OrbitalElements>,
}

/// Per-body path storage. A path is rebuilt when its elements change or
/// after `request_refresh` at the next reference time it is asked for.
#[derive(Debug, Default)]
pub struct OrbitPathCache {
    paths: HashMap<String, OrbitPath>,
    refresh_requested: bool,
}

impl OrbitPathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, body_id: &str) -> Option<&OrbitPath> {
        self.paths.get(body_id)
    }

    pub fn get_or_build<F>(
        &mut self,
        body_id: &str,
        elements: Option<&OrbitalElements>,
        reference_jd: JulianDate,
        build: F,
    ) -> &OrbitPath
    where
        F: FnOnce() -> Vec<Vector3>,
    {
        let refresh = self.refresh_requested;
        let stale = match self.paths.get(body_id) {
            Some(path) => {
                path.elements.as_ref() != elements
                    || (refresh && path.reference_jd != reference_jd)
            }
            None => true,
        };

        if stale {
            self.paths.insert(
                body_id.to_string(),
                OrbitPath {
                    points: build(),
                    reference_jd,
                    elements: elements.copied(),
                },
            );
        }

        &self.paths[body_id]
    }

    /// Paths are rebuilt lazily the next time each body is requested
    pub fn request_refresh(&mut self) {
        self.refresh_requested = true;
    }

    /// Called once per tick after every path for that tick was requested
    pub fn finish_refresh(&mut self) {
        self.refresh_requested = false;
    }

    pub fn invalidate(&mut self, body_id: &str) {
        self.paths.remove(body_id);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn elements(a: f64, e: f64, i: f64, node: f64, peri: f64, m0: f64, period: f64) -> OrbitalElements {
        OrbitalElements::new(a, e, i, node, peri, m0, period, JulianDate::J2000).unwrap()
    }

    fn assert_close(a: Vector3, b: Vector3, tol: f64) {
        assert!(a.distance(&b) < tol, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn test_circular_orbit_at_epoch() {
        let unit = elements(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let computer = OrbitalPositionComputer::default();
        let pos = computer.position_at_time(&unit, JulianDate::J2000, 50.0);
        assert_close(pos, Vector3::new(50.0, 0.0, 0.0), 1e-12);
    }

    #[test]
    fn test_half_period_reaches_aphelion() {
        let orbit = elements(2.0, 0.5, 0.0, 0.0, 0.0, 0.0, 10.0);
        let computer = OrbitalPositionComputer::default();
        let pos = computer.position_at_time(&orbit, JulianDate::J2000.add_days(5.0), 1.0);
        assert!((pos.magnitude() - 3.0).abs() < 1e-6);
        assert!((pos.x + 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_apsides_from_conic_radius() {
        let orbit = elements(4.0, 0.25, 0.3, 1.0, 2.0, 0.0, 100.0);
        assert!((orbit.radius_at_true_anomaly(0.0) - orbit.perihelion_distance()).abs() < 1e-12);
        assert!((orbit.radius_at_true_anomaly(PI) - orbit.aphelion_distance()).abs() < 1e-12);
        assert!((orbit.perihelion_distance() - 3.0).abs() < 1e-12);
        assert!((orbit.aphelion_distance() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_inclination_lifts_into_up_axis() {
        // Ascending node on +x, perihelion 90° past it, 90° inclination:
        // the perihelion sits straight "up" in the scene
        let polar = elements(1.0, 0.0, PI / 2.0, 0.0, PI / 2.0, 0.0, 1.0);
        let pos = position(&polar, 0.0, 1.0, 1.0);
        assert_close(pos, Vector3::new(0.0, 1.0, 0.0), 1e-12);

        // In-plane quarter turn of an uninclined orbit goes to scene -z
        let flat = elements(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let quarter = position(&flat, PI / 2.0, 1.0, 1.0);
        assert_close(quarter, Vector3::new(0.0, 0.0, -1.0), 1e-12);
    }

    #[test]
    fn test_velocity_matches_finite_difference() {
        let orbit = elements(1.5, 0.3, 0.4, 0.7, 1.1, 0.2, 200.0);
        let computer = OrbitalPositionComputer::default();
        let t = JulianDate::J2000.add_days(37.0);
        let h = 1e-4;
        let state = computer.state_at_time(&orbit, t, 2.0);
        let ahead = computer.position_at_time(&orbit, t.add_days(h), 2.0);
        let behind = computer.position_at_time(&orbit, t.add_days(-h), 2.0);
        let numeric = ahead.sub(&behind).scale(1.0 / (2.0 * h));
        assert_close(state.velocity, numeric, 1e-6);
    }

    #[test]
    fn test_position_only_path_agrees_with_full_state() {
        let orbit = elements(5.2, 0.048, 0.02, 1.75, 4.78, 0.35, 4332.6);
        let computer = OrbitalPositionComputer::default();
        for step in 0..50 {
            let t = JulianDate::J2000.add_days(step as f64 * 97.3);
            let state = computer.state_at_time(&orbit, t, 100.0);
            let pos = computer.position_at_time(&orbit, t, 100.0);
            assert_close(pos, state.position, 1e-12);
        }
    }

    #[test]
    fn test_path_is_closed_loop() {
        let orbit = elements(3.0, 0.6, 0.5, 0.2, 1.3, 0.0, 50.0);
        let computer = OrbitalPositionComputer::default();
        for sampling in [PathSampling::TrueAnomaly, PathSampling::Time] {
            let path = computer.generate_path(&orbit, 128, 10.0, sampling);
            assert_eq!(path.len(), 129);
            assert_eq!(path.first(), path.last());
        }
    }

    #[test]
    fn test_path_points_lie_on_the_ellipse() {
        let orbit = elements(2.0, 0.4, 0.0, 0.0, 0.0, 0.0, 50.0);
        let computer = OrbitalPositionComputer::default();
        let path = computer.generate_path(&orbit, 64, 1.0, PathSampling::TrueAnomaly);
        assert!((path[0].magnitude() - orbit.perihelion_distance()).abs() < 1e-12);
        assert!((path[32].magnitude() - orbit.aphelion_distance()).abs() < 1e-12);

        let timed = computer.generate_path(&orbit, 64, 1.0, PathSampling::Time);
        assert!((timed[32].magnitude() - orbit.aphelion_distance()).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_body() {
        let sun = OrbitalElements::fixed();
        assert!(sun.is_fixed());
        let computer = OrbitalPositionComputer::default();
        let pos = computer.position_at_time(&sun, JulianDate::J2000.add_days(1234.5), 100.0);
        assert_eq!(pos, Vector3::zero());
        assert!(computer.generate_path(&sun, 64, 1.0, PathSampling::TrueAnomaly).is_empty());
    }

    #[test]
    fn test_validation_rejects_non_elliptical() {
        let result = OrbitalElements::new(1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, JulianDate::J2000);
        assert_eq!(result, Err(OrbitError::NonEllipticalOrbit(1.0)));
        assert!(OrbitalElements::new(1.0, 1.7, 0.0, 0.0, 0.0, 0.0, 1.0, JulianDate::J2000).is_err());
        assert!(OrbitalElements::new(1.0, 0.1, f64::NAN, 0.0, 0.0, 0.0, 1.0, JulianDate::J2000).is_err());
        // Half a sentinel is not a fixed body
        assert!(OrbitalElements::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0, JulianDate::J2000).is_err());
    }

    #[test]
    fn test_path_cache_rebuilds_on_change_or_refresh() {
        let mut cache = OrbitPathCache::new();
        let orbit = elements(1.0, 0.1, 0.0, 0.0, 0.0, 0.0, 10.0);
        let mut builds = 0;

        cache.get_or_build("ceres", Some(&orbit), JulianDate::J2000, || {
            builds += 1;
            vec![Vector3::zero()]
        });
        cache.get_or_build("ceres", Some(&orbit), JulianDate::J2000.add_days(1.0), || {
            builds += 1;
            vec![Vector3::zero()]
        });
        assert_eq!(builds, 1);

        let changed = elements(1.2, 0.1, 0.0, 0.0, 0.0, 0.0, 10.0);
        cache.get_or_build("ceres", Some(&changed), JulianDate::J2000, || {
            builds += 1;
            vec![Vector3::zero()]
        });
        assert_eq!(builds, 2);

        cache.request_refresh();
        let path = cache.get_or_build("ceres", Some(&changed), JulianDate::J2000.add_days(2.0), || {
            builds += 1;
            vec![Vector3::zero()]
        });
        assert_eq!(path.reference_jd, JulianDate::J2000.add_days(2.0));
        assert_eq!(builds, 3);
        cache.finish_refresh();
        assert_eq!(cache.len(), 1);
    }
}
