// Engine Configuration - Ceilings, scales and feed settings
// Defaults, optional JSON file, then ORRERY_* environment overrides (.env honoured).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::OrbitError;
use crate::kepler_solver::KeplerSolver;
use crate::orbital_engine::PathSampling;

/// Earth's mean radius; satellite positions are expressed in Earth radii
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const DEFAULT_FEED_URL: &str =
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=stations&FORMAT=tle";

// =============================================================================
// SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Bodies propagated and drawn as points per tick
    pub max_point_bodies: usize,
    /// Bodies that also get a full orbit path per tick
    pub max_path_bodies: usize,
    /// Shared snapshot is written once every this many ticks
    pub publish_every_ticks: u64,
    pub path_segments: usize,
    pub path_sampling: PathSampling,
    /// Scene length of one catalog unit for heliocentric bodies (AU)
    pub scene_units_per_au: f64,
    pub solver: KeplerSolver,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_point_bodies: 2000,
            max_path_bodies: 200,
            publish_every_ticks: 60,
            path_segments: 256,
            path_sampling: PathSampling::TrueAnomaly,
            scene_units_per_au: 100.0,
            solver: KeplerSolver::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Rendered radius per km of physical radius (exaggerated)
    pub visual_units_per_km: f64,
    /// Clearance as a multiple of the parent's visual radius
    pub clearance_factor: f64,
    pub ringed_clearance_factor: f64,
    /// Width of the band children are spread over, in parent visual radii
    pub spread_factor: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            visual_units_per_km: 1e-5,
            clearance_factor: 1.5,
            ringed_clearance_factor: 2.5,
            spread_factor: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    /// Scene length of one km for externally propagated bodies
    pub scene_units_per_km: f64,
    /// Time samples per nominal revolution for satellite paths
    pub path_samples: usize,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        Self {
            scene_units_per_km: 1.0 / EARTH_RADIUS_KM,
            path_samples: 180,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

// =============================================================================
// ENGINE CONFIG
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduler: SchedulerConfig,
    pub placement: PlacementConfig,
    pub ephemeris: EphemerisConfig,
    pub feed: FeedConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, OrbitError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| OrbitError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self, OrbitError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `ORRERY_CONFIG` names a JSON file applied before individual overrides
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OrbitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("ORRERY_CONFIG") {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .map_err(|e| OrbitError::Config(format!("cannot read {}: {}", path, e)))?;
                serde_json::from_str(&json).map_err(|e| OrbitError::Config(e.to_string()))?
            }
            None => EngineConfig::default(),
        };

        if let Some(v) = parse_var(&lookup, "ORRERY_MAX_POINT_BODIES")? {
            config.scheduler.max_point_bodies = v;
        }
        if let Some(v) = parse_var(&lookup, "ORRERY_MAX_PATH_BODIES")? {
            config.scheduler.max_path_bodies = v;
        }
        if let Some(v) = parse_var(&lookup, "ORRERY_PUBLISH_EVERY_TICKS")? {
            config.scheduler.publish_every_ticks = v;
        }
        if let Some(v) = parse_var(&lookup, "ORRERY_PATH_SEGMENTS")? {
            config.scheduler.path_segments = v;
        }
        if let Some(v) = parse_var(&lookup, "ORRERY_SCENE_UNITS_PER_AU")? {
            config.scheduler.scene_units_per_au = v;
        }
        if let Some(v) = parse_var(&lookup, "ORRERY_SATELLITE_PATH_SAMPLES")? {
            config.ephemeris.path_samples = v;
        }
        if let Some(url) = lookup("ORRERY_FEED_URL") {
            config.feed.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OrbitError> {
        let s = &self.scheduler;
        if s.max_point_bodies == 0 || s.max_path_bodies == 0 {
            return Err(OrbitError::Config("body ceilings must be positive".to_string()));
        }
        if s.max_path_bodies > s.max_point_bodies {
            return Err(OrbitError::Config(format!(
                "path ceiling {} exceeds point ceiling {}",
                s.max_path_bodies, s.max_point_bodies
            )));
        }
        if s.publish_every_ticks == 0 {
            return Err(OrbitError::Config("publish cadence must be at least 1 tick".to_string()));
        }
        if s.path_segments < 3 || self.ephemeris.path_samples < 3 {
            return Err(OrbitError::Config("paths need at least 3 samples".to_string()));
        }
        let scales = [
            s.scene_units_per_au,
            self.ephemeris.scene_units_per_km,
            self.placement.visual_units_per_km,
            self.placement.clearance_factor,
            self.placement.ringed_clearance_factor,
        ];
        if scales.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(OrbitError::Config("scales and factors must be positive".to_string()));
        }
        if !(self.placement.spread_factor.is_finite() && self.placement.spread_factor >= 0.0) {
            return Err(OrbitError::Config("spread factor must be non-negative".to_string()));
        }
        if !(s.solver.tolerance > 0.0) || s.solver.max_iterations == 0 {
            return Err(OrbitError::Config("invalid Kepler solver budget".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, OrbitError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| OrbitError::Config(format!("{}={}: {}", key, raw, e))),
        None => Ok(None),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert!(config.scheduler.max_point_bodies >= 10 * config.scheduler.max_path_bodies);
        assert_eq!(config.scheduler.publish_every_ticks, 60);
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("ORRERY_MAX_POINT_BODIES", "500"),
            ("ORRERY_MAX_PATH_BODIES", "50"),
            ("ORRERY_FEED_URL", "https://example.invalid/tle"),
        ]))
        .unwrap();
        assert_eq!(config.scheduler.max_point_bodies, 500);
        assert_eq!(config.scheduler.max_path_bodies, 50);
        assert_eq!(config.feed.url, "https://example.invalid/tle");
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = EngineConfig::from_lookup(lookup_from(&[("ORRERY_PATH_SEGMENTS", "many")]))
            .unwrap_err();
        assert!(matches!(err, OrbitError::Config(_)));

        let err = EngineConfig::from_lookup(lookup_from(&[("ORRERY_MAX_PATH_BODIES", "5000")]))
            .unwrap_err();
        assert!(matches!(err, OrbitError::Config(_)));
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json_str(
            r#"{"scheduler": {"publish_every_ticks": 30, "path_sampling": "time"}}"#,
        )
        .unwrap();
        assert_eq!(config.scheduler.publish_every_ticks, 30);
        assert_eq!(config.scheduler.path_sampling, PathSampling::Time);
        assert_eq!(config.scheduler.max_point_bodies, 2000);

        assert!(EngineConfig::from_json_str(r#"{"scheduler": {"publish_every_ticks": 0}}"#).is_err());
    }
}
