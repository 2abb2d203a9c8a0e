// Orrery Engine - Orbital mechanics and time propagation
// Library entry point for the celestial body visualizer core

pub mod api_client;
pub mod catalog;
pub mod config;
pub mod ephemeris_adapter;
pub mod error;
pub mod kepler_solver;
pub mod orbital_engine;
pub mod placement_resolver;
pub mod state_manager;
pub mod time_converter;

use std::sync::Once;

pub use catalog::{BodyKind, Catalog, CelestialBody};
pub use config::EngineConfig;
pub use ephemeris_adapter::{
    EphemerisSource, ExternalEphemerisAdapter, PropagationOutcome, Sgp4Source, TleRecord,
};
pub use error::OrbitError;
pub use kepler_solver::{solve_kepler, KeplerSolver};
pub use orbital_engine::{OrbitalElements, OrbitalPositionComputer, PathSampling, Vector3};
pub use placement_resolver::{HierarchicalPlacementResolver, PlacementTable};
pub use state_manager::{
    BodyFilter, BodyPropagationScheduler, FrameSnapshot, ReferenceFrame, TickReport,
};
pub use time_converter::{from_julian_date, to_julian_date, CalendarInstant, JulianDate};

static LOGGER: Once = Once::new();

/// Installs env_logger once; `RUST_LOG` overrides the default `info` filter
pub fn init_logging() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_millis()
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("logger ready");
    }
}
