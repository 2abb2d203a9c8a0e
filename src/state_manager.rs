// State Manager - Per-tick body propagation and shared frame snapshot
// Driven by the render loop: one time value per tick, bounded work per tick,
// decimated writes into the snapshot read by UI consumers.

use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::{BodyKind, Catalog, CelestialBody};
use crate::config::{EngineConfig, SchedulerConfig};
use crate::ephemeris_adapter::{
    EphemerisSource, ExternalEphemerisAdapter, Geodetic, PropagationOutcome, Sgp4Source,
    TleRecord,
};
use crate::error::OrbitError;
use crate::orbital_engine::{OrbitPath, OrbitPathCache, OrbitalPositionComputer, Vector3};
use crate::placement_resolver::{HierarchicalPlacementResolver, PlacementTable};
use crate::time_converter::JulianDate;

// =============================================================================
// FILTERS
// =============================================================================

/// All present criteria must match; `None` means "no restriction"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyFilter {
    pub kinds: Option<HashSet<BodyKind>>,
    /// Case-insensitive substring of name or id
    pub search: Option<String>,
    /// Ids relevant to the active data layer
    pub layer: Option<HashSet<String>>,
}

impl BodyFilter {
    pub fn matches(&self, id: &str, name: &str, kind: BodyKind) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&kind) {
                return false;
            }
        }
        if let Some(layer) = &self.layer {
            if !layer.contains(id) {
                return false;
            }
        }
        match &self.search {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                name.to_lowercase().contains(&needle) || id.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

// =============================================================================
// TRACKED OBJECTS
// =============================================================================

/// Body whose motion comes from an external propagator
pub struct TrackedObject {
    pub id: String,
    pub name: String,
    pub kind: BodyKind,
    source: Box<dyn EphemerisSource>,
}

impl TrackedObject {
    pub fn new(id: &str, name: &str, kind: BodyKind, source: Box<dyn EphemerisSource>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            source,
        }
    }

    /// Id from the catalog number columns of line 1, kind from the name
    pub fn from_record(record: TleRecord) -> Result<Self, OrbitError> {
        let id = record
            .line1
            .get(2..7)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| format!("norad-{}", n))
            .unwrap_or_else(|| record.name.clone());
        let kind = if record.name.contains(" DEB") {
            BodyKind::Debris
        } else {
            BodyKind::Satellite
        };
        let name = record.name.clone();
        let source = Sgp4Source::from_record(record)?;
        Ok(Self::new(&id, &name, kind, Box::new(source)))
    }

    pub fn source(&self) -> &dyn EphemerisSource {
        self.source.as_ref()
    }
}

// =============================================================================
// FRAME DATA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyRef {
    Catalog(usize),
    Tracked(usize),
}

/// Coordinate frame of a published position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFrame {
    /// Sun-centred, in `scene_units_per_au`
    Heliocentric,
    /// Earth-centred, in `scene_units_per_km` (Earth radii by default)
    Geocentric,
}

/// Frame-local result; dropped at the next tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePosition {
    pub body: BodyRef,
    pub frame: ReferenceFrame,
    pub position: Vector3,
    /// Parent position for moons, origin otherwise; paths are relative to it
    pub origin: Vector3,
    pub geodetic: Option<Geodetic>,
}

/// Buffers reused across ticks; cleared, never shrunk
#[derive(Debug, Default)]
struct ScratchArena {
    working: Vec<BodyRef>,
    positions: Vec<FramePosition>,
    parent_positions: HashMap<String, Vector3>,
    drawn_paths: Vec<usize>,
}

impl ScratchArena {
    fn reset(&mut self) {
        self.working.clear();
        self.positions.clear();
        self.parent_positions.clear();
        self.drawn_paths.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub julian_date: f64,
    /// Bodies passing the filter before the point ceiling
    pub candidates: usize,
    pub propagated: usize,
    pub failed: usize,
    /// Bodies dropped by the point ceiling
    pub capped: usize,
    pub paths_drawn: usize,
    pub published: bool,
}

// =============================================================================
// SERIALIZABLE SNAPSHOT FOR UI CONSUMERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub frame: ReferenceFrame,
    pub position: [f64; 3], // scene units
    pub parent_id: Option<String>,
    pub geodetic: Option<Geodetic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSnapshot {
    pub id: String,
    pub frame: ReferenceFrame,
    pub origin: [f64; 3],
    pub points: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub julian_date: f64,
    pub bodies: Vec<BodySnapshot>,
    pub paths: Vec<PathSnapshot>,
    pub failed: usize,
    pub capped: usize,
}

pub type SharedSnapshot = Arc<RwLock<FrameSnapshot>>;

// =============================================================================
// SCHEDULER
// =============================================================================

pub struct BodyPropagationScheduler {
    catalog: Catalog,
    tracked: Vec<TrackedObject>,
    placement: PlacementTable,
    computer: OrbitalPositionComputer,
    adapter: ExternalEphemerisAdapter,
    config: SchedulerConfig,
    filter: BodyFilter,
    scratch: ScratchArena,
    paths: OrbitPathCache,
    snapshot: SharedSnapshot,
    tick: u64,
}

impl BodyPropagationScheduler {
    /// Fails when the configuration does not validate
    pub fn new(catalog: Catalog, config: &EngineConfig) -> Result<Self, OrbitError> {
        config.validate()?;
        let placement = PlacementTable::build(&catalog, &config.placement);
        info!(
            "Scheduler ready: {} catalog bodies, {} placement profiles",
            catalog.len(),
            placement.len()
        );

        Ok(Self {
            catalog,
            tracked: Vec::new(),
            placement,
            computer: OrbitalPositionComputer::new(config.scheduler.solver),
            adapter: ExternalEphemerisAdapter::new(&config.ephemeris),
            config: config.scheduler.clone(),
            filter: BodyFilter::default(),
            scratch: ScratchArena::default(),
            paths: OrbitPathCache::new(),
            snapshot: Arc::new(RwLock::new(FrameSnapshot::default())),
            tick: 0,
        })
    }

    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.snapshot)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tracked(&self) -> &[TrackedObject] {
        &self.tracked
    }

    pub fn set_filter(&mut self, filter: BodyFilter) {
        self.filter = filter;
    }

    /// Cached paths are rebuilt at the reference time of the next tick
    pub fn request_path_refresh(&mut self) {
        self.paths.request_refresh();
    }

    pub fn add_tracked(&mut self, object: TrackedObject) -> Result<(), OrbitError> {
        if self.catalog.get(&object.id).is_some() || self.tracked.iter().any(|t| t.id == object.id) {
            return Err(OrbitError::DuplicateBody(object.id));
        }
        self.tracked.push(object);
        Ok(())
    }

    pub fn remove_tracked(&mut self, id: &str) -> Result<TrackedObject, OrbitError> {
        let index = self
            .tracked
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| OrbitError::UnknownBody(id.to_string()))?;
        self.paths.invalidate(id);
        Ok(self.tracked.remove(index))
    }

    /// Swaps the whole tracked set for freshly fetched records.
    /// Records the propagator cannot initialise are skipped.
    pub fn replace_tracked(&mut self, records: &[TleRecord]) -> usize {
        for old in self.tracked.drain(..) {
            self.paths.invalidate(&old.id);
        }

        let mut seen = HashSet::new();
        for record in records {
            match TrackedObject::from_record(record.clone()) {
                Ok(object) => {
                    if self.catalog.get(&object.id).is_some() || !seen.insert(object.id.clone()) {
                        warn!("Duplicate tracked id {}, keeping the first", object.id);
                        continue;
                    }
                    self.tracked.push(object);
                }
                Err(e) => warn!("Skipping record: {}", e),
            }
        }

        info!("Tracking {} of {} records", self.tracked.len(), records.len());
        self.tracked.len()
    }

    pub fn body_id(&self, body: BodyRef) -> &str {
        body_id_in(&self.catalog, &self.tracked, body)
    }

    /// Positions from the most recent tick, in working-set order
    pub fn frame(&self) -> &[FramePosition] {
        &self.scratch.positions
    }

    pub fn frame_position(&self, id: &str) -> Option<&FramePosition> {
        self.scratch
            .positions
            .iter()
            .find(|p| self.body_id(p.body) == id)
    }

    pub fn path(&self, id: &str) -> Option<&OrbitPath> {
        self.paths.get(id)
    }

    /// Filter, cap, propagate every body against `time`, draw paths for
    /// the first bodies under the path ceiling, publish on cadence
    pub fn tick(&mut self, time: JulianDate) -> TickReport {
        self.tick += 1;

        let Self {
            catalog,
            tracked,
            placement,
            computer,
            adapter,
            config,
            filter,
            scratch,
            paths,
            snapshot,
            tick,
        } = self;

        scratch.reset();

        // 1. Working set
        for (i, body) in catalog.bodies().iter().enumerate() {
            if filter.matches(&body.id, &body.name, body.kind) {
                scratch.working.push(BodyRef::Catalog(i));
            }
        }
        for (i, object) in tracked.iter().enumerate() {
            if filter.matches(&object.id, &object.name, object.kind) {
                scratch.working.push(BodyRef::Tracked(i));
            }
        }

        // 2. Point ceiling
        let candidates = scratch.working.len();
        let capped = candidates.saturating_sub(config.max_point_bodies);
        scratch.working.truncate(config.max_point_bodies);

        // 3. Propagation; failures are counted and skipped
        let resolver = HierarchicalPlacementResolver::new(placement, *computer);
        let mut failed = 0;
        for &body_ref in &scratch.working {
            let resolved = match body_ref {
                BodyRef::Catalog(i) => {
                    let body = &catalog.bodies()[i];
                    place_catalog_body(
                        body,
                        catalog,
                        &resolver,
                        computer,
                        config.scene_units_per_au,
                        time,
                        &mut scratch.parent_positions,
                    )
                    .map(|(position, origin)| FramePosition {
                        body: body_ref,
                        frame: ReferenceFrame::Heliocentric,
                        position,
                        origin,
                        geodetic: None,
                    })
                }
                BodyRef::Tracked(i) => match adapter.propagate(tracked[i].source(), time) {
                    PropagationOutcome::Success(state) => Some(FramePosition {
                        body: body_ref,
                        frame: ReferenceFrame::Geocentric,
                        position: state.position,
                        origin: Vector3::zero(),
                        geodetic: Some(state.geodetic),
                    }),
                    PropagationOutcome::Failure(_) => None,
                },
            };

            match resolved {
                Some(frame) => scratch.positions.push(frame),
                None => failed += 1,
            }
        }

        // 4. Paths under the path ceiling
        for (index, frame) in scratch.positions.iter().enumerate() {
            if scratch.drawn_paths.len() >= config.max_path_bodies {
                break;
            }
            let path = match frame.body {
                BodyRef::Catalog(i) => {
                    let body = &catalog.bodies()[i];
                    let scale = match body.parent_id {
                        Some(_) => placement.child_scale(&body.id).unwrap_or(0.0),
                        None => config.scene_units_per_au,
                    };
                    paths.get_or_build(&body.id, Some(&body.elements), time, || {
                        computer.generate_path(
                            &body.elements,
                            config.path_segments,
                            scale,
                            config.path_sampling,
                        )
                    })
                }
                BodyRef::Tracked(i) => {
                    let object = &tracked[i];
                    paths.get_or_build(&object.id, None, time, || {
                        adapter.generate_path(object.source(), time)
                    })
                }
            };
            if !path.points.is_empty() {
                scratch.drawn_paths.push(index);
            }
        }
        paths.finish_refresh();

        // 5. Decimated publish
        let published = *tick % config.publish_every_ticks == 0;
        if published {
            let bodies = scratch
                .positions
                .iter()
                .map(|frame| match frame.body {
                    BodyRef::Catalog(i) => {
                        let body = &catalog.bodies()[i];
                        BodySnapshot {
                            id: body.id.clone(),
                            name: body.name.clone(),
                            kind: body.kind.label().to_string(),
                            frame: frame.frame,
                            position: frame.position.to_array(),
                            parent_id: body.parent_id.clone(),
                            geodetic: None,
                        }
                    }
                    BodyRef::Tracked(i) => {
                        let object = &tracked[i];
                        BodySnapshot {
                            id: object.id.clone(),
                            name: object.name.clone(),
                            kind: object.kind.label().to_string(),
                            frame: frame.frame,
                            position: frame.position.to_array(),
                            parent_id: None,
                            geodetic: frame.geodetic,
                        }
                    }
                })
                .collect::<Vec<_>>();

            let drawn = scratch
                .drawn_paths
                .iter()
                .filter_map(|&index| {
                    let frame = &scratch.positions[index];
                    let id = body_id_in(catalog, tracked, frame.body);
                    paths.get(id).map(|path| PathSnapshot {
                        id: id.to_string(),
                        frame: frame.frame,
                        origin: frame.origin.to_array(),
                        points: path.points.iter().map(Vector3::to_array).collect(),
                    })
                })
                .collect::<Vec<_>>();

            debug!(
                "Published tick {}: {} bodies, {} paths, {} failed, {} capped",
                tick,
                bodies.len(),
                drawn.len(),
                failed,
                capped
            );

            *snapshot.write() = FrameSnapshot {
                tick: *tick,
                julian_date: time.value(),
                bodies,
                paths: drawn,
                failed,
                capped,
            };
        }

        TickReport {
            tick: *tick,
            julian_date: time.value(),
            candidates,
            propagated: scratch.positions.len(),
            failed,
            capped,
            paths_drawn: scratch.drawn_paths.len(),
            published,
        }
    }
}

fn body_id_in<'a>(catalog: &'a Catalog, tracked: &'a [TrackedObject], body: BodyRef) -> &'a str {
    match body {
        BodyRef::Catalog(i) => &catalog.bodies()[i].id,
        BodyRef::Tracked(i) => &tracked[i].id,
    }
}

/// World position and path origin of a catalog body.
/// Parents are resolved on demand so a moon can be shown without its planet.
fn place_catalog_body(
    body: &CelestialBody,
    catalog: &Catalog,
    resolver: &HierarchicalPlacementResolver<'_>,
    computer: &OrbitalPositionComputer,
    scene_units_per_au: f64,
    time: JulianDate,
    parent_positions: &mut HashMap<String, Vector3>,
) -> Option<(Vector3, Vector3)> {
    let placed = match &body.parent_id {
        None => (
            computer.position_at_time(&body.elements, time, scene_units_per_au),
            Vector3::zero(),
        ),
        Some(parent_id) => {
            let parent_position = match parent_positions.get(parent_id) {
                Some(p) => *p,
                None => {
                    let parent = catalog.get(parent_id)?;
                    let p = computer.position_at_time(&parent.elements, time, scene_units_per_au);
                    parent_positions.insert(parent_id.clone(), p);
                    p
                }
            };
            (resolver.resolve(body, &parent_position, time)?, parent_position)
        }
    };

    if placed.0.is_finite() {
        Some(placed)
    } else {
        None
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris_adapter::{EciState, FailureReason};

    struct BrokenSource;

    impl EphemerisSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        fn mean_motion(&self) -> f64 {
            15.0
        }

        fn propagate_eci(&self, _time: JulianDate) -> Result<EciState, FailureReason> {
            Err(FailureReason::Propagator("always fails".to_string()))
        }
    }

    fn engine_config(points: usize, paths: usize, publish_every: u64) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.scheduler.max_point_bodies = points;
        config.scheduler.max_path_bodies = paths;
        config.scheduler.publish_every_ticks = publish_every;
        config.scheduler.path_segments = 64;
        config
    }

    fn scheduler(points: usize, paths: usize, publish_every: u64) -> BodyPropagationScheduler {
        BodyPropagationScheduler::new(
            Catalog::solar_system().unwrap(),
            &engine_config(points, paths, publish_every),
        )
        .unwrap()
    }

    #[test]
    fn test_publish_is_decimated() {
        let mut sched = scheduler(100, 10, 3);
        let snapshot = sched.snapshot();
        let t = JulianDate::J2000;

        assert!(!sched.tick(t).published);
        assert!(!sched.tick(t.add_days(1.0)).published);
        assert_eq!(snapshot.read().tick, 0);

        let report = sched.tick(t.add_days(2.0));
        assert!(report.published);
        let frame = snapshot.read();
        assert_eq!(frame.tick, 3);
        assert_eq!(frame.julian_date, t.add_days(2.0).value());
        assert_eq!(frame.bodies.len(), report.propagated);
    }

    #[test]
    fn test_ceilings_bound_the_work() {
        let mut sched = scheduler(5, 2, 1);
        sched.set_filter(BodyFilter {
            kinds: Some([BodyKind::Planet].into_iter().collect()),
            ..Default::default()
        });
        let report = sched.tick(JulianDate::J2000);
        assert_eq!(report.candidates, 8);
        assert_eq!(report.propagated, 5);
        assert_eq!(report.capped, 3);
        assert_eq!(report.paths_drawn, 2);

        let frame = sched.snapshot();
        let frame = frame.read();
        assert_eq!(frame.paths.len(), 2);
        assert_eq!(frame.paths[0].id, "mercury");
        assert_eq!(frame.paths[0].points.len(), 65);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let zero_cadence = engine_config(100, 10, 0);
        let result = BodyPropagationScheduler::new(Catalog::solar_system().unwrap(), &zero_cadence);
        assert!(matches!(result, Err(OrbitError::Config(_))));

        let inverted = engine_config(2, 5, 1);
        let result = BodyPropagationScheduler::new(Catalog::solar_system().unwrap(), &inverted);
        assert!(matches!(result, Err(OrbitError::Config(_))));
    }

    #[test]
    fn test_every_body_uses_the_tick_time() {
        let mut sched = scheduler(100, 10, 1);
        let t = JulianDate(2460000.5);
        sched.tick(t);

        let computer = OrbitalPositionComputer::default();
        for id in ["earth", "neptune", "pluto"] {
            let body = sched.catalog().get(id).unwrap();
            let expected = computer.position_at_time(&body.elements, t, 100.0);
            let frame = sched.frame_position(id).unwrap();
            assert!(frame.position.distance(&expected) < 1e-9, "{}", id);
        }
        assert_eq!(sched.frame_position("sun").unwrap().position, Vector3::zero());
    }

    #[test]
    fn test_search_and_layer_filters() {
        let mut sched = scheduler(100, 10, 1);
        sched.set_filter(BodyFilter {
            search: Some("JUP".to_string()),
            ..Default::default()
        });
        let report = sched.tick(JulianDate::J2000);
        assert_eq!(report.propagated, 1);
        assert_eq!(sched.body_id(sched.frame()[0].body), "jupiter");

        sched.set_filter(BodyFilter {
            layer: Some(["io".to_string(), "titan".to_string()].into_iter().collect()),
            ..Default::default()
        });
        let report = sched.tick(JulianDate::J2000);
        assert_eq!(report.propagated, 2);
    }

    #[test]
    fn test_moon_without_its_planet_stays_clear() {
        let mut sched = scheduler(100, 10, 1);
        sched.set_filter(BodyFilter {
            search: Some("titan".to_string()),
            ..Default::default()
        });
        let t = JulianDate::J2000.add_days(3.3);
        sched.tick(t);

        let saturn = sched.catalog().get("saturn").unwrap();
        let saturn_pos = OrbitalPositionComputer::default().position_at_time(&saturn.elements, t, 100.0);
        let titan = sched.frame_position("titan").unwrap();
        assert!(titan.origin.distance(&saturn_pos) < 1e-9);

        let clearance = sched.placement.profile("saturn").unwrap().clearance;
        assert!(titan.position.distance(&saturn_pos) >= clearance * (1.0 - 1e-9));
    }

    #[test]
    fn test_failing_body_does_not_abort_tick() {
        let mut sched = scheduler(100, 50, 1);
        sched
            .add_tracked(TrackedObject::new("dead", "Dead Sat", BodyKind::Satellite, Box::new(BrokenSource)))
            .unwrap();
        let report = sched.tick(JulianDate::J2000);
        assert_eq!(report.failed, 1);
        assert_eq!(report.propagated, sched.catalog().len());
        assert!(sched.frame_position("dead").is_none());
        assert_eq!(sched.snapshot().read().failed, 1);

        let duplicate = TrackedObject::new("earth", "Earth", BodyKind::Satellite, Box::new(BrokenSource));
        assert!(matches!(sched.add_tracked(duplicate), Err(OrbitError::DuplicateBody(_))));

        assert!(sched.remove_tracked("dead").is_ok());
        assert!(matches!(sched.remove_tracked("dead"), Err(OrbitError::UnknownBody(_))));
        assert_eq!(sched.tick(JulianDate::J2000).failed, 0);
    }

    #[test]
    fn test_path_refresh_moves_reference_time() {
        let mut sched = scheduler(100, 10, 1);
        let t0 = JulianDate::J2000;
        sched.tick(t0);
        assert_eq!(sched.path("earth").unwrap().reference_jd, t0);

        let t1 = t0.add_days(30.0);
        sched.tick(t1);
        assert_eq!(sched.path("earth").unwrap().reference_jd, t0);

        sched.request_path_refresh();
        sched.tick(t1);
        assert_eq!(sched.path("earth").unwrap().reference_jd, t1);
    }

    #[test]
    fn test_replace_tracked_from_records() {
        let mut sched = scheduler(100, 10, 1);
        let records = vec![
            TleRecord::new(
                "ISS (ZARYA)",
                "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992",
                "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008",
            )
            .unwrap(),
            TleRecord::new("BROKEN", "1 nope", "2 nope").unwrap(),
        ];
        assert_eq!(sched.replace_tracked(&records), 1);
        assert_eq!(sched.tracked()[0].id, "norad-25544");
        assert_eq!(sched.tracked()[0].kind, BodyKind::Satellite);

        sched.set_filter(BodyFilter {
            kinds: Some([BodyKind::Satellite].into_iter().collect()),
            ..Default::default()
        });
        let report = sched.tick(JulianDate(2459043.5));
        assert_eq!(report.propagated, 1);
        let iss = sched.frame_position("norad-25544").unwrap();
        assert_eq!(iss.frame, ReferenceFrame::Geocentric);
        assert_eq!(iss.origin, Vector3::zero());
        assert!(iss.geodetic.unwrap().altitude_km > 300.0);
        assert_eq!(report.paths_drawn, 1);

        sched.set_filter(BodyFilter::default());
        sched.tick(JulianDate(2459043.5));
        let frame = sched.snapshot();
        let frame = frame.read();
        for body in &frame.bodies {
            let expected = if body.id == "norad-25544" {
                ReferenceFrame::Geocentric
            } else {
                ReferenceFrame::Heliocentric
            };
            assert_eq!(body.frame, expected, "{}", body.id);
        }
        for path in &frame.paths {
            let body = frame.bodies.iter().find(|b| b.id == path.id).unwrap();
            assert_eq!(path.frame, body.frame);
        }
    }
}
