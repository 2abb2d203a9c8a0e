// Placement Resolver - Moons placed around exaggerated parents
// Rendered radii are inflated far beyond scale, so each child orbit is
// rescaled into a band outside its parent's visual sphere.

use log::debug;
use std::collections::HashMap;

use crate::catalog::{Catalog, CelestialBody};
use crate::config::PlacementConfig;
use crate::orbital_engine::{OrbitalPositionComputer, PathSampling, Vector3};
use crate::time_converter::JulianDate;

/// Sibling band placement when a parent has a single child
const LONE_CHILD_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ParentScalingProfile {
    pub parent_id: String,
    pub visual_radius: f64, // scene units
    /// Minimum child distance from the parent centre (scene units)
    pub clearance: f64,
    /// Width of the band beyond the clearance (scene units)
    pub spread: f64,
    pub min_child_axis: f64,
    pub max_child_axis: f64,
}

impl ParentScalingProfile {
    pub fn for_parent(parent: &CelestialBody, child_axes: &[f64], config: &PlacementConfig) -> Self {
        let visual_radius = parent.radius_km * config.visual_units_per_km;
        let clearance_factor = if parent.has_rings {
            config.ringed_clearance_factor
        } else {
            config.clearance_factor
        };
        let min_child_axis = child_axes.iter().copied().fold(f64::INFINITY, f64::min);
        let max_child_axis = child_axes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            parent_id: parent.id.clone(),
            visual_radius,
            clearance: visual_radius * clearance_factor,
            spread: visual_radius * config.spread_factor,
            min_child_axis,
            max_child_axis,
        }
    }

    /// Target distance in [clearance, clearance + spread], linear in the
    /// child's semi-major axis among its siblings
    pub fn target_distance(&self, semi_major_axis: f64) -> f64 {
        let span = self.max_child_axis - self.min_child_axis;
        let fraction = if span > 0.0 {
            ((semi_major_axis - self.min_child_axis) / span).clamp(0.0, 1.0)
        } else {
            LONE_CHILD_FRACTION
        };
        self.clearance + fraction * self.spread
    }

    /// Scale that puts the child's periapsis exactly on its target distance.
    /// Every other point of the orbit is farther out, so the clearance holds
    /// at all times.
    pub fn child_scale(&self, child: &CelestialBody) -> f64 {
        let periapsis = child.elements.perihelion_distance();
        if periapsis <= 0.0 {
            return 0.0;
        }
        self.target_distance(child.elements.semi_major_axis) / periapsis
    }
}

// =============================================================================
// PROFILE TABLE
// =============================================================================

/// Profiles and per-child scales, built once from the static catalog
#[derive(Debug, Clone, Default)]
pub struct PlacementTable {
    profiles: HashMap<String, ParentScalingProfile>,
    child_scales: HashMap<String, f64>,
}

impl PlacementTable {
    pub fn build(catalog: &Catalog, config: &PlacementConfig) -> Self {
        let mut profiles = HashMap::new();
        let mut child_scales = HashMap::new();

        for parent_id in catalog.parent_ids() {
            let Some(parent) = catalog.get(parent_id) else {
                continue;
            };
            let children: Vec<&CelestialBody> = catalog.children_of(parent_id).collect();
            let axes: Vec<f64> = children.iter().map(|c| c.elements.semi_major_axis).collect();
            let profile = ParentScalingProfile::for_parent(parent, &axes, config);

            for child in &children {
                child_scales.insert(child.id.clone(), profile.child_scale(child));
            }
            debug!(
                "Placement profile for {}: clearance {:.4}, spread {:.4}, {} children",
                parent_id,
                profile.clearance,
                profile.spread,
                children.len()
            );
            profiles.insert(parent_id.to_string(), profile);
        }

        Self {
            profiles,
            child_scales,
        }
    }

    pub fn profile(&self, parent_id: &str) -> Option<&ParentScalingProfile> {
        self.profiles.get(parent_id)
    }

    pub fn child_scale(&self, child_id: &str) -> Option<f64> {
        self.child_scales.get(child_id).copied()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

pub struct HierarchicalPlacementResolver<'a> {
    table: &'a PlacementTable,
    computer: OrbitalPositionComputer,
}

impl<'a> HierarchicalPlacementResolver<'a> {
    pub fn new(table: &'a PlacementTable, computer: OrbitalPositionComputer) -> Self {
        Self { table, computer }
    }

    /// Child offset from its parent in scene units; `None` when the body has
    /// no parent or no profile
    pub fn child_offset(&self, child: &CelestialBody, time: JulianDate) -> Option<Vector3> {
        child.parent_id.as_ref()?;
        let scale = self.table.child_scale(&child.id)?;
        Some(self.computer.position_at_time(&child.elements, time, scale))
    }

    /// World position = parent position + rescaled child offset
    pub fn resolve(
        &self,
        child: &CelestialBody,
        parent_position: &Vector3,
        time: JulianDate,
    ) -> Option<Vector3> {
        self.child_offset(child, time)
            .map(|offset| parent_position.add(&offset))
    }

    /// Rescaled child orbit path around the parent's current position
    pub fn child_path(
        &self,
        child: &CelestialBody,
        parent_position: &Vector3,
        segments: usize,
        sampling: PathSampling,
    ) -> Option<Vec<Vector3>> {
        let scale = self.table.child_scale(&child.id)?;
        let path = self
            .computer
            .generate_path(&child.elements, segments, scale, sampling)
            .into_iter()
            .map(|p| parent_position.add(&p))
            .collect();
        Some(path)
    }
}

// =============================================================================
// TESTS
// =============================================================================
