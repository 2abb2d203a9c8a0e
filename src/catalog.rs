// Body Catalog - Static celestial bodies and their parent links
// Created once at startup; only derived positions change afterwards.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::OrbitError;
use crate::orbital_engine::OrbitalElements;
use crate::time_converter::JulianDate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Star,
    Planet,
    DwarfPlanet,
    Moon,
    Asteroid,
    Satellite,
    Debris,
}

impl BodyKind {
    pub fn label(&self) -> &'static str {
        match self {
            BodyKind::Star => "Star",
            BodyKind::Planet => "Planet",
            BodyKind::DwarfPlanet => "Dwarf Planet",
            BodyKind::Moon => "Moon",
            BodyKind::Asteroid => "Asteroid",
            BodyKind::Satellite => "Satellite",
            BodyKind::Debris => "Debris",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelestialBody {
    pub id: String,
    pub name: String,
    pub kind: BodyKind,
    pub elements: OrbitalElements,
    pub radius_km: f64,
    /// Body this one orbits; `None` for heliocentric and fixed bodies
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ringed parents need extra clearance around them
    #[serde(default)]
    pub has_rings: bool,
}

impl CelestialBody {
    pub fn new(id: &str, name: &str, kind: BodyKind, elements: OrbitalElements, radius_km: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            elements,
            radius_km,
            parent_id: None,
            has_rings: false,
        }
    }

    pub fn orbiting(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn with_rings(mut self) -> Self {
        self.has_rings = true;
        self
    }
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    bodies: Vec<CelestialBody>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Validates element sanity, id uniqueness and the one-level parent tree
    pub fn new(bodies: Vec<CelestialBody>) -> Result<Self, OrbitError> {
        let mut index = HashMap::with_capacity(bodies.len());
        for (i, body) in bodies.iter().enumerate() {
            body.elements.validate()?;
            if index.insert(body.id.clone(), i).is_some() {
                return Err(OrbitError::DuplicateBody(body.id.clone()));
            }
        }

        for body in &bodies {
            let Some(parent_id) = &body.parent_id else {
                continue;
            };
            let parent = index
                .get(parent_id)
                .map(|&i| &bodies[i])
                .ok_or_else(|| OrbitError::UnknownParent {
                    child: body.id.clone(),
                    parent: parent_id.clone(),
                })?;
            if parent.parent_id.is_some() {
                return Err(OrbitError::NestedParent {
                    child: body.id.clone(),
                    parent: parent_id.clone(),
                });
            }
            if body.elements.is_fixed() {
                return Err(OrbitError::InvalidElements(format!(
                    "fixed body '{}' cannot orbit '{}'",
                    body.id, parent_id
                )));
            }
        }

        Ok(Self { bodies, index })
    }

    pub fn from_json(json: &str) -> Result<Self, OrbitError> {
        let bodies: Vec<CelestialBody> =
            serde_json::from_str(json).map_err(|e| OrbitError::Catalog(e.to_string()))?;
        let catalog = Self::new(bodies)?;
        info!("Loaded catalog with {} bodies", catalog.len());
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&CelestialBody> {
        self.index.get(id).map(|&i| &self.bodies[i])
    }

    pub fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn children_of<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a CelestialBody> + 'a {
        self.bodies
            .iter()
            .filter(move |b| b.parent_id.as_deref() == Some(parent_id))
    }

    pub fn parent_ids(&self) -> HashSet<&str> {
        self.bodies
            .iter()
            .filter_map(|b| b.parent_id.as_deref())
            .collect()
    }

    /// Sun, planets, Pluto and major moons. Planet elements are J2000 mean
    /// elements with `a` in AU; moon semi-major axes are in km.
    pub fn solar_system() -> Result<Self, OrbitError> {
        let j2000 = JulianDate::J2000;

        // (id, name, a AU, e, i°, Ω°, ϖ°, L°, radius km)
        let planets: [(&str, &str, f64, f64, f64, f64, f64, f64, f64); 8] = [
            ("mercury", "Mercury", 0.38709927, 0.20563593, 7.00497902, 48.33076593, 77.45779628, 252.25032350, 2439.7),
            ("venus", "Venus", 0.72333566, 0.00677672, 3.39467605, 76.67984255, 131.60246718, 181.97909950, 6051.8),
            ("earth", "Earth", 1.00000261, 0.01671123, -0.00001531, 0.0, 102.93768193, 100.46457166, 6371.0),
            ("mars", "Mars", 1.52371034, 0.09339410, 1.84969142, 49.55953891, -23.94362959, -4.55343205, 3389.5),
            ("jupiter", "Jupiter", 5.20288700, 0.04838624, 1.30439695, 100.47390909, 14.72847983, 34.39644051, 69911.0),
            ("saturn", "Saturn", 9.53667594, 0.05386179, 2.48599187, 113.66242448, 92.59887831, 49.95424423, 58232.0),
            ("uranus", "Uranus", 19.18916464, 0.04725744, 0.77263783, 74.01692503, 170.95427630, 313.23810451, 25362.0),
            ("neptune", "Neptune", 30.06992276, 0.00859048, 1.77004347, 131.78422574, 44.96476227, -55.12002969, 24622.0),
        ];

        let mut bodies = vec![CelestialBody::new(
            "sun",
            "Sun",
            BodyKind::Star,
            OrbitalElements::fixed(),
            696340.0,
        )];

        for (id, name, a, e, i, node, long_peri, mean_long, radius) in planets {
            // ω = ϖ - Ω, M0 = L - ϖ
            let elements = OrbitalElements::from_degrees(
                a,
                e,
                i,
                node,
                long_peri - node,
                (mean_long - long_peri).rem_euclid(360.0),
                heliocentric_period_days(a),
                j2000,
            )?;
            let mut body = CelestialBody::new(id, name, BodyKind::Planet, elements, radius);
            if id == "saturn" || id == "uranus" {
                body = body.with_rings();
            }
            bodies.push(body);
        }

        bodies.push(CelestialBody::new(
            "pluto",
            "Pluto",
            BodyKind::DwarfPlanet,
            OrbitalElements::from_degrees(39.48211675, 0.24882730, 17.14001206, 110.30393684, 113.83430, 14.53, heliocentric_period_days(39.48211675), j2000)?,
            1188.3,
        ));

        // (id, name, parent, a km, e, i°, M0°, period days, radius km)
        let moons: [(&str, &str, &str, f64, f64, f64, f64, f64, f64); 12] = [
            ("moon", "Moon", "earth", 384400.0, 0.0549, 5.145, 135.27, 27.321661, 1737.4),
            ("phobos", "Phobos", "mars", 9376.0, 0.0151, 1.093, 91.0, 0.31891, 11.27),
            ("deimos", "Deimos", "mars", 23463.2, 0.00033, 0.93, 325.3, 1.263, 6.2),
            ("io", "Io", "jupiter", 421700.0, 0.0041, 0.050, 342.0, 1.769138, 1821.6),
            ("europa", "Europa", "jupiter", 671034.0, 0.009, 0.470, 171.0, 3.551181, 1560.8),
            ("ganymede", "Ganymede", "jupiter", 1070412.0, 0.0013, 0.20, 317.5, 7.154553, 2634.1),
            ("callisto", "Callisto", "jupiter", 1882709.0, 0.0074, 0.192, 181.4, 16.689018, 2410.3),
            ("enceladus", "Enceladus", "saturn", 237948.0, 0.0047, 0.009, 57.0, 1.370218, 252.1),
            ("rhea", "Rhea", "saturn", 527108.0, 0.001, 0.345, 205.0, 4.518212, 763.8),
            ("titan", "Titan", "saturn", 1221870.0, 0.0288, 0.349, 120.0, 15.945, 2574.7),
            ("titania", "Titania", "uranus", 435910.0, 0.0011, 0.34, 77.0, 8.706234, 788.4),
            ("triton", "Triton", "neptune", 354759.0, 0.000016, 156.885, 264.8, 5.876854, 1353.4),
        ];

        for (id, name, parent, a, e, i, m0, period, radius) in moons {
            let elements = OrbitalElements::from_degrees(a, e, i, 0.0, 0.0, m0, period, j2000)?;
            bodies.push(CelestialBody::new(id, name, BodyKind::Moon, elements, radius).orbiting(parent));
        }

        let catalog = Self::new(bodies)?;
        info!("Built solar system catalog with {} bodies", catalog.len());
        Ok(catalog)
    }
}

/// Kepler's third law for a heliocentric orbit, a in AU
pub fn heliocentric_period_days(semi_major_axis_au: f64) -> f64 {
    365.256898326 * semi_major_axis_au.powf(1.5)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solar_system_catalog() {
        let catalog = Catalog::solar_system().unwrap();
        let sun = catalog.get("sun").unwrap();
        assert!(sun.elements.is_fixed());

        let earth = catalog.get("earth").unwrap();
        assert!((earth.elements.period - 365.2569).abs() < 0.01);

        let jupiter_moons: Vec<_> = catalog.children_of("jupiter").map(|b| b.id.as_str()).collect();
        assert_eq!(jupiter_moons, vec!["io", "europa", "ganymede", "callisto"]);
        assert!(catalog.get("saturn").unwrap().has_rings);
        assert!(catalog.parent_ids().contains("neptune"));
    }

    #[test]
    fn test_rejects_unknown_parent() {
        let orphan = CelestialBody::new(
            "charon",
            "Charon",
            BodyKind::Moon,
            OrbitalElements::new(19591.0, 0.0, 0.0, 0.0, 0.0, 0.0, 6.387, JulianDate::J2000).unwrap(),
            606.0,
        )
        .orbiting("pluto");
        let err = Catalog::new(vec![orphan]).unwrap_err();
        assert!(matches!(err, OrbitError::UnknownParent { .. }));
    }

    #[test]
    fn test_rejects_nested_parents_and_duplicates() {
        let orbit = OrbitalElements::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, JulianDate::J2000).unwrap();
        let planet = CelestialBody::new("p", "P", BodyKind::Planet, orbit, 1.0);
        let moon = CelestialBody::new("m", "M", BodyKind::Moon, orbit, 1.0).orbiting("p");
        let submoon = CelestialBody::new("s", "S", BodyKind::Moon, orbit, 1.0).orbiting("m");

        let err = Catalog::new(vec![planet.clone(), moon, submoon]).unwrap_err();
        assert!(matches!(err, OrbitError::NestedParent { .. }));

        let err = Catalog::new(vec![planet.clone(), planet]).unwrap_err();
        assert_eq!(err, OrbitError::DuplicateBody("p".to_string()));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": "sun", "name": "Sun", "kind": "Star", "radius_km": 696340.0,
             "elements": {"semi_major_axis": 0.0, "eccentricity": 0.0, "inclination": 0.0,
                          "longitude_ascending_node": 0.0, "argument_perihelion": 0.0,
                          "mean_anomaly": 0.0, "period": 0.0}},
            {"id": "ceres", "name": "Ceres", "kind": "DwarfPlanet", "radius_km": 473.0,
             "elements": {"semi_major_axis": 2.77, "eccentricity": 0.0785, "inclination": 0.1849,
                          "longitude_ascending_node": 1.4012, "argument_perihelion": 1.2843,
                          "mean_anomaly": 1.6, "period": 1680.0, "epoch": 2459600.5}}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("sun").unwrap().elements.epoch, JulianDate::J2000.value());

        let hyperbolic = json.replace("0.0785", "1.2");
        assert!(matches!(
            Catalog::from_json(&hyperbolic),
            Err(OrbitError::NonEllipticalOrbit(_))
        ));
        assert!(matches!(Catalog::from_json("{"), Err(OrbitError::Catalog(_))));
    }
}
