//! Region geometries and the named-geometry manager.
//!
//! A region is either an explicit rectangle or a polygon loaded from an
//! uploaded GeoJSON shape. Geometries are stored under a caller-chosen name
//! (e.g. a UI panel or "cli") and handed to the compute service as GeoJSON.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::bbox::BoundingBox;
use crate::error::{CommonError, CommonResult};

/// A linear ring of [lon, lat] pairs.
pub type Ring = Vec<[f64; 2]>;

/// Opaque, validated region usable by the compute service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Rectangle(BoundingBox),
    /// Exterior ring first, then holes.
    Polygon { rings: Vec<Ring> },
    MultiPolygon { polygons: Vec<Vec<Ring>> },
}

impl Geometry {
    /// True when the geometry encloses no area.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Rectangle(bbox) => bbox.is_degenerate(),
            Geometry::Polygon { rings } => rings.first().map_or(true, |r| ring_is_empty(r)),
            Geometry::MultiPolygon { polygons } => polygons
                .iter()
                .all(|p| p.first().map_or(true, |r| ring_is_empty(r))),
        }
    }

    /// Smallest bounding box enclosing the geometry.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let points: Vec<[f64; 2]> = match self {
            Geometry::Rectangle(bbox) => return Some(*bbox),
            Geometry::Polygon { rings } => rings.first().cloned().unwrap_or_default(),
            Geometry::MultiPolygon { polygons } => polygons
                .iter()
                .filter_map(|p| p.first())
                .flatten()
                .copied()
                .collect(),
        };

        let first = points.first()?;
        let init = BoundingBox::new(first[0], first[1], first[0], first[1]);
        Some(points.iter().fold(init, |acc, p| BoundingBox {
            min_lon: acc.min_lon.min(p[0]),
            min_lat: acc.min_lat.min(p[1]),
            max_lon: acc.max_lon.max(p[0]),
            max_lat: acc.max_lat.max(p[1]),
        }))
    }

    /// GeoJSON geometry object, the form the compute service consumes.
    pub fn to_geojson(&self) -> Value {
        match self {
            Geometry::Rectangle(b) => json!({
                "type": "Polygon",
                "coordinates": [[
                    [b.min_lon, b.min_lat],
                    [b.max_lon, b.min_lat],
                    [b.max_lon, b.max_lat],
                    [b.min_lon, b.max_lat],
                    [b.min_lon, b.min_lat],
                ]],
            }),
            Geometry::Polygon { rings } => json!({
                "type": "Polygon",
                "coordinates": rings,
            }),
            Geometry::MultiPolygon { polygons } => json!({
                "type": "MultiPolygon",
                "coordinates": polygons,
            }),
        }
    }

    /// Parse a GeoJSON document: a geometry, a Feature, or the first polygonal
    /// feature of a FeatureCollection.
    pub fn from_geojson(value: &Value) -> CommonResult<Self> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| CommonError::GeoJson("missing 'type'".to_string()))?;

        let geometry = match kind {
            "FeatureCollection" => {
                let features = value
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| CommonError::GeoJson("missing 'features'".to_string()))?;
                features
                    .iter()
                    .find_map(|f| Self::from_geojson(f).ok())
                    .ok_or_else(|| {
                        CommonError::GeoJson("no polygonal feature in collection".to_string())
                    })?
            }
            "Feature" => {
                let inner = value
                    .get("geometry")
                    .ok_or_else(|| CommonError::GeoJson("feature has no geometry".to_string()))?;
                Self::from_geojson(inner)?
            }
            "Polygon" => {
                let coords = coordinates(value)?;
                Geometry::Polygon {
                    rings: serde_json::from_value(coords.clone())?,
                }
            }
            "MultiPolygon" => {
                let coords = coordinates(value)?;
                Geometry::MultiPolygon {
                    polygons: serde_json::from_value(coords.clone())?,
                }
            }
            other => {
                return Err(CommonError::GeoJson(format!(
                    "unsupported geometry type '{}', expected Polygon or MultiPolygon",
                    other
                )))
            }
        };

        geometry.validate()?;
        Ok(geometry)
    }

    /// Check all coordinates are in lon/lat range and the region is non-empty.
    pub fn validate(&self) -> CommonResult<()> {
        if let Geometry::Rectangle(bbox) = self {
            return bbox.validate();
        }

        let out_of_range = self.rings().flatten().any(|p| {
            !(-180.0..=180.0).contains(&p[0]) || !(-90.0..=90.0).contains(&p[1])
        });
        if out_of_range {
            return Err(CommonError::InvalidGeometry(
                "coordinates must be longitude/latitude degrees".to_string(),
            ));
        }
        if self.is_empty() {
            return Err(CommonError::InvalidGeometry(
                "polygon needs at least three distinct vertices".to_string(),
            ));
        }
        Ok(())
    }

    fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            Geometry::Rectangle(_) => Box::new(std::iter::empty()),
            Geometry::Polygon { rings } => Box::new(rings.iter()),
            Geometry::MultiPolygon { polygons } => Box::new(polygons.iter().flatten()),
        }
    }
}

fn coordinates(value: &Value) -> CommonResult<&Value> {
    value
        .get("coordinates")
        .ok_or_else(|| CommonError::GeoJson("missing 'coordinates'".to_string()))
}

fn ring_is_empty(ring: &Ring) -> bool {
    let mut distinct: Vec<[f64; 2]> = Vec::new();
    for p in ring {
        if !distinct.contains(p) {
            distinct.push(*p);
        }
    }
    distinct.len() < 3
}

/// Stores named region geometries.
#[derive(Debug, Default)]
pub struct GeometryManager {
    geometries: HashMap<String, Geometry>,
}

impl GeometryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rectangular region.
    pub fn set_bounds(
        &mut self,
        name: &str,
        west: f64,
        south: f64,
        east: f64,
        north: f64,
    ) -> CommonResult<()> {
        let bbox = BoundingBox::validated(west, south, east, north)?;
        debug!(name = %name, bounds = ?bbox.to_list(), "Region bounds set");
        self.geometries
            .insert(name.to_string(), Geometry::Rectangle(bbox));
        Ok(())
    }

    /// Load a region from a GeoJSON file.
    pub fn load_geojson(&mut self, name: &str, path: impl AsRef<Path>) -> CommonResult<()> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        let geometry = Geometry::from_geojson(&value)?;

        info!(
            name = %name,
            path = %path.display(),
            bounds = ?geometry.bounds().map(|b| b.to_list()),
            "Loaded region from GeoJSON"
        );
        self.geometries.insert(name.to_string(), geometry);
        Ok(())
    }

    pub fn get_geometry(&self, name: &str) -> CommonResult<&Geometry> {
        self.geometries
            .get(name)
            .ok_or_else(|| CommonError::UnknownGeometry(name.to_string()))
    }

    pub fn bounds(&self, name: &str) -> CommonResult<BoundingBox> {
        let geometry = self.get_geometry(name)?;
        geometry
            .bounds()
            .ok_or_else(|| CommonError::InvalidGeometry(format!("'{}' has no vertices", name)))
    }

    /// Copy a region from one name to another.
    pub fn copy_geometry(&mut self, source: &str, target: &str) -> CommonResult<()> {
        let geometry = self.get_geometry(source)?.clone();
        self.geometries.insert(target.to_string(), geometry);
        Ok(())
    }

    /// Remove a region. Returns whether one was defined.
    pub fn clear(&mut self, name: &str) -> bool {
        self.geometries.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_geojson_is_closed_ring() {
        let geom = Geometry::Rectangle(BoundingBox::new(-10.0, 40.0, 5.0, 50.0));
        let gj = geom.to_geojson();
        let ring = gj["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_degenerate_polygon_is_empty() {
        let geom = Geometry::Polygon {
            rings: vec![vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
        };
        assert!(geom.is_empty());
        assert!(matches!(geom.validate(), Err(CommonError::InvalidGeometry(_))));
    }

    #[test]
    fn test_unknown_geometry() {
        let manager = GeometryManager::new();
        assert!(matches!(
            manager.get_geometry("left"),
            Err(CommonError::UnknownGeometry(_))
        ));
    }

    #[test]
    fn test_copy_and_clear() {
        let mut manager = GeometryManager::new();
        manager.set_bounds("left", -10.0, 40.0, 5.0, 50.0).unwrap();
        manager.copy_geometry("left", "right").unwrap();
        assert_eq!(
            manager.get_geometry("left").unwrap(),
            manager.get_geometry("right").unwrap()
        );
        assert!(manager.clear("left"));
        assert!(!manager.clear("left"));
        assert!(manager.get_geometry("right").is_ok());
    }
}
