//! Tests for region bounds and the geometry manager.

use std::io::Write;

use climate_common::{BoundingBox, CommonError, Geometry, GeometryManager};

// ============================================================================
// Bounds validation tests
// ============================================================================

#[test]
fn test_bounds_global_is_valid() {
    let bbox = BoundingBox::validated(-180.0, -90.0, 180.0, 90.0).unwrap();
    assert_eq!(bbox.to_list(), [-180.0, -90.0, 180.0, 90.0]);
}

#[test]
fn test_bounds_longitude_out_of_range() {
    let result = BoundingBox::validated(-181.0, 0.0, 10.0, 10.0);
    assert!(matches!(result, Err(CommonError::InvalidBounds(_))));
}

#[test]
fn test_bounds_latitude_out_of_range() {
    let result = BoundingBox::validated(0.0, -91.0, 10.0, 10.0);
    assert!(matches!(result, Err(CommonError::InvalidBounds(_))));
}

#[test]
fn test_bounds_zero_width_rejected() {
    let result = BoundingBox::validated(5.0, 0.0, 5.0, 10.0);
    assert!(matches!(result, Err(CommonError::InvalidBounds(_))));
}

#[test]
fn test_bounds_nan_rejected() {
    let result = BoundingBox::validated(f64::NAN, 0.0, 5.0, 10.0);
    assert!(matches!(result, Err(CommonError::InvalidBounds(_))));
}

// ============================================================================
// Geometry manager tests
// ============================================================================

#[test]
fn test_set_bounds_then_get() {
    let mut manager = GeometryManager::new();
    manager.set_bounds("cli", -125.0, 24.0, -66.0, 50.0).unwrap();

    let geometry = manager.get_geometry("cli").unwrap();
    assert_eq!(
        geometry,
        &Geometry::Rectangle(BoundingBox::new(-125.0, 24.0, -66.0, 50.0))
    );
    assert!(!geometry.is_empty());
}

#[test]
fn test_set_bounds_invalid_leaves_nothing() {
    let mut manager = GeometryManager::new();
    assert!(manager.set_bounds("cli", 10.0, 0.0, 5.0, 5.0).is_err());
    assert!(matches!(
        manager.get_geometry("cli"),
        Err(CommonError::UnknownGeometry(_))
    ));
}

fn write_geojson(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_geojson_feature_collection() {
    let file = write_geojson(
        r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"type": "Feature", "properties": {"name": "basin"}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-5.0, 40.0], [3.0, 40.0], [3.0, 44.0], [-5.0, 44.0], [-5.0, 40.0]]]
                }}
            ]
        }"#,
    );

    let mut manager = GeometryManager::new();
    manager.load_geojson("upload", file.path()).unwrap();

    let bounds = manager.bounds("upload").unwrap();
    assert_eq!(bounds, BoundingBox::new(-5.0, 40.0, 3.0, 44.0));
}

#[test]
fn test_load_geojson_multipolygon_bounds() {
    let file = write_geojson(
        r#"{"type": "MultiPolygon", "coordinates": [
            [[[0, 0], [1, 0], [1, 1], [0, 0]]],
            [[[10, 10], [12, 10], [12, 13], [10, 10]]]
        ]}"#,
    );

    let mut manager = GeometryManager::new();
    manager.load_geojson("islands", file.path()).unwrap();
    assert_eq!(
        manager.bounds("islands").unwrap(),
        BoundingBox::new(0.0, 0.0, 12.0, 13.0)
    );
}

#[test]
fn test_load_geojson_rejects_projected_coordinates() {
    let file = write_geojson(
        r#"{"type": "Polygon", "coordinates": [[[500000, 4000000], [510000, 4000000], [510000, 4010000], [500000, 4000000]]]}"#,
    );

    let mut manager = GeometryManager::new();
    let result = manager.load_geojson("utm", file.path());
    assert!(matches!(result, Err(CommonError::InvalidGeometry(_))));
}

#[test]
fn test_load_geojson_unsupported_type() {
    let file = write_geojson(r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#);

    let mut manager = GeometryManager::new();
    let result = manager.load_geojson("line", file.path());
    assert!(matches!(result, Err(CommonError::GeoJson(_))));
}

#[test]
fn test_load_geojson_missing_file() {
    let mut manager = GeometryManager::new();
    let result = manager.load_geojson("missing", "/nonexistent/region.geojson");
    assert!(matches!(result, Err(CommonError::Io(_))));
}
