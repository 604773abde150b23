//! Tests for request resolution ordering and outcomes.

use catalog::{
    Catalog, CatalogError, DatasetDescriptor, DatasetRegistry, DatasetSpec, IndexRegistry,
    TemporalResolution,
};
use climate_common::{BoundingBox, Geometry};

fn era5_spec(resolution: TemporalResolution) -> DatasetSpec {
    DatasetSpec {
        id: "ECMWF/ERA5_LAND/DAILY_AGGR".to_string(),
        precip_key: "total_precipitation_sum".to_string(),
        tmax_key: "temperature_2m_max".to_string(),
        tmin_key: "temperature_2m_min".to_string(),
        precip_conversion: 1000.0,
        temp_conversion: -273.15,
        start_year: 1979,
        end_year: Some(2023),
        display_name: "ERA5 Land Reanalysis".to_string(),
        description: String::new(),
        region_coverage: "Global".to_string(),
        spatial_resolution: "0.1°".to_string(),
        temporal_resolution: resolution,
    }
}

/// ERA5 over 1979-2023 plus a monthly-only dataset, with the built-in indices.
fn catalog() -> Catalog {
    let mut datasets = DatasetRegistry::new();
    datasets
        .register(
            "ERA5",
            DatasetDescriptor::new(era5_spec(TemporalResolution::Daily)).unwrap(),
        )
        .unwrap();
    datasets
        .register(
            "ERA5_MONTHLY",
            DatasetDescriptor::new(era5_spec(TemporalResolution::Monthly)).unwrap(),
        )
        .unwrap();
    Catalog::new(datasets, IndexRegistry::with_builtins())
}

fn region() -> Geometry {
    Geometry::Rectangle(BoundingBox::new(-10.0, 35.0, 30.0, 60.0))
}

const TMAX: &str = "Annual maximum temperature";

// ============================================================================
// Successful resolution
// ============================================================================

#[test]
fn test_valid_request_resolves_exact_fields() {
    let catalog = catalog();
    let geometry = region();
    let request = catalog
        .resolve("ERA5", "Temperature", TMAX, Some(&geometry), 2010, 2020)
        .unwrap();

    assert_eq!(request.dataset_name(), "ERA5");
    assert_eq!(request.category().as_str(), "Temperature");
    assert_eq!(request.index_name(), TMAX);
    assert_eq!(request.geometry(), &geometry);
    assert_eq!(request.start_year(), 2010);
    assert_eq!(request.end_year(), 2020);
    assert_eq!(request.dataset(), catalog.datasets().get("ERA5").unwrap());
}

#[test]
fn test_dataset_bounds_are_inclusive() {
    let catalog = catalog();
    let geometry = region();
    let request = catalog
        .resolve("ERA5", "Temperature", TMAX, Some(&geometry), 1979, 2023)
        .unwrap();
    assert_eq!(request.years().len(), 45);
}

#[test]
fn test_single_year_request() {
    let catalog = catalog();
    let request = catalog
        .resolve("ERA5", "Precipitation", "Frost days", Some(&region()), 2000, 2000);
    // Frost days is a temperature index
    assert!(matches!(request, Err(CatalogError::UnknownIndex { .. })));

    let request = catalog
        .resolve("ERA5", "Temperature", "Frost days", Some(&region()), 2000, 2000)
        .unwrap();
    assert_eq!(request.years().len(), 1);
}

// ============================================================================
// Failures, in check order
// ============================================================================

#[test]
fn test_unknown_dataset() {
    let catalog = catalog();
    let result = catalog.resolve("FAKE", "Temperature", TMAX, Some(&region()), 2010, 2020);
    assert!(matches!(result, Err(CatalogError::UnknownDataset(ref d)) if d == "FAKE"));
}

#[test]
fn test_unknown_dataset_reported_before_everything_else() {
    let catalog = catalog();
    let result = catalog.resolve("FAKE", "Nonsense", "No index", None, 2030, 2000);
    assert!(matches!(result, Err(CatalogError::UnknownDataset(_))));
}

#[test]
fn test_unknown_category_is_unknown_index() {
    let catalog = catalog();
    let result = catalog.resolve("ERA5", "temperature", TMAX, Some(&region()), 2010, 2020);
    assert!(matches!(result, Err(CatalogError::UnknownIndex { .. })));
}

#[test]
fn test_inverted_range_regardless_of_other_fields() {
    let catalog = catalog();
    // Out of dataset bounds, no geometry and a monthly dataset would all fail later
    let result = catalog.resolve("ERA5_MONTHLY", "Temperature", TMAX, None, 2035, 2030);
    assert!(matches!(
        result,
        Err(CatalogError::InvalidRange {
            start: 2035,
            end: 2030
        })
    ));
}

#[test]
fn test_out_of_bounds_carries_dataset_range() {
    let catalog = catalog();
    let result = catalog.resolve("ERA5", "Temperature", TMAX, Some(&region()), 2030, 2035);
    match result {
        Err(CatalogError::YearRangeOutOfBounds { min, max, .. }) => {
            assert_eq!((min, max), (1979, 2023));
        }
        other => panic!("Expected YearRangeOutOfBounds, got {:?}", other),
    }
}

#[test]
fn test_partially_overlapping_range_is_out_of_bounds() {
    let catalog = catalog();
    let result = catalog.resolve("ERA5", "Temperature", TMAX, Some(&region()), 1975, 1985);
    assert!(matches!(
        result,
        Err(CatalogError::YearRangeOutOfBounds { .. })
    ));
}

#[test]
fn test_daily_index_on_monthly_dataset() {
    let catalog = catalog();
    let result = catalog.resolve(
        "ERA5_MONTHLY",
        "Temperature",
        TMAX,
        Some(&region()),
        2010,
        2020,
    );
    assert!(matches!(
        result,
        Err(CatalogError::UnsupportedResolution { ref resolution, .. }) if resolution == "monthly"
    ));
}

#[test]
fn test_missing_geometry() {
    let catalog = catalog();
    let result = catalog.resolve("ERA5", "Temperature", TMAX, None, 2010, 2020);
    assert!(matches!(result, Err(CatalogError::InvalidGeometry(_))));
}

#[test]
fn test_empty_geometry() {
    let catalog = catalog();
    let degenerate = Geometry::Rectangle(BoundingBox::new(5.0, 5.0, 5.0, 10.0));
    let result = catalog.resolve("ERA5", "Temperature", TMAX, Some(&degenerate), 2010, 2020);
    assert!(matches!(result, Err(CatalogError::InvalidGeometry(_))));
}

#[test]
fn test_error_kinds() {
    let catalog = catalog();
    let err = catalog
        .resolve("ERA5", "Temperature", TMAX, Some(&region()), 2030, 2035)
        .unwrap_err();
    assert_eq!(err.kind(), "YearRangeOutOfBoundsError");
    assert!(err.to_string().contains("1979-2023"));
}
