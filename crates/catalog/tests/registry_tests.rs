//! Tests for the dataset and index registries and custom-entry persistence.

use catalog::{
    Catalog, CatalogError, Comparison, CustomStore, DatasetDescriptor, DatasetRegistry,
    DatasetSpec, IndexCategory, IndexDescriptor, IndexRecipe, IndexRegistry, IndexSpec,
    TemporalResolution, Variable,
};
use climate_common::Palette;

fn chirps_spec() -> DatasetSpec {
    DatasetSpec {
        id: "UCSB-CHG/CHIRPS/DAILY".to_string(),
        precip_key: "precipitation".to_string(),
        tmax_key: "tmax".to_string(),
        tmin_key: "tmin".to_string(),
        precip_conversion: 1.0,
        temp_conversion: 0.0,
        start_year: 1981,
        end_year: Some(2024),
        display_name: "CHIRPS Daily".to_string(),
        description: "Rainfall estimates from rain gauge and satellite observations".to_string(),
        region_coverage: "50°S-50°N".to_string(),
        spatial_resolution: "0.05°".to_string(),
        temporal_resolution: TemporalResolution::Daily,
    }
}

fn heavy_rain_spec() -> IndexSpec {
    IndexSpec {
        category: IndexCategory::Precipitation,
        description: "Annual count of days with precipitation ≥10mm".to_string(),
        units: "days".to_string(),
        requires_daily: true,
        min_vis_value: 0.0,
        max_vis_value: 100.0,
        palette: Palette::from_hex(&["#deebf7", "#3182bd"]).unwrap(),
        recipe: IndexRecipe::CountDays {
            variable: Variable::Precipitation,
            comparison: Comparison::GreaterOrEqual,
            threshold: 10.0,
        },
    }
}

// ============================================================================
// Dataset registry
// ============================================================================

#[test]
fn test_register_then_get_returns_same_descriptor() {
    let mut registry = DatasetRegistry::new();
    let descriptor = DatasetDescriptor::new(chirps_spec()).unwrap();
    registry.register("CHIRPS", descriptor.clone()).unwrap();

    assert_eq!(registry.get("CHIRPS").unwrap(), &descriptor);
}

#[test]
fn test_register_duplicate_dataset() {
    let mut registry = DatasetRegistry::with_builtins();
    let result = registry.register("ERA5", DatasetDescriptor::new(chirps_spec()).unwrap());
    assert!(matches!(result, Err(CatalogError::DuplicateDataset(ref n)) if n == "ERA5"));
}

#[test]
fn test_get_unknown_dataset() {
    let registry = DatasetRegistry::with_builtins();
    assert!(matches!(
        registry.get("FAKE"),
        Err(CatalogError::UnknownDataset(_))
    ));
}

#[test]
fn test_list_in_registration_order_and_idempotent() {
    let mut registry = DatasetRegistry::with_builtins();
    registry
        .register("CHIRPS", DatasetDescriptor::new(chirps_spec()).unwrap())
        .unwrap();

    let first = registry.list();
    let second = registry.list();
    assert_eq!(first, vec!["ERA5", "PRISM", "DAYMET", "CHIRPS"]);
    assert_eq!(first, second);
}

#[test]
fn test_dataset_info() {
    let registry = DatasetRegistry::with_builtins();
    let info = registry.info("PRISM").unwrap();
    assert_eq!(info.display_name, "PRISM Climate Data");
    assert_eq!(info.source_id, "OREGONSTATE/PRISM/AN81d");
    assert_eq!(info.year_range.start(), 1981);
}

// ============================================================================
// Index registry
// ============================================================================

#[test]
fn test_register_duplicate_index() {
    let mut registry = IndexRegistry::with_builtins();
    let result = registry.register(
        IndexCategory::Precipitation,
        "Number of wet days",
        IndexDescriptor::new(heavy_rain_spec()).unwrap(),
    );
    assert!(matches!(result, Err(CatalogError::DuplicateIndex { .. })));
}

#[test]
fn test_get_index_wrong_category() {
    let registry = IndexRegistry::with_builtins();
    assert!(registry
        .get(IndexCategory::Temperature, "Frost days")
        .is_ok());
    assert!(matches!(
        registry.get(IndexCategory::Precipitation, "Frost days"),
        Err(CatalogError::UnknownIndex { .. })
    ));
}

#[test]
fn test_list_filters_by_category() {
    let registry = IndexRegistry::with_builtins();
    let temperature: Vec<&str> = registry
        .list(Some(IndexCategory::Temperature))
        .into_iter()
        .map(|(name, _)| name)
        .collect();

    assert_eq!(
        temperature,
        vec![
            "Annual maximum temperature",
            "Annual minimum temperature",
            "Frost days",
            "Summer days"
        ]
    );
    assert_eq!(registry.list(None).len(), 8);
    assert_eq!(registry.list(None), registry.list(None));
}

#[test]
fn test_invalid_palette_rejected_from_json() {
    let json = r##"{
        "category": "Precipitation",
        "palette": ["#ffffff"],
        "recipe": {"kind": "sum", "variable": "precipitation"}
    }"##;
    let result: Result<IndexDescriptor, _> = serde_json::from_str(json);
    assert!(result.is_err());
}

// ============================================================================
// Custom entry persistence
// ============================================================================

#[test]
fn test_custom_entries_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = CustomStore::new(dir.path());

    let mut catalog = Catalog::with_builtins();
    catalog
        .datasets_mut()
        .register("CHIRPS", DatasetDescriptor::new(chirps_spec()).unwrap())
        .unwrap();
    catalog
        .indices_mut()
        .register(
            IndexCategory::Precipitation,
            "Heavy rain days",
            IndexDescriptor::new(heavy_rain_spec()).unwrap(),
        )
        .unwrap();
    store.save(&catalog).unwrap();

    let mut reloaded = Catalog::with_builtins();
    let loaded = store.load_into(&mut reloaded).unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(
        reloaded.datasets().get("CHIRPS").unwrap(),
        catalog.datasets().get("CHIRPS").unwrap()
    );
    assert_eq!(
        reloaded
            .indices()
            .get(IndexCategory::Precipitation, "Heavy rain days")
            .unwrap(),
        catalog
            .indices()
            .get(IndexCategory::Precipitation, "Heavy rain days")
            .unwrap()
    );
}

#[test]
fn test_builtins_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = CustomStore::new(dir.path());
    store.save(&Catalog::with_builtins()).unwrap();

    let contents = std::fs::read_to_string(dir.path().join("custom_datasets.json")).unwrap();
    assert_eq!(contents.trim(), "{}");
}

#[test]
fn test_load_from_missing_directory_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = CustomStore::new(dir.path().join("never-created"));
    let mut catalog = Catalog::with_builtins();
    assert_eq!(store.load_into(&mut catalog).unwrap(), 0);
}

#[test]
fn test_load_accepts_legacy_dataset_format() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("custom_datasets.json"),
        r#"{
            "TERRACLIMATE": {
                "id": "IDAHO_EPSCOR/TERRACLIMATE",
                "precip_key": "pr",
                "tmax_key": "tmmx",
                "tmin_key": "tmmn",
                "precip_conversion": 1,
                "temp_conversion": 0,
                "start_year": 1958,
                "end_year": 2022,
                "temporal_resolution": "monthly"
            }
        }"#,
    )
    .unwrap();

    let mut catalog = Catalog::with_builtins();
    CustomStore::new(dir.path()).load_into(&mut catalog).unwrap();

    let terraclimate = catalog.datasets().get("TERRACLIMATE").unwrap();
    assert_eq!(terraclimate.temporal_resolution(), TemporalResolution::Monthly);
    assert!(!terraclimate.supports_daily());
}

#[test]
fn test_load_rejects_inverted_years() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("custom_datasets.json"),
        r#"{"BAD": {"id": "X", "precip_key": "p", "tmax_key": "a", "tmin_key": "b",
                    "precip_conversion": 1, "temp_conversion": 0,
                    "start_year": 2020, "end_year": 2000}}"#,
    )
    .unwrap();

    let mut catalog = Catalog::with_builtins();
    let result = CustomStore::new(dir.path()).load_into(&mut catalog);
    assert!(matches!(result, Err(CatalogError::InvalidDescriptor(_))));
}
