//! End-to-end tests of the CLI commands against the scripted compute service.

use std::path::Path;
use std::sync::Arc;

use analysis::{AnalysisResult, ServiceConfig};
use climate_cli::cli::{AnalyzeArgs, ExportArgs, ListTarget, RegisterTarget};
use climate_cli::commands::{self, Context, Summary};
use climate_cli::exit::error_kind;
use export::{ExportConfig, ExportOutcome};
use test_utils::FakeComputeService;

fn context(dir: &Path) -> Context {
    Context {
        config_dir: dir.join("config"),
        service: ServiceConfig::default(),
        export: ExportConfig {
            export_dir: dir.join("exports"),
            ..Default::default()
        },
    }
}

fn analyze_args(dataset: &str, index: &str, output: Option<&Path>) -> AnalyzeArgs {
    AnalyzeArgs {
        dataset: dataset.to_string(),
        parameter: "Temperature".to_string(),
        index: index.to_string(),
        start_year: 2010,
        end_year: 2012,
        bounds: Some(vec![-105.3, 39.9, -105.2, 40.0]),
        geojson: None,
        output: output.map(Path::to_path_buf),
        concurrency: None,
    }
}

// ============================================================================
// analyze
// ============================================================================

#[test]
fn test_analyze_writes_result_document() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let output = dir.path().join("result.json");
    let args = analyze_args("ERA5", "Summer days", Some(&output));

    let catalog = commands::load_catalog(&ctx.config_dir).unwrap();
    let request = commands::resolve_request(&catalog, &args).unwrap();
    let service = Arc::new(FakeComputeService::new().with_linear_series(40.0, 2.0));
    let result = tokio_test::block_on(commands::analyze(&ctx, service, &request, &args)).unwrap();

    let years: Vec<i32> = result.temporal_data.iter().map(|p| p.year).collect();
    assert_eq!(years, vec![2010, 2011, 2012]);

    let saved: AnalysisResult =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(saved.temporal_data, result.temporal_data);
    assert_eq!(saved.year_images.len(), 3);
    assert_eq!(saved.vis_params.palette, result.vis_params.palette);

    let summary = Summary(&result).to_string();
    assert!(summary.contains("  Dataset: ERA5"));
    assert!(summary.contains("  Data Points: 3"));
    assert!(summary.contains("  Mean Value: 62.00 days"));
    assert!(summary.contains("  Trend: +2.000 days per year"));
}

#[test]
fn test_unknown_dataset_is_reported_by_kind() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = commands::load_catalog(&context(dir.path()).config_dir).unwrap();

    let err = commands::resolve_request(&catalog, &analyze_args("FAKE", "Frost days", None))
        .unwrap_err();
    assert_eq!(error_kind(&err), "UnknownDatasetError");
}

#[test]
fn test_invalid_bounds_are_reported_by_kind() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = commands::load_catalog(&context(dir.path()).config_dir).unwrap();
    let mut args = analyze_args("ERA5", "Frost days", None);
    args.bounds = Some(vec![10.0, 0.0, -10.0, 5.0]);

    let err = commands::resolve_request(&catalog, &args).unwrap_err();
    assert_eq!(error_kind(&err), "InvalidBoundsError");
}

#[test]
fn test_default_bounds_are_global() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = commands::load_catalog(&context(dir.path()).config_dir).unwrap();
    let mut args = analyze_args("ERA5", "Frost days", None);
    args.bounds = None;

    let request = commands::resolve_request(&catalog, &args).unwrap();
    let bounds = request.geometry().bounds().unwrap();
    assert_eq!(bounds.to_list(), [-180.0, -60.0, 180.0, 80.0]);
}

// ============================================================================
// export
// ============================================================================

#[test]
fn test_export_csv_from_result_file() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let input = dir.path().join("result.json");
    std::fs::write(
        &input,
        serde_json::to_string(&test_utils::sample_result()).unwrap(),
    )
    .unwrap();

    let args = ExportArgs {
        format: "CSV".to_string(),
        scope: "all".to_string(),
        input,
        export_dir: None,
    };
    let service = Arc::new(FakeComputeService::new());
    let outcomes = tokio_test::block_on(commands::export(&ctx, service, &args)).unwrap();

    match &outcomes[0] {
        ExportOutcome::Local { path, .. } => {
            assert!(path.starts_with(dir.path().join("exports/CSV")));
            let text = std::fs::read_to_string(path).unwrap();
            assert_eq!(text.lines().count(), 4);
        }
        other => panic!("expected a local export, got {:?}", other),
    }
}

#[test]
fn test_export_rejects_unknown_scope() {
    let dir = tempfile::tempdir().unwrap();
    let args = ExportArgs {
        format: "GeoTIFF".to_string(),
        scope: "some".to_string(),
        input: dir.path().join("missing.json"),
        export_dir: None,
    };

    let err = tokio_test::block_on(commands::export(
        &context(dir.path()),
        Arc::new(FakeComputeService::new()),
        &args,
    ))
    .unwrap_err();
    assert_eq!(error_kind(&err), "UnsupportedScopeError");
}

#[test]
fn test_export_input_errors_keep_kind_and_context() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(dir.path());
    let service = Arc::new(FakeComputeService::new());
    let mut args = ExportArgs {
        format: "CSV".to_string(),
        scope: "current".to_string(),
        input: dir.path().join("missing.json"),
        export_dir: None,
    };

    let err = tokio_test::block_on(commands::export(&ctx, service.clone(), &args)).unwrap_err();
    assert_eq!(error_kind(&err), "IoError");
    assert!(format!("{:#}", err).starts_with("Failed to read"));

    args.input = dir.path().join("garbled.json");
    std::fs::write(&args.input, "{ not json").unwrap();
    let err = tokio_test::block_on(commands::export(&ctx, service, &args)).unwrap_err();
    assert_eq!(error_kind(&err), "InvalidInputError");
    assert!(format!("{:#}", err).contains("is not an analysis result"));
}

// ============================================================================
// list / register / help
// ============================================================================

#[test]
fn test_list_datasets_in_registration_order() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = commands::load_catalog(dir.path()).unwrap();

    let text = commands::list(&catalog, ListTarget::Datasets, None).unwrap();
    let names: Vec<&str> = text
        .lines()
        .skip(1)
        .filter_map(|l| l.trim().split(':').next())
        .collect();
    assert_eq!(names, vec!["ERA5", "PRISM", "DAYMET"]);
}

#[test]
fn test_list_indices_by_category() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = commands::load_catalog(dir.path()).unwrap();

    let text = commands::list(&catalog, ListTarget::Indices, Some("Precipitation")).unwrap();
    assert!(text.starts_with("Available Precipitation indices:"));
    assert!(text.contains("Consecutive dry days"));
    assert!(!text.contains("Frost days"));

    let err = commands::list(&catalog, ListTarget::Indices, Some("temperature")).unwrap_err();
    assert_eq!(error_kind(&err), "UnknownCategoryError");
}

#[test]
fn test_register_dataset_persists() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("chirps.json");
    std::fs::write(
        &file,
        r#"{
            "id": "UCSB-CHG/CHIRPS/DAILY",
            "precip_key": "precipitation",
            "tmax_key": "none",
            "tmin_key": "none",
            "precip_conversion": 1.0,
            "temp_conversion": 0.0,
            "start_year": 1981,
            "end_year": 2023,
            "display_name": "CHIRPS",
            "temporal_resolution": "daily"
        }"#,
    )
    .unwrap();

    commands::register(dir.path(), RegisterTarget::Dataset, "CHIRPS", &file).unwrap();

    let catalog = commands::load_catalog(dir.path()).unwrap();
    assert_eq!(
        catalog.datasets().list(),
        vec!["ERA5", "PRISM", "DAYMET", "CHIRPS"]
    );

    let err = commands::register(dir.path(), RegisterTarget::Dataset, "CHIRPS", &file).unwrap_err();
    assert_eq!(error_kind(&err), "DuplicateDatasetError");
}

#[test]
fn test_help_for_command() {
    let text = commands::help(Some("export")).unwrap();
    assert!(text.contains("--input"));

    assert!(commands::help(Some("nonsense")).is_err());
    assert!(commands::help(None).unwrap().contains("analyze"));
}
