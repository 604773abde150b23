//! Common test fixtures for climate index tests.
//!
//! Provides pre-defined regions, catalogs and results representing common
//! analysis scenarios.

use serde_json::json;

use analysis::{AnalysisResult, ResultHandle, TemporalPoint, VisParams, YearImage};
use catalog::{
    Catalog, DatasetDescriptor, DatasetRegistry, DatasetSpec, IndexRegistry, RequestDescriptor,
    TemporalResolution,
};
use climate_common::{BoundingBox, Geometry, Palette, YearRange};

/// Common bounding box definitions for testing, as (west, south, east, north).
pub mod bbox {
    /// Default global analysis extent
    pub const GLOBAL: (f64, f64, f64, f64) = (-180.0, -60.0, 180.0, 80.0);

    /// Western Europe
    pub const EUROPE: (f64, f64, f64, f64) = (-10.0, 35.0, 30.0, 60.0);

    /// Roughly 10 km across, small enough to download directly
    pub const SMALL: (f64, f64, f64, f64) = (-105.3, 39.9, -105.2, 40.0);
}

pub fn rectangle((w, s, e, n): (f64, f64, f64, f64)) -> Geometry {
    Geometry::Rectangle(BoundingBox::new(w, s, e, n))
}

pub fn europe() -> Geometry {
    rectangle(bbox::EUROPE)
}

/// ERA5-Land with a fixed 1979-2023 range.
pub fn era5_spec() -> DatasetSpec {
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
        description: "High resolution reanalysis dataset for land surface variables".to_string(),
        region_coverage: "Global".to_string(),
        spatial_resolution: "0.1° (~11km)".to_string(),
        temporal_resolution: TemporalResolution::Daily,
    }
}

/// TerraClimate, a monthly dataset.
pub fn terraclimate_spec() -> DatasetSpec {
    DatasetSpec {
        id: "IDAHO_EPSCOR/TERRACLIMATE".to_string(),
        precip_key: "pr".to_string(),
        tmax_key: "tmmx".to_string(),
        tmin_key: "tmmn".to_string(),
        precip_conversion: 1.0,
        temp_conversion: 0.0,
        start_year: 1958,
        end_year: Some(2022),
        display_name: "TerraClimate".to_string(),
        description: "Monthly climate and climatic water balance".to_string(),
        region_coverage: "Global".to_string(),
        spatial_resolution: "4km".to_string(),
        temporal_resolution: TemporalResolution::Monthly,
    }
}

/// Catalog with `ERA5` (1979-2023, daily), `TERRACLIMATE` (monthly) and the
/// built-in indices.
pub fn test_catalog() -> Catalog {
    let mut datasets = DatasetRegistry::new();
    for (name, spec) in [("ERA5", era5_spec()), ("TERRACLIMATE", terraclimate_spec())] {
        let descriptor = DatasetDescriptor::new(spec).expect("fixture dataset is valid");
        datasets
            .register(name, descriptor)
            .expect("fixture names are unique");
    }
    Catalog::new(datasets, IndexRegistry::with_builtins())
}

/// Resolve a request over western Europe against [`test_catalog`].
pub fn resolve(category: &str, index: &str, start_year: i32, end_year: i32) -> RequestDescriptor {
    test_catalog()
        .resolve("ERA5", category, index, Some(&europe()), start_year, end_year)
        .expect("fixture request resolves")
}

/// A finished three-year analysis with per-year image handles.
pub fn sample_result() -> AnalysisResult {
    let years = [(2018, 31.2), (2019, 32.8), (2020, 33.1)];
    let handle = |year: i32| {
        ResultHandle::new(json!({
            "result": "0",
            "values": {"0": {"functionInvocationValue": {
                "functionName": "Image.clip",
                "arguments": {"input": {"functionInvocationValue": {
                    "functionName": "DateRange",
                    "arguments": {
                        "start": {"constantValue": format!("{}-01-01", year)},
                        "end": {"constantValue": format!("{}-01-01", year + 1)},
                    },
                }}},
            }}},
        }))
    };

    AnalysisResult {
        index: "Annual maximum temperature".to_string(),
        parameter: "Temperature".to_string(),
        dataset: "ERA5".to_string(),
        time_range: YearRange::new(2018, 2020).expect("valid fixture range"),
        units: "°C".to_string(),
        temporal_data: years
            .iter()
            .map(|&(year, value)| TemporalPoint { year, value })
            .collect(),
        data: Some(handle(2020)),
        year_images: years
            .iter()
            .map(|&(year, _)| YearImage {
                year,
                handle: handle(year),
            })
            .collect(),
        vis_params: VisParams {
            min: -10.0,
            max: 45.0,
            palette: Palette::from_hex(&["#2166ac", "#f7f7f7", "#b2182b"])
                .expect("valid fixture palette"),
            opacity: 0.8,
        },
        geometry: rectangle(bbox::SMALL),
        warnings: Vec::new(),
    }
}
