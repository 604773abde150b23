//! Built-in datasets and climate indices.

use climate_common::Palette;

use crate::dataset::{DatasetDescriptor, DatasetSpec, TemporalResolution, Variable};
use crate::index::{Comparison, IndexCategory, IndexDescriptor, IndexRecipe, IndexSpec};

/// Names of the built-in datasets, in registration order.
pub const BUILTIN_DATASETS: &[&str] = &["ERA5", "PRISM", "DAYMET"];

const BLUES: &[&str] = &["#deebf7", "#9ecae1", "#3182bd"];
const REDS: &[&str] = &["#fee5d9", "#fcae91", "#fb6a4a", "#de2d26", "#a50f15"];
const DIVERGING: &[&str] = &["#2166ac", "#67a9cf", "#f7f7f7", "#fddbc7", "#ef8a62", "#b2182b"];

fn daily_dataset(
    id: &str,
    keys: (&str, &str, &str),
    precip_conversion: f64,
    temp_conversion: f64,
    start_year: i32,
    text: (&str, &str, &str, &str),
) -> DatasetSpec {
    let (precip_key, tmax_key, tmin_key) = keys;
    let (display_name, description, region_coverage, spatial_resolution) = text;
    DatasetSpec {
        id: id.to_string(),
        precip_key: precip_key.to_string(),
        tmax_key: tmax_key.to_string(),
        tmin_key: tmin_key.to_string(),
        precip_conversion,
        temp_conversion,
        start_year,
        end_year: None,
        display_name: display_name.to_string(),
        description: description.to_string(),
        region_coverage: region_coverage.to_string(),
        spatial_resolution: spatial_resolution.to_string(),
        temporal_resolution: TemporalResolution::Daily,
    }
}

/// Built-in dataset descriptors. End years track the current year.
pub fn datasets() -> Vec<(&'static str, DatasetDescriptor)> {
    let specs = [
        (
            "ERA5",
            daily_dataset(
                "ECMWF/ERA5_LAND/DAILY_AGGR",
                ("total_precipitation_sum", "temperature_2m_max", "temperature_2m_min"),
                1000.0,  // m -> mm
                -273.15, // K -> C
                1980,
                (
                    "ERA5 Land Reanalysis",
                    "High resolution reanalysis dataset for land surface variables",
                    "Global",
                    "0.1° (~11km)",
                ),
            ),
        ),
        (
            "PRISM",
            daily_dataset(
                "OREGONSTATE/PRISM/AN81d",
                ("ppt", "tmax", "tmin"),
                1.0,
                0.0,
                1981,
                (
                    "PRISM Climate Data",
                    "High-resolution climate data for the contiguous United States",
                    "Contiguous United States",
                    "4km",
                ),
            ),
        ),
        (
            "DAYMET",
            daily_dataset(
                "NASA/ORNL/DAYMET_V4",
                ("prcp", "tmax", "tmin"),
                1.0,
                0.0,
                1980,
                (
                    "DAYMET Version 4",
                    "Daily surface weather and climatological data",
                    "North America",
                    "1km",
                ),
            ),
        ),
    ];

    specs
        .into_iter()
        .filter_map(|(name, spec)| DatasetDescriptor::new(spec).ok().map(|d| (name, d)))
        .collect()
}

fn index(
    category: IndexCategory,
    description: &str,
    units: &str,
    vis: (f64, f64),
    palette: &[&str],
    recipe: IndexRecipe,
) -> Option<IndexDescriptor> {
    let palette = Palette::from_hex(palette).ok()?;
    IndexDescriptor::new(IndexSpec {
        category,
        description: description.to_string(),
        units: units.to_string(),
        requires_daily: true,
        min_vis_value: vis.0,
        max_vis_value: vis.1,
        palette,
        recipe,
    })
    .ok()
}

/// Built-in index descriptors: four precipitation and four temperature indices.
pub fn indices() -> Vec<(&'static str, IndexDescriptor)> {
    use IndexCategory::{Precipitation, Temperature};
    use Variable::{MaxTemperature, MinTemperature};

    let precip = Variable::Precipitation;

    let entries = [
        (
            "Annual total precipitation",
            index(
                Precipitation,
                "Total precipitation over the year",
                "mm/year",
                (0.0, 3000.0),
                BLUES,
                IndexRecipe::Sum { variable: precip },
            ),
        ),
        (
            "Annual maximum 1-day precipitation",
            index(
                Precipitation,
                "Maximum 1-day precipitation amount",
                "mm/day",
                (0.0, 150.0),
                BLUES,
                IndexRecipe::Max { variable: precip },
            ),
        ),
        (
            "Number of wet days",
            index(
                Precipitation,
                "Annual count of days with precipitation ≥1mm",
                "days",
                (0.0, 365.0),
                REDS,
                IndexRecipe::CountDays {
                    variable: precip,
                    comparison: Comparison::GreaterOrEqual,
                    threshold: 1.0,
                },
            ),
        ),
        (
            "Consecutive dry days",
            index(
                Precipitation,
                "Maximum number of consecutive dry days (precipitation <1mm)",
                "days",
                (0.0, 100.0),
                REDS,
                IndexRecipe::LongestSpell {
                    variable: precip,
                    comparison: Comparison::LessThan,
                    threshold: 1.0,
                },
            ),
        ),
        (
            "Annual maximum temperature",
            index(
                Temperature,
                "Maximum value of daily maximum temperature",
                "°C",
                (-10.0, 45.0),
                DIVERGING,
                IndexRecipe::Max {
                    variable: MaxTemperature,
                },
            ),
        ),
        (
            "Annual minimum temperature",
            index(
                Temperature,
                "Minimum value of daily minimum temperature",
                "°C",
                (-30.0, 25.0),
                DIVERGING,
                IndexRecipe::Min {
                    variable: MinTemperature,
                },
            ),
        ),
        (
            "Frost days",
            index(
                Temperature,
                "Annual count of days with minimum temperature < 0°C",
                "days",
                (0.0, 365.0),
                REDS,
                IndexRecipe::CountDays {
                    variable: MinTemperature,
                    comparison: Comparison::LessThan,
                    threshold: 0.0,
                },
            ),
        ),
        (
            "Summer days",
            index(
                Temperature,
                "Annual count of days with maximum temperature > 25°C",
                "days",
                (0.0, 365.0),
                BLUES,
                IndexRecipe::CountDays {
                    variable: MaxTemperature,
                    comparison: Comparison::GreaterThan,
                    threshold: 25.0,
                },
            ),
        ),
    ];

    entries
        .into_iter()
        .filter_map(|(name, d)| d.map(|d| (name, d)))
        .collect()
}
