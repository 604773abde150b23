//! Dataset descriptors and the dataset registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use climate_common::years::{current_year, year_window};
use climate_common::YearRange;

use crate::error::{CatalogError, Result};
use crate::index::IndexCategory;

/// Climate variables a dataset maps onto source band names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    Precipitation,
    MaxTemperature,
    MinTemperature,
}

impl Variable {
    /// The index category this variable feeds.
    pub fn category(&self) -> IndexCategory {
        match self {
            Variable::Precipitation => IndexCategory::Precipitation,
            Variable::MaxTemperature | Variable::MinTemperature => IndexCategory::Temperature,
        }
    }
}

/// Finest time step a dataset natively provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalResolution {
    #[default]
    Daily,
    Monthly,
    Yearly,
}

impl std::fmt::Display for TemporalResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TemporalResolution::Daily => "daily",
            TemporalResolution::Monthly => "monthly",
            TemporalResolution::Yearly => "yearly",
        };
        write!(f, "{}", s)
    }
}

/// Unvalidated dataset configuration, as stored in custom dataset files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    /// Source collection identifier in the compute service
    pub id: String,
    pub precip_key: String,
    pub tmax_key: String,
    pub tmin_key: String,
    /// Multiplier from native precipitation units to millimetres
    pub precip_conversion: f64,
    /// Offset from native temperature units to degrees Celsius
    pub temp_conversion: f64,
    pub start_year: i32,
    /// Defaults to the current year
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub region_coverage: String,
    #[serde(default)]
    pub spatial_resolution: String,
    #[serde(default)]
    pub temporal_resolution: TemporalResolution,
}

/// Validated dataset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetSpec", into = "DatasetSpec")]
pub struct DatasetDescriptor {
    source_id: String,
    precip_key: String,
    tmax_key: String,
    tmin_key: String,
    precip_scale: f64,
    temp_offset: f64,
    years: YearRange,
    display_name: String,
    description: String,
    coverage: String,
    spatial_resolution: String,
    temporal_resolution: TemporalResolution,
}

impl DatasetDescriptor {
    /// Validate a spec into a descriptor.
    pub fn new(spec: DatasetSpec) -> Result<Self> {
        let required = [
            ("id", &spec.id),
            ("precip_key", &spec.precip_key),
            ("tmax_key", &spec.tmax_key),
            ("tmin_key", &spec.tmin_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::InvalidDescriptor(format!(
                    "field '{}' must not be empty",
                    field
                )));
            }
        }

        if !spec.precip_conversion.is_finite() || spec.precip_conversion == 0.0 {
            return Err(CatalogError::InvalidDescriptor(
                "precip_conversion must be a non-zero number".to_string(),
            ));
        }
        if !spec.temp_conversion.is_finite() {
            return Err(CatalogError::InvalidDescriptor(
                "temp_conversion must be a finite number".to_string(),
            ));
        }

        let end_year = spec.end_year.unwrap_or_else(current_year);
        for year in [spec.start_year, end_year] {
            if year_window(year).is_none() {
                return Err(CatalogError::InvalidDescriptor(format!(
                    "year {} is outside the supported calendar",
                    year
                )));
            }
        }
        let years = YearRange::new(spec.start_year, end_year).map_err(|_| {
            CatalogError::InvalidDescriptor(format!(
                "year range is inverted: {} > {}",
                spec.start_year, end_year
            ))
        })?;

        Ok(Self {
            display_name: if spec.display_name.is_empty() {
                spec.id.clone()
            } else {
                spec.display_name
            },
            source_id: spec.id,
            precip_key: spec.precip_key,
            tmax_key: spec.tmax_key,
            tmin_key: spec.tmin_key,
            precip_scale: spec.precip_conversion,
            temp_offset: spec.temp_conversion,
            years,
            description: spec.description,
            coverage: spec.region_coverage,
            spatial_resolution: spec.spatial_resolution,
            temporal_resolution: spec.temporal_resolution,
        })
    }

    /// Source collection identifier in the compute service.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Band name for a climate variable.
    pub fn variable_key(&self, variable: Variable) -> &str {
        match variable {
            Variable::Precipitation => &self.precip_key,
            Variable::MaxTemperature => &self.tmax_key,
            Variable::MinTemperature => &self.tmin_key,
        }
    }

    /// Multiplier converting native precipitation to millimetres.
    pub fn precip_scale(&self) -> f64 {
        self.precip_scale
    }

    /// Offset converting native temperature to degrees Celsius.
    pub fn temp_offset(&self) -> f64 {
        self.temp_offset
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn coverage(&self) -> &str {
        &self.coverage
    }

    pub fn spatial_resolution(&self) -> &str {
        &self.spatial_resolution
    }

    pub fn temporal_resolution(&self) -> TemporalResolution {
        self.temporal_resolution
    }

    pub fn supports_daily(&self) -> bool {
        self.temporal_resolution == TemporalResolution::Daily
    }
}

impl TryFrom<DatasetSpec> for DatasetDescriptor {
    type Error = CatalogError;

    fn try_from(spec: DatasetSpec) -> Result<Self> {
        DatasetDescriptor::new(spec)
    }
}

impl From<DatasetDescriptor> for DatasetSpec {
    fn from(d: DatasetDescriptor) -> Self {
        DatasetSpec {
            id: d.source_id,
            precip_key: d.precip_key,
            tmax_key: d.tmax_key,
            tmin_key: d.tmin_key,
            precip_conversion: d.precip_scale,
            temp_conversion: d.temp_offset,
            start_year: d.years.start(),
            end_year: Some(d.years.end()),
            display_name: d.display_name,
            description: d.description,
            region_coverage: d.coverage,
            spatial_resolution: d.spatial_resolution,
            temporal_resolution: d.temporal_resolution,
        }
    }
}

/// Display summary of a dataset, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub region_coverage: String,
    pub spatial_resolution: String,
    pub temporal_resolution: TemporalResolution,
    pub year_range: YearRange,
    pub source_id: String,
}

/// Registry of datasets keyed by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: IndexMap<String, DatasetDescriptor>,
    /// Entries before this position are built-ins
    builtin_count: usize,
}

impl DatasetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in datasets.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, descriptor) in crate::builtin::datasets() {
            registry.datasets.insert(name.to_string(), descriptor);
        }
        registry.builtin_count = registry.datasets.len();
        debug!(count = registry.builtin_count, "Registered built-in datasets");
        registry
    }

    /// Add a dataset. Names are unique.
    pub fn register(&mut self, name: &str, descriptor: DatasetDescriptor) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidDescriptor(
                "dataset name must not be empty".to_string(),
            ));
        }
        if self.datasets.contains_key(name) {
            return Err(CatalogError::DuplicateDataset(name.to_string()));
        }

        info!(
            dataset = %name,
            source = %descriptor.source_id(),
            years = %descriptor.years(),
            "Registered dataset"
        );
        self.datasets.insert(name.to_string(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&DatasetDescriptor> {
        self.datasets
            .get(name)
            .ok_or_else(|| CatalogError::UnknownDataset(name.to_string()))
    }

    /// Dataset names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Datasets registered after the built-ins.
    pub fn custom(&self) -> impl Iterator<Item = (&str, &DatasetDescriptor)> {
        self.datasets
            .iter()
            .skip(self.builtin_count)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn info(&self, name: &str) -> Result<DatasetInfo> {
        let d = self.get(name)?;
        Ok(DatasetInfo {
            name: name.to_string(),
            display_name: d.display_name.clone(),
            description: d.description.clone(),
            region_coverage: d.coverage.clone(),
            spatial_resolution: d.spatial_resolution.clone(),
            temporal_resolution: d.temporal_resolution,
            year_range: d.years,
            source_id: d.source_id.clone(),
        })
    }
}
