//! Request resolution against the dataset and index registries.

use serde::Serialize;
use tracing::debug;

use climate_common::{Geometry, YearRange};

use crate::dataset::{DatasetDescriptor, DatasetRegistry};
use crate::error::{CatalogError, Result};
use crate::index::{IndexCategory, IndexDescriptor, IndexRegistry};

/// The dataset and index registries, built once at start-up and passed by
/// reference to whatever needs them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    datasets: DatasetRegistry,
    indices: IndexRegistry,
}

impl Catalog {
    pub fn new(datasets: DatasetRegistry, indices: IndexRegistry) -> Self {
        Self { datasets, indices }
    }

    /// Catalog holding the built-in datasets and indices.
    pub fn with_builtins() -> Self {
        Self::new(DatasetRegistry::with_builtins(), IndexRegistry::with_builtins())
    }

    pub fn datasets(&self) -> &DatasetRegistry {
        &self.datasets
    }

    pub fn datasets_mut(&mut self) -> &mut DatasetRegistry {
        &mut self.datasets
    }

    pub fn indices(&self) -> &IndexRegistry {
        &self.indices
    }

    pub fn indices_mut(&mut self) -> &mut IndexRegistry {
        &mut self.indices
    }

    /// Validate an analysis request and produce its resolved descriptor.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// dataset, index, year ordering, dataset coverage, temporal resolution,
    /// geometry. `category` is matched exactly; an unknown category is an
    /// unknown index.
    pub fn resolve(
        &self,
        dataset_name: &str,
        category: &str,
        index_name: &str,
        geometry: Option<&Geometry>,
        start_year: i32,
        end_year: i32,
    ) -> Result<RequestDescriptor> {
        let dataset = self.datasets.get(dataset_name)?;

        let unknown_index = || CatalogError::UnknownIndex {
            category: category.to_string(),
            name: index_name.to_string(),
        };
        let parsed_category: IndexCategory = category.parse().map_err(|_| unknown_index())?;
        let index = self.indices.get(parsed_category, index_name)?;

        let years = YearRange::new(start_year, end_year).map_err(|_| CatalogError::InvalidRange {
            start: start_year,
            end: end_year,
        })?;

        let available = dataset.years();
        if !available.covers(&years) {
            return Err(CatalogError::YearRangeOutOfBounds {
                dataset: dataset_name.to_string(),
                start: start_year,
                end: end_year,
                min: available.start(),
                max: available.end(),
            });
        }

        if index.requires_daily() && !dataset.supports_daily() {
            return Err(CatalogError::UnsupportedResolution {
                dataset: dataset_name.to_string(),
                index: index_name.to_string(),
                resolution: dataset.temporal_resolution().to_string(),
            });
        }

        let geometry = match geometry {
            None => return Err(CatalogError::InvalidGeometry("no region selected".to_string())),
            Some(g) if g.is_empty() => {
                return Err(CatalogError::InvalidGeometry(
                    "selected region has no area".to_string(),
                ))
            }
            Some(g) => g.clone(),
        };

        debug!(
            dataset = %dataset_name,
            category = %parsed_category,
            index = %index_name,
            years = %years,
            "Resolved analysis request"
        );

        Ok(RequestDescriptor {
            dataset_name: dataset_name.to_string(),
            dataset: dataset.clone(),
            category: parsed_category,
            index_name: index_name.to_string(),
            index: index.clone(),
            geometry,
            years,
        })
    }
}

/// A fully validated analysis request. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestDescriptor {
    dataset_name: String,
    dataset: DatasetDescriptor,
    category: IndexCategory,
    index_name: String,
    index: IndexDescriptor,
    geometry: Geometry,
    years: YearRange,
}

impl RequestDescriptor {
    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn dataset(&self) -> &DatasetDescriptor {
        &self.dataset
    }

    pub fn category(&self) -> IndexCategory {
        self.category
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn index(&self) -> &IndexDescriptor {
        &self.index
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn start_year(&self) -> i32 {
        self.years.start()
    }

    pub fn end_year(&self) -> i32 {
        self.years.end()
    }
}
