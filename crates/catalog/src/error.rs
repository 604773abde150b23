//! Error types for the catalog crate.

use thiserror::Error;

/// Errors raised by registry operations and request resolution.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Dataset not found: {0}")]
    UnknownDataset(String),

    #[error("Unknown {category} index: {name}")]
    UnknownIndex { category: String, name: String },

    #[error("Unknown index category '{0}', expected 'Temperature' or 'Precipitation'")]
    UnknownCategory(String),

    #[error("Dataset already registered: {0}")]
    DuplicateDataset(String),

    #[error("{category} index already registered: {name}")]
    DuplicateIndex { category: String, name: String },

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Start year {start} must be less than or equal to end year {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("Years {start}-{end} are outside the range available for {dataset} ({min}-{max})")]
    YearRangeOutOfBounds {
        dataset: String,
        start: i32,
        end: i32,
        min: i32,
        max: i32,
    },

    #[error("Index '{index}' requires daily data but {dataset} provides {resolution} data")]
    UnsupportedResolution {
        dataset: String,
        index: String,
        resolution: String,
    },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Failed to persist custom entries: {0}")]
    Persistence(String),
}

impl CatalogError {
    /// Stable error kind name, printed by the CLI on failure.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::UnknownDataset(_) => "UnknownDatasetError",
            CatalogError::UnknownIndex { .. } => "UnknownIndexError",
            CatalogError::UnknownCategory(_) => "UnknownCategoryError",
            CatalogError::DuplicateDataset(_) => "DuplicateDatasetError",
            CatalogError::DuplicateIndex { .. } => "DuplicateIndexError",
            CatalogError::InvalidDescriptor(_) => "InvalidDescriptorError",
            CatalogError::InvalidRange { .. } => "InvalidRangeError",
            CatalogError::YearRangeOutOfBounds { .. } => "YearRangeOutOfBoundsError",
            CatalogError::UnsupportedResolution { .. } => "UnsupportedResolutionError",
            CatalogError::InvalidGeometry(_) => "InvalidGeometryError",
            CatalogError::Persistence(_) => "PersistenceError",
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Persistence(err.to_string())
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
