//! Error types for result export.

use analysis::AnalysisError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported export scope: {0}")]
    UnsupportedScope(String),

    #[error("No temporal data available for export")]
    NoTemporalData,

    #[error("No image available for export: {0}")]
    NoImage(String),

    #[error("Export region is empty")]
    EmptyRegion,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format conversion failed: {0}")]
    Converter(String),
}

impl ExportError {
    /// Stable error kind name, printed by the CLI on failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ExportError::UnsupportedFormat(_) => "UnsupportedFormatError",
            ExportError::UnsupportedScope(_) => "UnsupportedScopeError",
            ExportError::NoTemporalData => "NoTemporalDataError",
            ExportError::NoImage(_) => "NoImageError",
            ExportError::EmptyRegion => "EmptyRegionError",
            ExportError::Analysis(e) => e.kind(),
            ExportError::Csv(_) => "CsvError",
            ExportError::Io(_) => "IoError",
            ExportError::Converter(_) => "ConverterError",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
