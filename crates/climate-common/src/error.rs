//! Error types for shared climate toolkit types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while validating regions, palettes and year ranges.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("No geometry defined for '{0}'")]
    UnknownGeometry(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    #[error("Palette must have at least 2 color stops, got {0}")]
    PaletteTooShort(usize),

    #[error("Invalid year range: start year {start} is after end year {end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Invalid GeoJSON: {0}")]
    GeoJson(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommonError {
    /// Stable error kind name, printed by the CLI on failure.
    pub fn kind(&self) -> &'static str {
        match self {
            CommonError::InvalidBounds(_) => "InvalidBoundsError",
            CommonError::UnknownGeometry(_) => "UnknownGeometryError",
            CommonError::InvalidGeometry(_) => "InvalidGeometryError",
            CommonError::InvalidColor(_) | CommonError::PaletteTooShort(_) => "InvalidColorError",
            CommonError::InvalidYearRange { .. } => "InvalidRangeError",
            CommonError::GeoJson(_) => "GeoJsonError",
            CommonError::Io(_) => "IoError",
        }
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        CommonError::GeoJson(err.to_string())
    }
}
