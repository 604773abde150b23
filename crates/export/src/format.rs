//! Export formats and scopes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    GeoTiff,
    Csv,
    NetCdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::GeoTiff => "tif",
            ExportFormat::Csv => "csv",
            ExportFormat::NetCdf => "nc",
        }
    }

    /// Top-level directory under the export root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ExportFormat::GeoTiff => "GeoTIFF",
            ExportFormat::Csv => "CSV",
            ExportFormat::NetCdf => "NetCDF",
        }
    }

    /// Whether the format is a raster produced from an image handle.
    pub fn is_raster(&self) -> bool {
        !matches!(self, ExportFormat::Csv)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geotiff" | "tif" | "tiff" => Ok(ExportFormat::GeoTiff),
            "csv" => Ok(ExportFormat::Csv),
            "netcdf" | "nc" => Ok(ExportFormat::NetCdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Which part of a result is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportScope {
    /// The final year's image, or the series as a plain table
    Current,
    /// Every analysed year
    All,
}

impl fmt::Display for ExportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportScope::Current => f.write_str("current"),
            ExportScope::All => f.write_str("all"),
        }
    }
}

impl FromStr for ExportScope {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(ExportScope::Current),
            "all" => Ok(ExportScope::All),
            _ => Err(ExportError::UnsupportedScope(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_aliases() {
        assert_eq!("GeoTIFF".parse::<ExportFormat>().unwrap(), ExportFormat::GeoTiff);
        assert_eq!("tif".parse::<ExportFormat>().unwrap(), ExportFormat::GeoTiff);
        assert_eq!("NetCDF".parse::<ExportFormat>().unwrap(), ExportFormat::NetCdf);
        assert_eq!("nc".parse::<ExportFormat>().unwrap(), ExportFormat::NetCdf);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn test_unknown_format() {
        let err = "shapefile".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err.kind(), "UnsupportedFormatError");
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("Current".parse::<ExportScope>().unwrap(), ExportScope::Current);
        assert_eq!("all".parse::<ExportScope>().unwrap(), ExportScope::All);
        assert!("everything".parse::<ExportScope>().is_err());
    }

    #[test]
    fn test_extensions() {
        assert_eq!(ExportFormat::GeoTiff.extension(), "tif");
        assert_eq!(ExportFormat::NetCdf.dir_name(), "NetCDF");
        assert!(!ExportFormat::Csv.is_raster());
    }
}
