//! Export of climate analysis results.
//!
//! Supports:
//! - CSV tables of the yearly series, written locally
//! - GeoTIFF rasters, downloaded when small enough, otherwise handed off to
//!   a cloud export task
//! - NetCDF rasters, converted from a downloaded GeoTIFF by an external tool

pub mod config;
pub mod error;
pub mod exporter;
pub mod format;
pub mod netcdf;
pub mod table;

pub use config::ExportConfig;
pub use error::{ExportError, Result};
pub use exporter::{ExportOutcome, Exporter};
pub use format::{ExportFormat, ExportScope};
