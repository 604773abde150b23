//! Export configuration.

use std::path::PathBuf;

/// Configuration for the exporter.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Root of the local export tree.
    pub export_dir: PathBuf,

    /// Cloud folder for handed-off exports.
    pub drive_folder: String,

    /// Raster pixel size in metres.
    pub pixel_scale_m: f64,

    /// Estimated pixel count above which rasters go straight to the cloud.
    pub max_pixels_no_chunk: u64,

    /// Largest raster written locally, in megabytes.
    pub max_file_size_mb: u64,

    /// GeoTIFF to NetCDF converter executable.
    pub converter: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        let home = std::env::var("HOME").map(PathBuf::from).unwrap_or_default();
        Self {
            export_dir: home.join("climate_tool_exports"),
            drive_folder: "Climate_Analysis_Tool_Exports".to_string(),
            pixel_scale_m: 500.0,
            max_pixels_no_chunk: 5_000_000,
            max_file_size_mb: 500,
            converter: "gdal_translate".to_string(),
        }
    }
}

impl ExportConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CLIMATE_EXPORT_DIR") {
            if !val.is_empty() {
                config.export_dir = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_DRIVE_FOLDER") {
            if !val.is_empty() {
                config.drive_folder = val;
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_EXPORT_SCALE_M") {
            if let Ok(scale) = val.parse() {
                config.pixel_scale_m = scale;
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_MAX_PIXELS_NO_CHUNK") {
            if let Ok(n) = val.parse() {
                config.max_pixels_no_chunk = n;
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_MAX_FILE_SIZE_MB") {
            if let Ok(n) = val.parse() {
                config.max_file_size_mb = n;
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_NETCDF_CONVERTER") {
            if !val.is_empty() {
                config.converter = val;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.export_dir.as_os_str().is_empty() {
            return Err("export_dir must not be empty".to_string());
        }

        if !(self.pixel_scale_m > 0.0) {
            return Err("pixel_scale_m must be > 0".to_string());
        }

        if self.max_pixels_no_chunk == 0 {
            return Err("max_pixels_no_chunk must be > 0".to_string());
        }

        if self.converter.is_empty() {
            return Err("converter must not be empty".to_string());
        }

        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}
