//! GeoTIFF to NetCDF conversion through an external converter.

use std::io::ErrorKind;
use std::path::Path;

use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::{ExportError, Result};

/// Run `<converter> -of netCDF <input> <output>` and check the output exists.
#[instrument(skip_all, fields(converter = %converter))]
pub async fn convert_to_netcdf(converter: &str, input: &Path, output: &Path) -> Result<u64> {
    let result = Command::new(converter)
        .arg("-of")
        .arg("netCDF")
        .arg(input)
        .arg(output)
        .output()
        .await;

    let output_status = match result {
        Ok(out) => out,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ExportError::Converter(format!(
                "{} not found on PATH",
                converter
            )));
        }
        Err(e) => {
            return Err(ExportError::Converter(format!(
                "failed to run {}: {}",
                converter, e
            )));
        }
    };

    if !output_status.status.success() {
        let stderr = String::from_utf8_lossy(&output_status.stderr);
        return Err(ExportError::Converter(format!(
            "{} exited with {}: {}",
            converter,
            output_status.status,
            stderr.trim()
        )));
    }

    let size = tokio::fs::metadata(output)
        .await
        .map_err(|_| {
            ExportError::Converter(format!(
                "{} produced no output at {}",
                converter,
                output.display()
            ))
        })?
        .len();

    debug!(output = %output.display(), bytes = size, "NetCDF conversion finished");
    Ok(size)
}
