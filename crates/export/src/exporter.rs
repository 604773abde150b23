//! Result exporter with local-first writes and cloud hand-off.
//!
//! Rasters are downloaded and written under the local export tree when the
//! region is small enough; otherwise, or when the download fails or is too
//! large, a server-side export task is started instead.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument, warn};

use analysis::{AnalysisResult, ComputeService, ExportRequest, ResultHandle};

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::format::{ExportFormat, ExportScope};
use crate::netcdf::convert_to_netcdf;
use crate::table::series_csv;

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// Written to the local export tree
    Local { path: PathBuf, bytes: u64 },
    /// Started as a server-side task writing to cloud storage
    CloudHandoff {
        task_id: String,
        folder: String,
        description: String,
    },
}

impl fmt::Display for ExportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportOutcome::Local { path, bytes } => {
                write!(f, "Saved {} ({} bytes)", path.display(), bytes)
            }
            ExportOutcome::CloudHandoff {
                task_id, folder, ..
            } => write!(
                f,
                "Export task {} started; the file will be saved to the '{}' folder",
                task_id, folder
            ),
        }
    }
}

/// Replace characters unsafe in file names and task descriptions.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Exports analysis results.
pub struct Exporter {
    service: Arc<dyn ComputeService>,
    config: ExportConfig,
}

impl Exporter {
    pub fn new(service: Arc<dyn ComputeService>, config: ExportConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export a result in the given format and scope.
    ///
    /// CSV always yields one local file. Raster formats yield one outcome per
    /// exported image: the final year for `Current`, every year for `All`.
    #[instrument(skip(self, result), fields(dataset = %result.dataset, index = %result.index))]
    pub async fn export(
        &self,
        result: &AnalysisResult,
        format: ExportFormat,
        scope: ExportScope,
    ) -> Result<Vec<ExportOutcome>> {
        let timestamp = Utc::now();

        let outcomes = if format.is_raster() {
            let mut outcomes = Vec::new();
            for (year, handle) in images_for_scope(result, scope)? {
                let outcome = self
                    .export_image(result, format, year, handle, &timestamp)
                    .await?;
                outcomes.push(outcome);
            }
            outcomes
        } else {
            vec![self.export_csv(result, scope, &timestamp).await?]
        };

        for outcome in &outcomes {
            let target = match outcome {
                ExportOutcome::Local { .. } => "local",
                ExportOutcome::CloudHandoff { .. } => "cloud",
            };
            counter!("exports_total", "format" => format.dir_name(), "target" => target)
                .increment(1);
            info!(%format, %scope, "{}", outcome);
        }

        Ok(outcomes)
    }

    async fn export_csv(
        &self,
        result: &AnalysisResult,
        scope: ExportScope,
        timestamp: &DateTime<Utc>,
    ) -> Result<ExportOutcome> {
        let data = series_csv(result, scope)?;
        let years = match scope {
            ExportScope::Current => result.time_range.end().to_string(),
            ExportScope::All => format!(
                "{}_{}",
                result.time_range.start(),
                result.time_range.end()
            ),
        };
        let path = self.local_path(result, ExportFormat::Csv, &years, timestamp);
        write_file(&path, &data).await?;

        Ok(ExportOutcome::Local {
            path,
            bytes: data.len() as u64,
        })
    }

    async fn export_image(
        &self,
        result: &AnalysisResult,
        format: ExportFormat,
        year: i32,
        handle: &ResultHandle,
        timestamp: &DateTime<Utc>,
    ) -> Result<ExportOutcome> {
        let region = result.geometry.bounds().ok_or(ExportError::EmptyRegion)?;
        let request = ExportRequest {
            description: export_name(result, &year.to_string(), timestamp),
            region,
            scale_meters: self.config.pixel_scale_m,
            folder: format!(
                "{}/{}/{}",
                self.config.drive_folder,
                sanitize(&result.dataset),
                sanitize(&result.index)
            ),
        };

        let pixels = request.pixel_count();
        if pixels > self.config.max_pixels_no_chunk {
            info!(
                year,
                pixels,
                max = self.config.max_pixels_no_chunk,
                "Region too large for a local download"
            );
            return self.hand_off(handle, &request).await;
        }

        let data = match self.service.compute_pixels(handle.graph(), &request).await {
            Ok(data) => data,
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => {
                warn!(year, error = %e, "Download failed, handing off to cloud export");
                return self.hand_off(handle, &request).await;
            }
        };

        if data.len() as u64 > self.config.max_file_size_bytes() {
            warn!(
                year,
                bytes = data.len(),
                max_mb = self.config.max_file_size_mb,
                "Download too large, handing off to cloud export"
            );
            return self.hand_off(handle, &request).await;
        }

        let path = self.local_path(result, format, &year.to_string(), timestamp);
        match format {
            ExportFormat::NetCdf => {
                let temp = self
                    .config
                    .export_dir
                    .join("temp")
                    .join(format!("{}.tif", request.description));
                write_file(&temp, &data).await?;
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }

                let converted = convert_to_netcdf(&self.config.converter, &temp, &path).await;
                if let Err(e) = fs::remove_file(&temp).await {
                    warn!(path = %temp.display(), error = %e, "Failed to remove temporary GeoTIFF");
                }

                match converted {
                    Ok(bytes) => Ok(ExportOutcome::Local { path, bytes }),
                    Err(e) => {
                        warn!(year, error = %e, "NetCDF conversion failed, handing off GeoTIFF");
                        self.hand_off(handle, &request).await
                    }
                }
            }
            _ => {
                write_file(&path, &data).await?;
                Ok(ExportOutcome::Local {
                    path,
                    bytes: data.len() as u64,
                })
            }
        }
    }

    async fn hand_off(&self, handle: &ResultHandle, request: &ExportRequest) -> Result<ExportOutcome> {
        let task = self.service.start_export(handle.graph(), request).await?;
        Ok(ExportOutcome::CloudHandoff {
            task_id: task.id,
            folder: task.folder,
            description: task.description,
        })
    }

    /// `<export_dir>/<Format>/<dataset>/<index>/<dataset>_<index>_<years>_<timestamp>.<ext>`
    fn local_path(
        &self,
        result: &AnalysisResult,
        format: ExportFormat,
        years: &str,
        timestamp: &DateTime<Utc>,
    ) -> PathBuf {
        self.config
            .export_dir
            .join(format.dir_name())
            .join(sanitize(&result.dataset))
            .join(sanitize(&result.index))
            .join(format!(
                "{}.{}",
                export_name(result, years, timestamp),
                format.extension()
            ))
    }
}

fn export_name(result: &AnalysisResult, years: &str, timestamp: &DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}_{}",
        sanitize(&result.dataset),
        sanitize(&result.index),
        years,
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

fn images_for_scope(
    result: &AnalysisResult,
    scope: ExportScope,
) -> Result<Vec<(i32, &ResultHandle)>> {
    match scope {
        ExportScope::Current => {
            let handle = result.data.as_ref().ok_or_else(|| {
                ExportError::NoImage(format!("no final image for {}", result.index))
            })?;
            Ok(vec![(result.time_range.end(), handle)])
        }
        ExportScope::All => {
            if result.year_images.is_empty() {
                return Err(ExportError::NoImage(format!(
                    "no yearly images for {} {}-{}",
                    result.index,
                    result.time_range.start(),
                    result.time_range.end()
                )));
            }
            Ok(result
                .year_images
                .iter()
                .map(|i| (i.year, &i.handle))
                .collect())
        }
    }
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, data).await?;
    Ok(())
}
