//! The compute-service seam.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use climate_common::BoundingBox;

use crate::error::Result;

/// Approximate metres per degree at the equator.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// A raster request over a region at a fixed pixel size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Task description and file name prefix
    pub description: String,
    pub region: BoundingBox,
    /// Pixel size in metres
    pub scale_meters: f64,
    /// Cloud folder used when the export is handed off
    pub folder: String,
}

impl ExportRequest {
    /// Pixel size in degrees of the EPSG:4326 output grid.
    pub fn pixel_degrees(&self) -> f64 {
        self.scale_meters / METRES_PER_DEGREE
    }

    /// Output grid dimensions as (width, height), at least one pixel each.
    pub fn dimensions(&self) -> (u64, u64) {
        let step = self.pixel_degrees();
        let width = (self.region.width() / step).ceil().max(1.0) as u64;
        let height = (self.region.height() / step).ceil().max(1.0) as u64;
        (width, height)
    }

    pub fn pixel_count(&self) -> u64 {
        let (w, h) = self.dimensions();
        w * h
    }
}

/// A server-side export task that writes to cloud storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportTask {
    /// Operation identifier returned by the service
    pub id: String,
    pub description: String,
    pub folder: String,
}

/// A remote service that evaluates expression graphs.
///
/// Every method takes an encoded graph as produced by
/// [`Expression::to_graph`](crate::expression::Expression::to_graph).
#[async_trait]
pub trait ComputeService: Send + Sync {
    /// Evaluate an expression to a JSON value.
    async fn compute_value(&self, graph: &Value) -> Result<Value>;

    /// Render an image expression to GeoTIFF bytes.
    async fn compute_pixels(&self, graph: &Value, request: &ExportRequest) -> Result<Bytes>;

    /// Start a cloud-storage export of an image expression.
    async fn start_export(&self, graph: &Value, request: &ExportRequest) -> Result<ExportTask>;
}
