//! Earth Engine REST client.

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, histogram};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::config::ServiceConfig;
use crate::error::{AnalysisError, Result};
use crate::service::{ComputeService, ExportRequest, ExportTask};

/// Upper bound on pixels for a cloud export task.
const EXPORT_MAX_PIXELS: &str = "10000000000000";

/// Compute service backed by the Earth Engine REST API.
pub struct EarthEngineClient {
    client: Client,
    project_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ComputeValueResponse {
    result: Value,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl EarthEngineClient {
    /// Create a client for the configured project using a bearer token.
    pub fn new(config: &ServiceConfig, token: impl Into<String>) -> Result<Self> {
        let project_url = config.project_url().ok_or_else(|| {
            AnalysisError::Authentication(
                "no cloud project configured; run `climate authenticate --project <id>`"
                    .to_string(),
            )
        })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AnalysisError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            project_url,
            token: token.into(),
        })
    }

    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    async fn post(&self, endpoint: &'static str, body: &Value) -> Result<Response> {
        let url = format!("{}/{}", self.project_url, endpoint);
        debug!(url = %url, "Posting to compute service");

        let started = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                counter!("ee_requests_total", "endpoint" => endpoint, "status" => "transport").increment(1);
                AnalysisError::from(e)
            })?;

        let status = response.status();
        histogram!("ee_request_duration_seconds", "endpoint" => endpoint)
            .record(started.elapsed().as_secs_f64());
        counter!("ee_requests_total", "endpoint" => endpoint, "status" => status.as_u16().to_string())
            .increment(1);

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let err = classify_error(status, &text);
        warn!(endpoint, status = status.as_u16(), kind = err.kind(), error = %err, "Compute service request failed");
        Err(err)
    }
}

/// Map an unsuccessful HTTP response to an error kind.
pub fn classify_error(status: StatusCode, body: &str) -> AnalysisError {
    let details = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_default();
    let message = if details.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        details.message
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => AnalysisError::Quota(message),
        _ if details.status == "RESOURCE_EXHAUSTED" => AnalysisError::Quota(message),
        _ if details.status == "UNAUTHENTICATED" || details.status == "PERMISSION_DENIED" => {
            AnalysisError::Authentication(message)
        }
        _ => AnalysisError::Service {
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// Output grid for a raster request in EPSG:4326.
fn pixel_grid(request: &ExportRequest) -> Value {
    let (width, height) = request.dimensions();
    let step = request.pixel_degrees();
    json!({
        "dimensions": {"width": width, "height": height},
        "affineTransform": {
            "scaleX": step,
            "shearX": 0.0,
            "translateX": request.region.min_lon,
            "shearY": 0.0,
            "scaleY": -step,
            "translateY": request.region.max_lat,
        },
        "crsCode": "EPSG:4326",
    })
}

#[async_trait]
impl ComputeService for EarthEngineClient {
    #[instrument(skip(self, graph))]
    async fn compute_value(&self, graph: &Value) -> Result<Value> {
        let response = self
            .post("value:compute", &json!({ "expression": graph }))
            .await?;
        let body: ComputeValueResponse = response.json().await?;
        Ok(body.result)
    }

    #[instrument(skip(self, graph, request), fields(description = %request.description))]
    async fn compute_pixels(&self, graph: &Value, request: &ExportRequest) -> Result<Bytes> {
        let body = json!({
            "expression": graph,
            "fileFormat": "GEO_TIFF",
            "grid": pixel_grid(request),
        });
        let response = self.post("image:computePixels", &body).await?;
        let bytes = response.bytes().await?;
        info!(size = bytes.len(), "Downloaded pixels");
        Ok(bytes)
    }

    #[instrument(skip(self, graph, request), fields(description = %request.description))]
    async fn start_export(&self, graph: &Value, request: &ExportRequest) -> Result<ExportTask> {
        let body = json!({
            "expression": graph,
            "description": request.description,
            "fileExportOptions": {
                "fileFormat": "GEO_TIFF",
                "driveDestination": {
                    "folder": request.folder,
                    "filenamePrefix": request.description,
                },
            },
            "grid": pixel_grid(request),
            "maxPixels": EXPORT_MAX_PIXELS,
        });
        let response = self.post("image:export", &body).await?;
        let operation: OperationResponse = response.json().await?;

        // Operation names look like projects/<project>/operations/<id>
        let id = operation
            .name
            .rsplit('/')
            .next()
            .unwrap_or(operation.name.as_str())
            .to_string();
        info!(task = %id, folder = %request.folder, "Started cloud export");

        Ok(ExportTask {
            id,
            description: request.description.clone(),
            folder: request.folder.clone(),
        })
    }
}
