//! Configuration for the compute-service client and the analysis run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::invoker::AnalysisOptions;

/// Default Earth Engine REST endpoint.
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com";

/// Configuration for the compute-service client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the REST API.
    pub api_url: String,

    /// API version path segment.
    pub api_version: String,

    /// Cloud project the requests are billed to.
    pub project: Option<String>,

    /// OAuth bearer token. Never persisted.
    #[serde(skip)]
    pub access_token: Option<String>,

    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Region-reduction scale in metres.
    pub reduce_scale_m: f64,

    /// Pixel cap for region reductions.
    pub max_pixels: f64,

    /// Year evaluations in flight at once.
    pub concurrency: usize,

    /// Minimum spacing between request starts, in milliseconds.
    pub min_request_interval_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_version: "v1".to_string(),
            project: None,
            access_token: None,
            request_timeout_secs: 300,
            reduce_scale_m: 1000.0,
            max_pixels: 1e9,
            concurrency: 1,
            min_request_interval_ms: 0,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("EE_API_URL") {
            config.api_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = std::env::var("EE_API_VERSION") {
            config.api_version = val;
        }

        if let Ok(val) = std::env::var("EE_PROJECT") {
            if !val.is_empty() {
                config.project = Some(val);
            }
        }

        if let Ok(val) = std::env::var("EE_ACCESS_TOKEN") {
            if !val.is_empty() {
                config.access_token = Some(val);
            }
        }

        if let Ok(val) = std::env::var("EE_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.request_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_CONCURRENCY") {
            if let Ok(n) = val.parse() {
                config.concurrency = n;
            }
        }

        if let Ok(val) = std::env::var("CLIMATE_MIN_REQUEST_INTERVAL_MS") {
            if let Ok(ms) = val.parse() {
                config.min_request_interval_ms = ms;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("api_url must not be empty".to_string());
        }

        if self.concurrency == 0 {
            return Err("concurrency must be > 0".to_string());
        }

        if !(self.reduce_scale_m > 0.0) {
            return Err("reduce_scale_m must be > 0".to_string());
        }

        if !(self.max_pixels > 0.0) {
            return Err("max_pixels must be > 0".to_string());
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `{api_url}/{version}/projects/{project}`, once a project is set.
    pub fn project_url(&self) -> Option<String> {
        self.project
            .as_ref()
            .map(|p| format!("{}/{}/projects/{}", self.api_url, self.api_version, p))
    }

    /// Options for the analysis invoker derived from this configuration.
    pub fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            concurrency: self.concurrency.max(1),
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
            reduce_scale_m: self.reduce_scale_m,
            max_pixels: self.max_pixels,
        }
    }
}
