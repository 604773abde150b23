//! Access tokens and stored credentials.
//!
//! Only the project id and the time of authentication are stored on disk.
//! Bearer tokens are short-lived and are fetched for every run, either from
//! `EE_ACCESS_TOKEN` or from the gcloud CLI.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::error::{AnalysisError, Result};

const CREDENTIALS_FILE: &str = "credentials.json";

/// Persisted authentication state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub project_id: String,
    pub authenticated_at: DateTime<Utc>,
}

impl Credentials {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            authenticated_at: Utc::now(),
        }
    }

    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(CREDENTIALS_FILE)
    }

    /// Read stored credentials; `None` when the file does not exist.
    pub fn load(config_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(config_dir);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            AnalysisError::Authentication(format!("cannot read {}: {}", path.display(), e))
        })?;
        let credentials = serde_json::from_str(&contents).map_err(|e| {
            AnalysisError::Authentication(format!("corrupt credentials file {}: {}", path.display(), e))
        })?;
        Ok(Some(credentials))
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(config_dir)?;
            let json = serde_json::to_string_pretty(self)?;
            std::fs::write(Self::path(config_dir), json)
        };
        write().map_err(|e| {
            AnalysisError::Authentication(format!(
                "cannot write credentials to {}: {}",
                config_dir.display(),
                e
            ))
        })?;
        info!(project = %self.project_id, dir = %config_dir.display(), "Saved credentials");
        Ok(())
    }
}

/// Bearer token for the compute service.
///
/// Uses the configured token when present, otherwise asks the gcloud CLI.
pub async fn access_token(config: &ServiceConfig) -> Result<String> {
    if let Some(token) = &config.access_token {
        debug!("Using access token from environment");
        return Ok(token.clone());
    }

    let output = Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .await
        .map_err(|e| {
            AnalysisError::Authentication(format!(
                "no access token: set EE_ACCESS_TOKEN or install the gcloud CLI ({})",
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::Authentication(format!(
            "gcloud could not provide an access token: {}",
            stderr.trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(AnalysisError::Authentication(
            "gcloud returned an empty access token".to_string(),
        ));
    }
    debug!("Obtained access token from gcloud");
    Ok(token)
}
