//! Error types for the analysis crate.

use thiserror::Error;

/// Errors raised while evaluating an analysis against the compute service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Compute service quota exceeded: {0}")]
    Quota(String),

    #[error("No data available: {0}")]
    NoData(String),

    #[error("Compute service error{}: {message}", status_suffix(.status))]
    Service {
        status: Option<u16>,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl AnalysisError {
    pub fn service(message: impl Into<String>) -> Self {
        AnalysisError::Service {
            status: None,
            message: message.into(),
        }
    }

    /// Stable error kind name, printed by the CLI on failure.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Authentication(_) => "AuthenticationError",
            AnalysisError::Quota(_) => "QuotaError",
            AnalysisError::NoData(_) => "NoDataError",
            AnalysisError::Service { .. } => "ServiceError",
            AnalysisError::Transport(_) => "TransportError",
        }
    }

    /// Whether the same call may succeed if repeated later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::Quota(_) | AnalysisError::Transport(_))
    }

    /// Errors that make every later call fail the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Authentication(_) | AnalysisError::Quota(_))
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AnalysisError::service(format!("malformed response: {}", err))
        } else {
            AnalysisError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::service(format!("malformed response: {}", err))
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
