//! Climate index evaluation against a remote compute service.
//!
//! A resolved request is translated into the service's expression graph one
//! year at a time, evaluated through a [`ComputeService`], and assembled into
//! an [`AnalysisResult`] with a yearly series and visualization parameters.

pub mod auth;
pub mod config;
pub mod earth_engine;
pub mod error;
pub mod expression;
pub mod invoker;
pub mod rate_limit;
pub mod recipes;
pub mod result;
pub mod service;

pub use auth::Credentials;
pub use config::ServiceConfig;
pub use earth_engine::EarthEngineClient;
pub use error::{AnalysisError, Result};
pub use expression::Expression;
pub use invoker::{AnalysisOptions, Analyzer};
pub use rate_limit::RateLimiter;
pub use result::{
    AnalysisResult, ResultHandle, TemporalPoint, TemporalSummary, VisParams, YearImage,
    YearWarning,
};
pub use service::{ComputeService, ExportRequest, ExportTask};
