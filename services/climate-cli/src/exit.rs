//! Error kinds reported on stderr.

use analysis::AnalysisError;
use catalog::CatalogError;
use climate_common::CommonError;
use export::ExportError;

/// Kind name of the first typed error in the chain, or `Error`.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CatalogError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<AnalysisError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<ExportError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<CommonError>() {
            return e.kind();
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return "InvalidInputError";
        }
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return "IoError";
        }
    }
    "Error"
}
