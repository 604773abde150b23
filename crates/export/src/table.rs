//! Time-series tables.

use serde::Serialize;

use analysis::AnalysisResult;

use crate::error::{ExportError, Result};
use crate::format::ExportScope;

#[derive(Serialize)]
struct SeriesRow {
    year: i32,
    value: f64,
}

#[derive(Serialize)]
struct LabelledRow<'a> {
    dataset: &'a str,
    parameter: &'a str,
    index: &'a str,
    year: i32,
    value: f64,
}

/// Render the yearly series as CSV.
///
/// `All` prefixes every row with the dataset, parameter and index columns.
pub fn series_csv(result: &AnalysisResult, scope: ExportScope) -> Result<Vec<u8>> {
    if result.temporal_data.is_empty() {
        return Err(ExportError::NoTemporalData);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in &result.temporal_data {
        match scope {
            ExportScope::Current => writer.serialize(SeriesRow {
                year: point.year,
                value: point.value,
            })?,
            ExportScope::All => writer.serialize(LabelledRow {
                dataset: &result.dataset,
                parameter: &result.parameter,
                index: &result.index,
                year: point.year,
                value: point.value,
            })?,
        }
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}
