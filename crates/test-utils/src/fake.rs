//! Scripted in-memory compute service.
//!
//! Answers the requests the analysis invoker and exporter make, keyed by the
//! year found in each graph's date filter:
//!
//! - `Collection.size` returns 365, or 0 for [`YearScript::Empty`]
//! - `Image.reduceRegion` with a mean reducer returns `{"index_mean": v}`
//! - `Image.reduceRegion` with a percentile reducer returns the configured
//!   percentiles, or an empty dictionary
//!
//! Every call is recorded for later assertions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use analysis::{AnalysisError, ComputeService, ExportRequest, ExportTask};

use crate::graph::{contains_function, root_function, year_of};

/// Scripted behaviour for one year.
#[derive(Debug, Clone)]
pub enum YearScript {
    /// Regional mean for the year
    Mean(f64),
    /// Images exist but the region has no valid pixels
    NoPixels,
    /// The filtered collection is empty
    Empty,
    /// The first request for the year fails
    Fail(AnalysisError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Value,
    Pixels,
    Export,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub function: Option<String>,
    pub year: Option<i32>,
    pub graph: Value,
}

pub struct FakeComputeService {
    years: HashMap<i32, YearScript>,
    /// Mean for years without a script: `intercept + slope * (year - 2000)`
    linear: (f64, f64),
    percentiles: Option<(f64, f64)>,
    pixels: Result<Bytes, AnalysisError>,
    export_failure: Option<AnalysisError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for FakeComputeService {
    fn default() -> Self {
        Self {
            years: HashMap::new(),
            linear: (10.0, 0.0),
            percentiles: None,
            pixels: Ok(Bytes::from_static(b"II*\0fake-geotiff")),
            export_failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeComputeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: i32, script: YearScript) -> Self {
        self.years.insert(year, script);
        self
    }

    /// Unscripted years return `intercept + slope * (year - 2000)`.
    pub fn with_linear_series(mut self, intercept: f64, slope: f64) -> Self {
        self.linear = (intercept, slope);
        self
    }

    pub fn with_percentiles(mut self, p2: f64, p98: f64) -> Self {
        self.percentiles = Some((p2, p98));
        self
    }

    pub fn with_pixels(mut self, pixels: Result<Bytes, AnalysisError>) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn with_export_failure(mut self, err: AnalysisError) -> Self {
        self.export_failure = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    fn record(&self, kind: CallKind, graph: &Value) -> Option<i32> {
        let year = year_of(graph);
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            function: root_function(graph).map(str::to_string),
            year,
            graph: graph.clone(),
        });
        year
    }

    fn script(&self, year: Option<i32>) -> YearScript {
        let year = year.unwrap_or(2000);
        self.years.get(&year).cloned().unwrap_or_else(|| {
            let (intercept, slope) = self.linear;
            YearScript::Mean(intercept + slope * (year - 2000) as f64)
        })
    }
}

#[async_trait]
impl ComputeService for FakeComputeService {
    async fn compute_value(&self, graph: &Value) -> analysis::Result<Value> {
        let year = self.record(CallKind::Value, graph);
        let script = self.script(year);

        match root_function(graph) {
            Some("Collection.size") => match script {
                YearScript::Empty => Ok(json!(0)),
                YearScript::Fail(err) => Err(err),
                _ => Ok(json!(365)),
            },
            Some("Image.reduceRegion") if contains_function(graph, "Reducer.percentile") => {
                Ok(match self.percentiles {
                    Some((p2, p98)) => json!({"index_p2": p2, "index_p98": p98}),
                    None => json!({}),
                })
            }
            Some("Image.reduceRegion") => match script {
                YearScript::Mean(v) => Ok(json!({ "index_mean": v })),
                YearScript::NoPixels => Ok(json!({ "index_mean": null })),
                YearScript::Empty => Err(AnalysisError::NoData("empty collection".into())),
                YearScript::Fail(err) => Err(err),
            },
            other => Err(AnalysisError::service(format!(
                "fake service cannot evaluate {:?}",
                other
            ))),
        }
    }

    async fn compute_pixels(
        &self,
        graph: &Value,
        _request: &ExportRequest,
    ) -> analysis::Result<Bytes> {
        self.record(CallKind::Pixels, graph);
        self.pixels.clone()
    }

    async fn start_export(
        &self,
        graph: &Value,
        request: &ExportRequest,
    ) -> analysis::Result<ExportTask> {
        self.record(CallKind::Export, graph);
        if let Some(err) = &self.export_failure {
            return Err(err.clone());
        }

        let id = format!("FAKETASK{}", self.calls_of(CallKind::Export).len());
        Ok(ExportTask {
            id,
            description: request.description.clone(),
            folder: request.folder.clone(),
        })
    }
}
