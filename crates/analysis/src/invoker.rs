//! Per-year evaluation of a resolved request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use catalog::RequestDescriptor;

use crate::error::{AnalysisError, Result};
use crate::expression::{self as ee, Expression};
use crate::rate_limit::RateLimiter;
use crate::recipes;
use crate::result::{
    AnalysisResult, ResultHandle, TemporalPoint, VisParams, YearImage, YearWarning,
    DEFAULT_OPACITY,
};
use crate::service::ComputeService;

/// Percentiles used for the visualization stretch.
const STRETCH_PERCENTILES: [f64; 2] = [2.0, 98.0];

/// Tuning for an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Year evaluations in flight at once; 1 evaluates sequentially
    pub concurrency: usize,
    /// Minimum spacing between service request starts
    pub min_request_interval: Duration,
    /// Region-reduction scale in metres
    pub reduce_scale_m: f64,
    /// Pixel cap for region reductions
    pub max_pixels: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            min_request_interval: Duration::ZERO,
            reduce_scale_m: 1000.0,
            max_pixels: 1e9,
        }
    }
}

/// What one year produced.
struct YearOutcome {
    image: Expression,
    /// Regional mean, absent when the region holds no valid pixels
    value: Option<f64>,
}

/// Runs analyses against a compute service.
pub struct Analyzer {
    service: Arc<dyn ComputeService>,
    options: AnalysisOptions,
    limiter: RateLimiter,
}

impl Analyzer {
    pub fn new(service: Arc<dyn ComputeService>, options: AnalysisOptions) -> Self {
        let limiter = RateLimiter::new(options.min_request_interval);
        Self {
            service,
            options,
            limiter,
        }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Evaluate the index for every year of the request.
    ///
    /// Years that fail with a non-fatal error are recorded as warnings and
    /// skipped. Authentication and quota errors abort the run.
    #[instrument(skip(self, request), fields(
        dataset = %request.dataset_name(),
        index = %request.index_name(),
        years = %request.years(),
    ))]
    pub async fn analyze(&self, request: &RequestDescriptor) -> Result<AnalysisResult> {
        let started = Instant::now();
        let region = ee::geometry(request.geometry());
        let region = &region;
        let end_year = request.end_year();

        info!(
            concurrency = self.options.concurrency,
            "Starting analysis"
        );

        let mut outcomes = stream::iter(request.years().years())
            .map(move |year| async move { (year, self.evaluate_year(request, region, year).await) })
            .buffered(self.options.concurrency.max(1));

        let mut temporal_data = Vec::new();
        let mut year_images = Vec::new();
        let mut warnings = Vec::new();
        let mut final_image = None;

        while let Some((year, outcome)) = outcomes.next().await {
            match outcome {
                Ok(YearOutcome { image, value }) => {
                    year_images.push(YearImage {
                        year,
                        handle: ResultHandle::new(ee::clip(image.clone(), region.clone()).to_graph()),
                    });
                    if year == end_year {
                        final_image = Some(image);
                    }

                    match value {
                        Some(value) => {
                            debug!(year, value, "Year evaluated");
                            counter!("analysis_years_total", "outcome" => "ok").increment(1);
                            temporal_data.push(TemporalPoint { year, value });
                        }
                        None => {
                            let err = AnalysisError::NoData(format!(
                                "no valid pixels in region for {}",
                                year
                            ));
                            warn!(year, error = %err, "Skipping year");
                            counter!("analysis_years_total", "outcome" => "skipped").increment(1);
                            warnings.push(warning(year, &err));
                        }
                    }
                }
                Err(err) if err.is_fatal() => {
                    error!(year, error = %err, "Aborting analysis");
                    counter!("analysis_years_total", "outcome" => "aborted").increment(1);
                    return Err(err);
                }
                Err(err) => {
                    warn!(year, kind = err.kind(), error = %err, "Skipping year");
                    counter!("analysis_years_total", "outcome" => "skipped").increment(1);
                    warnings.push(warning(year, &err));
                }
            }
        }

        if temporal_data.is_empty() && final_image.is_none() {
            return Err(AnalysisError::NoData(format!(
                "{} has no data for {} in the selected region",
                request.dataset_name(),
                request.years()
            )));
        }

        let index = request.index();
        let (default_min, default_max) = index.vis_range();
        let mut vis_params = VisParams {
            min: default_min,
            max: default_max,
            palette: index.palette().clone(),
            opacity: DEFAULT_OPACITY,
        };

        let data = match final_image {
            Some(image) => {
                if let Some((p2, p98)) = self.stretch(&image, region).await {
                    vis_params.min = p2;
                    vis_params.max = p98;
                }
                Some(ResultHandle::new(ee::clip(image, region.clone()).to_graph()))
            }
            None => None,
        };

        histogram!("analysis_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            points = temporal_data.len(),
            skipped = warnings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            index: request.index_name().to_string(),
            parameter: request.category().to_string(),
            dataset: request.dataset_name().to_string(),
            time_range: request.years(),
            units: index.units().to_string(),
            temporal_data,
            data,
            year_images,
            vis_params,
            geometry: request.geometry().clone(),
            warnings,
        })
    }

    async fn evaluate_year(
        &self,
        request: &RequestDescriptor,
        region: &Expression,
        year: i32,
    ) -> Result<YearOutcome> {
        let year_exprs = recipes::year_expressions(request, region, year)?;

        let size = self
            .compute(&ee::collection_size(year_exprs.collection.clone()))
            .await?;
        match size.as_u64() {
            Some(0) => {
                return Err(AnalysisError::NoData(format!(
                    "no {} images for {}",
                    request.dataset_name(),
                    year
                )))
            }
            Some(_) => {}
            None => {
                return Err(AnalysisError::service(format!(
                    "unexpected collection size: {}",
                    size
                )))
            }
        }

        let stats = self
            .compute(&ee::reduce_region(
                year_exprs.image.clone(),
                ee::reducer("mean"),
                region.clone(),
                self.options.reduce_scale_m,
                self.options.max_pixels,
            ))
            .await?;

        Ok(YearOutcome {
            image: year_exprs.image,
            value: first_number(&stats),
        })
    }

    /// 2nd and 98th percentiles of the image over the region, when both exist
    /// and form a usable range.
    async fn stretch(&self, image: &Expression, region: &Expression) -> Option<(f64, f64)> {
        let stats = self
            .compute(&ee::reduce_region(
                image.clone(),
                ee::percentile_reducer(&STRETCH_PERCENTILES),
                region.clone(),
                self.options.reduce_scale_m,
                self.options.max_pixels,
            ))
            .await;

        let stats = match stats {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(response = %other, "Unexpected percentile response, keeping default range");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "Could not compute percentile stretch, keeping default range");
                return None;
            }
        };

        // Output keys are `<band>_p2` and `<band>_p98`
        let mut keys: Vec<&String> = stats.keys().collect();
        keys.sort();
        let (low, high) = match keys.as_slice() {
            [low, high, ..] => (stats[*low].as_f64()?, stats[*high].as_f64()?),
            _ => return None,
        };

        (low < high).then_some((low, high))
    }

    async fn compute(&self, expression: &Expression) -> Result<Value> {
        self.limiter.wait().await;
        self.service.compute_value(&expression.to_graph()).await
    }
}

fn warning(year: i32, err: &AnalysisError) -> YearWarning {
    YearWarning {
        year,
        kind: err.kind().to_string(),
        message: err.to_string(),
    }
}

/// First numeric value of a reduction dictionary.
fn first_number(stats: &Value) -> Option<f64> {
    stats.as_object()?.values().next()?.as_f64()
}
