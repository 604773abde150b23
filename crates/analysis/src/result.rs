//! Analysis result documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use climate_common::{Geometry, Palette, YearRange};

/// Default layer opacity for index maps.
pub const DEFAULT_OPACITY: f64 = 0.8;

/// Regional mean of the index for one year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalPoint {
    pub year: i32,
    pub value: f64,
}

/// Rendering parameters for an index image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisParams {
    pub min: f64,
    pub max: f64,
    pub palette: Palette,
    pub opacity: f64,
}

/// Opaque reference to an image computed by the service.
///
/// Holds the encoded expression graph; nothing is materialized until it is
/// evaluated or exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultHandle(Value);

impl ResultHandle {
    pub fn new(graph: Value) -> Self {
        Self(graph)
    }

    pub fn graph(&self) -> &Value {
        &self.0
    }
}

/// Index image for one year, clipped to the region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearImage {
    pub year: i32,
    pub handle: ResultHandle,
}

/// A year skipped because the service reported an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearWarning {
    pub year: i32,
    /// Error kind name, e.g. `NoDataError`
    pub kind: String,
    pub message: String,
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub index: String,
    /// Index category, `Temperature` or `Precipitation`
    pub parameter: String,
    pub dataset: String,
    pub time_range: YearRange,
    pub units: String,
    pub temporal_data: Vec<TemporalPoint>,
    /// Final year's image clipped to the region
    pub data: Option<ResultHandle>,
    #[serde(default)]
    pub year_images: Vec<YearImage>,
    pub vis_params: VisParams,
    pub geometry: Geometry,
    #[serde(default)]
    pub warnings: Vec<YearWarning>,
}

impl AnalysisResult {
    pub fn summary(&self) -> Option<TemporalSummary> {
        TemporalSummary::from_points(&self.temporal_data)
    }

    pub fn image_for_year(&self, year: i32) -> Option<&ResultHandle> {
        self.year_images
            .iter()
            .find(|i| i.year == year)
            .map(|i| &i.handle)
    }
}

/// Descriptive statistics over a yearly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Least-squares slope in units per year; absent with fewer than two years
    pub trend_per_year: Option<f64>,
}

impl TemporalSummary {
    pub fn from_points(points: &[TemporalPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let n = points.len() as f64;
        let mean = points.iter().map(|p| p.value).sum::<f64>() / n;
        let min = points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let max = points.iter().map(|p| p.value).fold(f64::NEG_INFINITY, f64::max);

        let mean_year = points.iter().map(|p| p.year as f64).sum::<f64>() / n;
        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), p| {
            let dx = p.year as f64 - mean_year;
            (sxy + dx * (p.value - mean), sxx + dx * dx)
        });
        let trend_per_year = (sxx > 0.0).then(|| sxy / sxx);

        Some(Self {
            count: points.len(),
            mean,
            min,
            max,
            trend_per_year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[(i32, f64)]) -> Vec<TemporalPoint> {
        values
            .iter()
            .map(|&(year, value)| TemporalPoint { year, value })
            .collect()
    }

    #[test]
    fn test_linear_series_trend_equals_slope() {
        let series = points(&[(2000, 10.0), (2001, 12.5), (2002, 15.0), (2003, 17.5)]);
        let summary = TemporalSummary::from_points(&series).unwrap();

        assert_eq!(summary.count, 4);
        assert!((summary.trend_per_year.unwrap() - 2.5).abs() < 1e-9);
        assert!((summary.mean - 13.75).abs() < 1e-9);
        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 17.5);
    }

    #[test]
    fn test_gap_years_use_actual_years() {
        // 2001 skipped
        let series = points(&[(2000, 0.0), (2002, 4.0), (2003, 6.0)]);
        let trend = TemporalSummary::from_points(&series)
            .unwrap()
            .trend_per_year
            .unwrap();
        assert!((trend - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_has_no_trend() {
        let summary = TemporalSummary::from_points(&points(&[(2010, 3.0)])).unwrap();
        assert!(summary.trend_per_year.is_none());
        assert_eq!(summary.mean, 3.0);
    }

    #[test]
    fn test_empty_series() {
        assert!(TemporalSummary::from_points(&[]).is_none());
    }
}
