//! Inclusive calendar-year ranges.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

/// An inclusive range of calendar years, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> CommonResult<Self> {
        if start > end {
            return Err(CommonError::InvalidYearRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of years in the range (never zero).
    pub fn len(&self) -> usize {
        (i64::from(self.end) - i64::from(self.start)) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when `other` lies entirely inside this range (both ends inclusive).
    pub fn covers(&self, other: &YearRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }
}

impl TryFrom<(i32, i32)> for YearRange {
    type Error = CommonError;

    fn try_from((start, end): (i32, i32)) -> Result<Self, Self::Error> {
        YearRange::new(start, end)
    }
}

impl From<YearRange> for (i32, i32) {
    fn from(range: YearRange) -> Self {
        (range.start, range.end)
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// The current UTC calendar year.
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Date window covering one calendar year: Jan 1 inclusive to Jan 1 of the next year exclusive.
pub fn year_window(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_range_rejected() {
        let err = YearRange::new(2020, 2010).unwrap_err();
        assert!(matches!(
            err,
            CommonError::InvalidYearRange {
                start: 2020,
                end: 2010
            }
        ));
    }

    #[test]
    fn test_covers_is_inclusive() {
        let dataset = YearRange::new(1979, 2023).unwrap();
        assert!(dataset.covers(&YearRange::new(1979, 2023).unwrap()));
        assert!(dataset.covers(&YearRange::new(2000, 2000).unwrap()));
        assert!(!dataset.covers(&YearRange::new(1978, 2000).unwrap()));
        assert!(!dataset.covers(&YearRange::new(2020, 2024).unwrap()));
    }

    #[test]
    fn test_years_and_len() {
        let range = YearRange::new(2010, 2013).unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range.years().collect::<Vec<_>>(), vec![2010, 2011, 2012, 2013]);
    }

    #[test]
    fn test_len_spans_full_i32_range() {
        let range = YearRange::new(i32::MIN, i32::MAX).unwrap();
        assert_eq!(range.len() as u64, u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_year_window_outside_calendar() {
        assert!(year_window(i32::MIN).is_none());
        assert!(year_window(i32::MAX).is_none());
    }

    #[test]
    fn test_year_window() {
        let (start, end) = year_window(2020).unwrap();
        assert_eq!(start.to_string(), "2020-01-01");
        assert_eq!(end.to_string(), "2021-01-01");
    }

    #[test]
    fn test_serde_as_tuple() {
        let range = YearRange::new(2010, 2020).unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), "[2010,2020]");
        assert!(serde_json::from_str::<YearRange>("[2020,2010]").is_err());
    }
}
