//! TimeSeries data structure for per-period satellite aggregates.

use crate::error::{Result, UrbanError};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// One observation of a metric. `None` marks a missing observation
/// (e.g. a period where cloud cover blocked every scene).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub timestamp: NaiveDate,
    pub value: Option<f64>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: NaiveDate, value: f64) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    pub fn missing(timestamp: NaiveDate) -> Self {
        Self {
            timestamp,
            value: None,
        }
    }

    /// Whether the point carries a usable (finite) value.
    pub fn is_observed(&self) -> bool {
        self.value.is_some_and(f64::is_finite)
    }
}

/// Ordered series of observations for a single named metric.
///
/// Timestamps are strictly increasing after construction. Missing values
/// are kept so callers can report coverage, but every fitting routine
/// works on [`TimeSeries::observed`].
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    points: Vec<TimeSeriesPoint>,
    label: Option<String>,
}

impl TimeSeries {
    /// Build a series from unordered points.
    ///
    /// Points are sorted by timestamp; duplicated timestamps are rejected.
    pub fn new(mut points: Vec<TimeSeriesPoint>) -> Result<Self> {
        points.sort_by_key(|p| p.timestamp);

        for pair in points.windows(2) {
            if pair[0].timestamp == pair[1].timestamp {
                return Err(UrbanError::TimestampError(format!(
                    "duplicate timestamp {}",
                    pair[0].timestamp
                )));
            }
        }

        Ok(Self {
            points,
            label: None,
        })
    }

    /// Build a series from parallel date and value vectors.
    pub fn from_parts(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(UrbanError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }
        let points = dates
            .into_iter()
            .zip(values)
            .map(|(timestamp, value)| TimeSeriesPoint { timestamp, value })
            .collect();
        Self::new(points)
    }

    /// Build an annual series keyed by calendar year. Each value is
    /// anchored on January 1st of its year.
    pub fn from_yearly(data: &BTreeMap<i32, f64>) -> Result<Self> {
        let points = data
            .iter()
            .map(|(&year, &value)| {
                NaiveDate::from_ymd_opt(year, 1, 1)
                    .map(|date| TimeSeriesPoint::new(date, value))
                    .ok_or_else(|| {
                        UrbanError::TimestampError(format!("year {} out of range", year))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(points)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// All points, including missing observations.
    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of missing (null or non-finite) observations.
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| !p.is_observed()).count()
    }

    /// Observed points only, in timestamp order.
    pub fn observed(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .iter()
            .filter_map(|p| match p.value {
                Some(v) if v.is_finite() => Some((p.timestamp, v)),
                _ => None,
            })
            .collect()
    }

    pub fn observed_len(&self) -> usize {
        self.points.len() - self.missing_count()
    }

    /// True when no two observed points fall in the same calendar year.
    pub fn is_annual(&self) -> bool {
        let observed = self.observed();
        observed
            .windows(2)
            .all(|pair| pair[0].0.year() != pair[1].0.year())
    }

    /// Last observed date, if any.
    pub fn last_observed_date(&self) -> Option<NaiveDate> {
        self.observed().last().map(|(d, _)| *d)
    }
}

/// Convert a date into a fractional year (e.g. 2020-07-02 -> ~2020.5).
pub fn decimal_year(date: NaiveDate) -> f64 {
    let year = date.year();
    let days_in_year = if is_leap_year(year) { 366.0 } else { 365.0 };
    year as f64 + (date.ordinal0() as f64) / days_in_year
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
