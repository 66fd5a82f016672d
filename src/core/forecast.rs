//! Forecast records produced by the statistical and dense forecasters.

use crate::core::MetricDomain;
use chrono::NaiveDate;
use serde::Serialize;

/// Confidence label attached to every interval forecast.
pub const CONFIDENCE_95: &str = "95%";

/// A single-year forecast with a prediction interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub year: i32,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence_level: String,
}

impl Forecast {
    /// Create a 95% interval forecast.
    pub fn new(year: i32, predicted: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            year,
            predicted,
            lower_bound,
            upper_bound,
            confidence_level: CONFIDENCE_95.to_string(),
        }
    }

    /// Width of the prediction interval.
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Check whether a value falls inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }

    /// Clamp the point forecast and both bounds into a metric domain.
    ///
    /// Clamping is monotone, so interval ordering survives.
    pub fn clamped(mut self, domain: MetricDomain) -> Self {
        self.predicted = domain.clamp(self.predicted);
        self.lower_bound = domain.clamp(self.lower_bound);
        self.upper_bound = domain.clamp(self.upper_bound);
        self
    }
}

/// A point forecast for one future day (dense path, no interval).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub predicted: f64,
}
