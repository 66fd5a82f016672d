//! Core data structures for trend fitting and forecasting.

mod domain;
mod forecast;
mod time_series;

pub use domain::MetricDomain;
pub use forecast::{DailyForecast, Forecast, CONFIDENCE_95};
pub use time_series::{decimal_year, TimeSeries, TimeSeriesPoint};
