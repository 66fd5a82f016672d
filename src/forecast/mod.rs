//! Forecasting from fitted trends.

pub mod dense;
pub mod generator;

pub use dense::{DenseForecaster, LagPolicy};
pub use generator::{ForecastConfig, ForecastGenerator};
