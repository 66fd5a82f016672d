//! Numerical helpers shared by the fitters and scorers.

pub mod metrics;
pub mod ols;
pub mod stats;

pub use metrics::{calculate_metrics, AccuracyMetrics};
pub use ols::{linregress, ols_fit, polyfit, LinearRegression, OLSResult, Polynomial};
pub use stats::{mean, t_critical};
