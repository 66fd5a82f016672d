//! Trend fitting: statistical (OLS / polynomial) for sparse series and
//! gradient-boosted trees for dense ones.

pub mod analyzer;
pub mod boosted;
pub mod features;
pub mod fitter;
pub mod polynomial;

pub use analyzer::{summarize, TrendAnalyzer, TrendChange, TrendSummary};
pub use boosted::{BoostingConfig, GradientBoostedRegressor};
pub use fitter::{DenseModel, FitMethod, FittedTrend, TrendDirection, TrendFitter, TrendFitterConfig};
pub use polynomial::{PolynomialConfig, PolynomialFitter};
