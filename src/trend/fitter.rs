//! Trend fitting for a single named series.
//!
//! The fitting strategy is chosen from the number of usable observations:
//!
//! - **Sparse** (`n <= dense_threshold`): closed-form OLS of value on
//!   (fractional) year with a t-test on the slope.
//! - **Dense** (`n > dense_threshold`): gradient-boosted trees over
//!   calendar, lag and rolling features, scored on a chronological
//!   hold-out split and refit on the full series.

use crate::core::{decimal_year, TimeSeries};
use crate::error::{Result, UrbanError};
use crate::trend::boosted::{BoostingConfig, GradientBoostedRegressor};
use crate::trend::features::{FeatureSet, TrainingFrame};
use crate::utils::metrics::{calculate_metrics, AccuracyMetrics};
use crate::utils::ols::{linregress, Polynomial};
use crate::utils::stats::{mean, sum_sq_dev};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Direction of a fitted trend, from the sign of its slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn from_slope(slope: f64) -> Self {
        if slope > 0.0 {
            TrendDirection::Increasing
        } else if slope < 0.0 {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model family that produced a [`FittedTrend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FitMethod {
    Linear,
    Polynomial { degree: usize },
    GradientBoosted,
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMethod::Linear => f.write_str("linear"),
            FitMethod::Polynomial { degree } => write!(f, "poly (deg {})", degree),
            FitMethod::GradientBoosted => f.write_str("gradient boosted"),
        }
    }
}

/// Result of fitting one series. Built once by a fitter and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FittedTrend {
    pub method: FitMethod,
    /// Mean rate of change per year.
    pub slope: f64,
    pub intercept: f64,
    /// Goodness of fit in [0, 1]. Hold-out score for boosted fits.
    pub r_squared: f64,
    /// Slope significance. `None` for boosted fits.
    pub p_value: Option<f64>,
    pub std_err: f64,
    pub residual_std_err: f64,
    pub trend_direction: TrendDirection,
    pub significant: bool,
    pub historical_years: Vec<i32>,
    pub historical_values: Vec<f64>,
    pub sample_count: usize,
    /// Fractional-year abscissa of each observation.
    #[serde(skip)]
    pub(crate) abscissa: Vec<f64>,
    #[serde(skip)]
    pub(crate) curve: Option<Polynomial>,
}

impl FittedTrend {
    /// Evaluate the fitted curve at a fractional year.
    pub fn predict(&self, x: f64) -> f64 {
        match &self.curve {
            Some(poly) => poly.eval(x),
            None => self.intercept + self.slope * x,
        }
    }

    pub fn abscissa(&self) -> &[f64] {
        &self.abscissa
    }

    /// Polynomial curve, for polynomial fits.
    pub fn curve(&self) -> Option<&Polynomial> {
        self.curve.as_ref()
    }

    pub fn x_mean(&self) -> f64 {
        mean(&self.abscissa)
    }

    /// Sum of squared deviations of the abscissa.
    pub fn sxx(&self) -> f64 {
        sum_sq_dev(&self.abscissa)
    }

    /// Whether an analytic prediction interval can be derived.
    pub fn supports_interval(&self) -> bool {
        self.method != FitMethod::GradientBoosted && self.sample_count > 2
    }
}

/// Configuration for [`TrendFitter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFitterConfig {
    /// Series with more observations than this take the dense path.
    pub dense_threshold: usize,
    /// p-value below which a slope counts as significant.
    pub significance_level: f64,
    /// Share of the dense series held out for scoring.
    pub holdout_fraction: f64,
}

impl Default for TrendFitterConfig {
    fn default() -> Self {
        Self {
            dense_threshold: 30,
            significance_level: 0.05,
            holdout_fraction: 0.2,
        }
    }
}

impl TrendFitterConfig {
    pub fn with_dense_threshold(mut self, threshold: usize) -> Self {
        self.dense_threshold = threshold;
        self
    }

    pub fn with_significance_level(mut self, level: f64) -> Self {
        self.significance_level = level;
        self
    }

    pub fn with_holdout_fraction(mut self, fraction: f64) -> Self {
        self.holdout_fraction = fraction;
        self
    }
}

/// Boosted model fitted on a dense series, kept for point forecasting.
#[derive(Debug, Clone)]
pub struct DenseModel {
    pub trend: FittedTrend,
    pub(crate) regressor: GradientBoostedRegressor,
    pub(crate) features: FeatureSet,
    pub(crate) history: Vec<f64>,
    pub(crate) last_date: NaiveDate,
    /// Accuracy of the 80% model on the held-out tail.
    pub holdout: AccuracyMetrics,
}

impl DenseModel {
    pub fn last_date(&self) -> NaiveDate {
        self.last_date
    }

    pub fn uses_lags(&self) -> bool {
        self.features.use_lags
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.names()
    }
}

/// Fits trends to individual series.
#[derive(Debug, Clone, Default)]
pub struct TrendFitter {
    config: TrendFitterConfig,
    boosting: BoostingConfig,
}

impl TrendFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: TrendFitterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_boosting(mut self, boosting: BoostingConfig) -> Self {
        self.boosting = boosting;
        self
    }

    pub fn config(&self) -> &TrendFitterConfig {
        &self.config
    }

    /// Fit a trend, returning `None` when fewer than two observations
    /// remain or the fit fails numerically.
    pub fn fit(&self, series: &TimeSeries) -> Option<FittedTrend> {
        match self.try_fit(series) {
            Ok(trend) => trend,
            Err(e) => {
                warn!(label = series.label().unwrap_or("<unnamed>"), error = %e, "trend fit failed");
                None
            }
        }
    }

    /// Fit a trend, surfacing computation errors.
    ///
    /// `Ok(None)` signals insufficient data.
    pub fn try_fit(&self, series: &TimeSeries) -> Result<Option<FittedTrend>> {
        let observed = series.observed();
        if observed.len() < 2 {
            debug!(
                label = series.label().unwrap_or("<unnamed>"),
                points = observed.len(),
                "series too short to fit"
            );
            return Ok(None);
        }

        if observed.len() > self.config.dense_threshold {
            self.fit_dense_observed(&observed).map(|m| Some(m.trend))
        } else {
            self.fit_linear(&observed).map(Some)
        }
    }

    /// Fit the boosted model on a dense series.
    ///
    /// Returns `Ok(None)` when the series is not longer than the dense
    /// threshold.
    pub fn fit_dense(&self, series: &TimeSeries) -> Result<Option<DenseModel>> {
        let observed = series.observed();
        if observed.len() <= self.config.dense_threshold {
            return Ok(None);
        }
        self.fit_dense_observed(&observed).map(Some)
    }

    fn fit_linear(&self, observed: &[(NaiveDate, f64)]) -> Result<FittedTrend> {
        let x: Vec<f64> = observed.iter().map(|(d, _)| decimal_year(*d)).collect();
        let y: Vec<f64> = observed.iter().map(|(_, v)| *v).collect();
        let reg = linregress(&x, &y)?;

        let residual_std_err = if reg.n > 2 {
            reg.residual_std_err
        } else {
            reg.std_err
        };

        Ok(FittedTrend {
            method: FitMethod::Linear,
            slope: reg.slope,
            intercept: reg.intercept,
            r_squared: reg.r_squared().clamp(0.0, 1.0),
            p_value: Some(reg.p_value),
            std_err: reg.std_err,
            residual_std_err,
            trend_direction: TrendDirection::from_slope(reg.slope),
            significant: reg.p_value < self.config.significance_level,
            historical_years: observed.iter().map(|(d, _)| d.year()).collect(),
            historical_values: y,
            sample_count: observed.len(),
            abscissa: x,
            curve: None,
        })
    }

    fn fit_dense_observed(&self, observed: &[(NaiveDate, f64)]) -> Result<DenseModel> {
        let last_date = observed
            .last()
            .map(|(d, _)| *d)
            .ok_or(UrbanError::EmptyData)?;
        let frame = TrainingFrame::build(observed, self.config.dense_threshold);
        if frame.len() < 2 {
            return Err(UrbanError::InsufficientData {
                needed: 2,
                got: frame.len(),
            });
        }

        // Chronological split, at least one row on each side
        let split = ((frame.len() as f64) * (1.0 - self.config.holdout_fraction)).floor() as usize;
        let split = split.clamp(1, frame.len() - 1);

        let holdout_model =
            GradientBoostedRegressor::fit(&self.boosting, &frame.rows[..split], &frame.target[..split])?;
        let predicted = holdout_model.predict_many(&frame.rows[split..]);
        let holdout = calculate_metrics(&frame.target[split..], &predicted)?;
        let holdout_r2 = if holdout.r_squared.is_finite() {
            holdout.r_squared.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let regressor = GradientBoostedRegressor::fit(&self.boosting, &frame.rows, &frame.target)?;

        let x: Vec<f64> = observed.iter().map(|(d, _)| decimal_year(*d)).collect();
        let reg = linregress(&x, &frame.history)?;

        debug!(
            points = observed.len(),
            lags = frame.features.use_lags,
            holdout_r2,
            holdout_rmse = holdout.rmse,
            "fitted dense trend"
        );

        let trend = FittedTrend {
            method: FitMethod::GradientBoosted,
            slope: reg.slope,
            intercept: reg.intercept,
            r_squared: holdout_r2,
            p_value: None,
            std_err: reg.std_err,
            residual_std_err: reg.residual_std_err,
            trend_direction: TrendDirection::from_slope(reg.slope),
            significant: false,
            historical_years: observed.iter().map(|(d, _)| d.year()).collect(),
            historical_values: observed.iter().map(|(_, v)| *v).collect(),
            sample_count: observed.len(),
            abscissa: x,
            curve: None,
        };

        Ok(DenseModel {
            trend,
            regressor,
            features: frame.features,
            history: frame.history,
            last_date,
            holdout,
        })
    }
}
