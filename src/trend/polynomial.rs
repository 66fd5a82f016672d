//! Best-effort polynomial curve selection for sparse multi-year series.
//!
//! Degrees 1..=3 are fitted and the one with the highest in-sample R² wins.
//! Selection is not cross-validated, so on very short series a higher
//! degree can chase noise; the sample minimums below limit how far it can.

use crate::core::{decimal_year, TimeSeries};
use crate::error::Result;
use crate::trend::fitter::{FitMethod, FittedTrend, TrendDirection};
use crate::utils::metrics::r_squared;
use crate::utils::ols::{polyfit, Polynomial};
use crate::utils::stats::{f_test_p_value, mean, sum_sq_dev};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for [`PolynomialFitter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolynomialConfig {
    pub max_degree: usize,
    /// Samples required before degree 2 is tried.
    pub quadratic_min_samples: usize,
    /// Samples required before degree 3 is tried.
    pub cubic_min_samples: usize,
    pub significance_level: f64,
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self {
            max_degree: 3,
            quadratic_min_samples: 5,
            cubic_min_samples: 10,
            significance_level: 0.05,
        }
    }
}

impl PolynomialConfig {
    pub fn with_max_degree(mut self, max_degree: usize) -> Self {
        self.max_degree = max_degree;
        self
    }

    /// Whether `degree` may be tried with `n` samples.
    pub fn allows(&self, degree: usize, n: usize) -> bool {
        match degree {
            0 => false,
            1 => n >= 2,
            2 => n >= self.quadratic_min_samples,
            _ => n >= self.cubic_min_samples,
        }
    }
}

/// Polynomial trend fitter with automatic degree selection.
#[derive(Debug, Clone, Default)]
pub struct PolynomialFitter {
    config: PolynomialConfig,
}

impl PolynomialFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PolynomialConfig) -> Self {
        self.config = config;
        self
    }

    /// Fit the best polynomial, or `None` with fewer than two observations.
    pub fn fit(&self, series: &TimeSeries) -> Option<FittedTrend> {
        match self.try_fit(series) {
            Ok(trend) => trend,
            Err(e) => {
                warn!(label = series.label().unwrap_or("<unnamed>"), error = %e, "polynomial fit failed");
                None
            }
        }
    }

    pub fn try_fit(&self, series: &TimeSeries) -> Result<Option<FittedTrend>> {
        let observed = series.observed();
        let n = observed.len();
        if n < 2 {
            return Ok(None);
        }
        let x: Vec<f64> = observed.iter().map(|(d, _)| decimal_year(*d)).collect();
        let y: Vec<f64> = observed.iter().map(|(_, v)| *v).collect();

        let mut best: Option<(Polynomial, f64)> = None;
        for degree in 1..=self.config.max_degree.max(1) {
            if !self.config.allows(degree, n) {
                break;
            }
            let poly = polyfit(&x, &y, degree)?;
            let fitted: Vec<f64> = x.iter().map(|xi| poly.eval(*xi)).collect();
            let r2 = r_squared(&y, &fitted);
            debug!(degree, r2, "polynomial candidate");
            // Ties keep the lower degree
            if best.as_ref().map_or(true, |(_, b)| r2 > *b + 1e-12) {
                best = Some((poly, r2));
            }
        }

        let Some((poly, r2)) = best else {
            return Ok(None);
        };

        let years = observed.iter().map(|(d, _)| d.year()).collect();
        Ok(Some(self.build_trend(poly, r2, x, y, years)))
    }

    fn build_trend(
        &self,
        poly: Polynomial,
        r2: f64,
        x: Vec<f64>,
        y: Vec<f64>,
        years: Vec<i32>,
    ) -> FittedTrend {
        let n = x.len();
        let degree = poly.degree;
        let first = x[0];
        let last = x[n - 1];

        // Average rate over the observed span; equals the OLS slope at degree 1
        let slope = (poly.eval(last) - poly.eval(first)) / (last - first);
        let x_mean = mean(&x);
        let intercept = poly.eval(x_mean) - slope * x_mean;

        let sse: f64 = x
            .iter()
            .zip(&y)
            .map(|(xi, yi)| (yi - poly.eval(*xi)).powi(2))
            .sum();
        let sst = sum_sq_dev(&y);
        let dof = n as f64 - degree as f64 - 1.0;

        let residual_std_err = if dof > 0.0 { (sse / dof).sqrt() } else { 0.0 };
        let std_err = residual_std_err / sum_sq_dev(&x).sqrt();

        let p_value = if dof > 0.0 && sse > 1e-12 {
            let f_stat = ((sst - sse) / degree as f64) / (sse / dof);
            f_test_p_value(f_stat, degree as f64, dof).unwrap_or(1.0)
        } else if sst > 0.0 {
            0.0
        } else {
            1.0
        };

        FittedTrend {
            method: FitMethod::Polynomial { degree },
            slope,
            intercept,
            r_squared: r2.clamp(0.0, 1.0),
            p_value: Some(p_value),
            std_err,
            residual_std_err,
            trend_direction: TrendDirection::from_slope(slope),
            significant: p_value < self.config.significance_level,
            historical_years: years,
            historical_values: y,
            sample_count: n,
            abscissa: x,
            curve: Some(poly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::fitter::TrendFitter;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn yearly(values: &[f64], start: i32) -> TimeSeries {
        let data: BTreeMap<i32, f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + i as i32, *v))
            .collect();
        TimeSeries::from_yearly(&data).unwrap()
    }

    #[test]
    fn degree_limits_follow_sample_size() {
        let config = PolynomialConfig::default();
        assert!(config.allows(1, 2));
        assert!(!config.allows(2, 4));
        assert!(config.allows(2, 5));
        assert!(!config.allows(3, 9));
        assert!(config.allows(3, 10));
    }

    #[test]
    fn short_series_stays_linear() {
        let series = yearly(&[1.0, 4.0, 9.0, 16.0], 2019);
        let trend = PolynomialFitter::new().fit(&series).unwrap();
        assert_eq!(trend.method, FitMethod::Polynomial { degree: 1 });
    }

    #[test]
    fn degree_one_matches_linear_fitter() {
        let series = yearly(&[20.0, 22.0, 25.0, 29.0], 2018);
        let poly = PolynomialFitter::new().fit(&series).unwrap();
        let linear = TrendFitter::new().fit(&series).unwrap();

        assert_relative_eq!(poly.slope, linear.slope, epsilon = 1e-6);
        assert_relative_eq!(poly.intercept, linear.intercept, epsilon = 1e-3);
        assert_relative_eq!(poly.r_squared, linear.r_squared, epsilon = 1e-9);
        assert_relative_eq!(poly.p_value.unwrap(), linear.p_value.unwrap(), epsilon = 1e-6);
    }

    #[test]
    fn quadratic_signal_selects_higher_degree() {
        let values: Vec<f64> = (0..8).map(|i| 10.0 + (i as f64).powi(2)).collect();
        let trend = PolynomialFitter::new().fit(&yearly(&values, 2015)).unwrap();

        assert_eq!(trend.method, FitMethod::Polynomial { degree: 2 });
        assert!(trend.r_squared > 0.999);
        // Curve reproduces history
        assert_relative_eq!(trend.predict(2018.0), 19.0, epsilon = 1e-4);
        // Span-average slope: (59 - 10) / 7
        assert_relative_eq!(trend.slope, 7.0, epsilon = 1e-4);
        assert!(trend.curve().is_some());
    }

    #[test]
    fn single_point_is_none() {
        assert!(PolynomialFitter::new().fit(&yearly(&[1.0], 2020)).is_none());
    }
}
