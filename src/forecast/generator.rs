//! Interval forecasts from statistical trend fits.
//!
//! For a target year `y` the point forecast is the fitted curve at `y` and
//! the prediction standard error is
//!
//! ```text
//! se = rse * sqrt(1 + 1/n + (y - x_mean)^2 / Sxx)
//! ```
//!
//! with a two-sided Student-t critical value on `n - 2` degrees of freedom.

use crate::core::{Forecast, MetricDomain};
use crate::trend::FittedTrend;
use crate::utils::stats::t_critical;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Configuration for [`ForecastGenerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Two-sided confidence level of the prediction interval.
    pub confidence_level: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl ForecastConfig {
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    fn label(&self) -> String {
        format!("{}%", (self.confidence_level * 100.0).round())
    }
}

/// Projects fitted trends into future years.
#[derive(Debug, Clone, Default)]
pub struct ForecastGenerator {
    config: ForecastConfig,
}

impl ForecastGenerator {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Forecast `target_years` with prediction intervals clamped to
    /// `domain`.
    ///
    /// Returns `None` when the trend has two or fewer samples, came from
    /// the boosted path, or its abscissa has no spread.
    pub fn forecast(
        &self,
        trend: &FittedTrend,
        target_years: &[i32],
        domain: MetricDomain,
    ) -> Option<Vec<Forecast>> {
        if !trend.supports_interval() {
            debug!(samples = trend.sample_count, method = %trend.method, "no interval basis");
            return None;
        }
        let sxx = trend.sxx();
        if sxx <= 0.0 {
            return None;
        }

        let n = trend.sample_count as f64;
        let x_mean = trend.x_mean();
        let t_value = t_critical(self.config.confidence_level, n - 2.0)?;
        let label = self.config.label();

        let forecasts = target_years
            .iter()
            .map(|&year| {
                let x = year as f64;
                let predicted = trend.predict(x);
                let se = trend.residual_std_err * (1.0 + 1.0 / n + (x - x_mean).powi(2) / sxx).sqrt();
                let mut forecast =
                    Forecast::new(year, predicted, predicted - t_value * se, predicted + t_value * se)
                        .clamped(domain);
                forecast.confidence_level = label.clone();
                forecast
            })
            .collect();

        Some(forecasts)
    }

    /// Forecast land-cover class shares, clamped to [0, 100].
    pub fn forecast_lulc(
        &self,
        trends: &BTreeMap<String, FittedTrend>,
        target_years: &[i32],
    ) -> BTreeMap<String, Vec<Forecast>> {
        trends
            .iter()
            .filter_map(|(class, trend)| {
                self.forecast(trend, target_years, MetricDomain::Percentage)
                    .map(|f| (class.clone(), f))
            })
            .collect()
    }

    /// Forecast spectral indices. SAVI is clamped to [0, 1]; every other
    /// index to [-1, 1].
    pub fn forecast_indices(
        &self,
        trends: &BTreeMap<String, FittedTrend>,
        target_years: &[i32],
    ) -> BTreeMap<String, Vec<Forecast>> {
        trends
            .iter()
            .filter_map(|(name, trend)| {
                let domain = match MetricDomain::for_index(name) {
                    MetricDomain::Unbounded => MetricDomain::SignedUnit,
                    domain => domain,
                };
                self.forecast(trend, target_years, domain)
                    .map(|f| (name.clone(), f))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeSeries;
    use crate::trend::TrendFitter;
    use approx::assert_relative_eq;

    fn trend(pairs: &[(i32, f64)]) -> FittedTrend {
        let data: BTreeMap<i32, f64> = pairs.iter().copied().collect();
        TrendFitter::new()
            .fit(&TimeSeries::from_yearly(&data).unwrap())
            .unwrap()
    }

    fn built_area() -> FittedTrend {
        trend(&[(2018, 20.0), (2019, 22.0), (2020, 25.0), (2021, 29.0), (2022, 34.0)])
    }

    #[test]
    fn built_area_forecast_matches_closed_form() {
        let forecasts = ForecastGenerator::default()
            .forecast(&built_area(), &[2025], MetricDomain::Percentage)
            .unwrap();
        let f = &forecasts[0];

        // 26 + 3.5 * (2025 - 2020)
        assert_relative_eq!(f.predicted, 43.5, epsilon = 1e-6);
        assert!((f.predicted - 44.5).abs() < 1.5);

        let rse = (3.5_f64 / 3.0).sqrt();
        let se = rse * (1.0 + 1.0 / 5.0 + 25.0 / 10.0_f64).sqrt();
        let t = t_critical(0.95, 3.0).unwrap();
        assert_relative_eq!(f.upper_bound - f.predicted, t * se, epsilon = 1e-6);
        assert!(f.width() > 1.0);
        assert_eq!(f.confidence_level, "95%");
    }

    #[test]
    fn interval_widens_with_distance() {
        let forecasts = ForecastGenerator::default()
            .forecast(&built_area(), &[2023, 2030], MetricDomain::Unbounded)
            .unwrap();
        assert!(forecasts[1].width() > forecasts[0].width());
    }

    #[test]
    fn two_point_trend_has_no_forecast() {
        let t = trend(&[(2020, 1.0), (2021, 2.0)]);
        assert!(ForecastGenerator::default()
            .forecast(&t, &[2025], MetricDomain::Unbounded)
            .is_none());
    }

    #[test]
    fn percentages_are_clamped() {
        let t = trend(&[(2018, 80.0), (2019, 86.0), (2020, 91.0), (2021, 97.0)]);
        let f = ForecastGenerator::default()
            .forecast(&t, &[2030], MetricDomain::Percentage)
            .unwrap();
        assert_eq!(f[0].predicted, 100.0);
        assert!(f[0].lower_bound <= f[0].predicted && f[0].predicted <= f[0].upper_bound);
    }

    #[test]
    fn indices_use_their_own_domain() {
        let mut trends = BTreeMap::new();
        trends.insert(
            "SAVI".to_string(),
            trend(&[(2018, 0.2), (2019, 0.1), (2020, 0.05), (2021, 0.01)]),
        );
        trends.insert(
            "NDBI".to_string(),
            trend(&[(2018, -0.2), (2019, -0.35), (2020, -0.5), (2021, -0.62)]),
        );
        trends.insert("EVI".to_string(), trend(&[(2020, 0.3), (2021, 0.31)]));

        let out = ForecastGenerator::default().forecast_indices(&trends, &[2035]);
        assert!(!out.contains_key("EVI"));
        assert!(out["SAVI"][0].lower_bound >= 0.0);
        assert!(out["NDBI"][0].lower_bound >= -1.0);
        assert_eq!(out["NDBI"][0].predicted, -1.0);
    }

    #[test]
    fn custom_confidence_level_is_labelled() {
        let generator = ForecastGenerator::new(ForecastConfig::default().with_confidence_level(0.9));
        let narrow = generator
            .forecast(&built_area(), &[2025], MetricDomain::Unbounded)
            .unwrap();
        let wide = ForecastGenerator::default()
            .forecast(&built_area(), &[2025], MetricDomain::Unbounded)
            .unwrap();
        assert_eq!(narrow[0].confidence_level, "90%");
        assert!(narrow[0].width() < wide[0].width());
    }
}
