//! Point forecasts from boosted dense-series models.
//!
//! Future rows carry synthetic calendar features. How lag and rolling
//! features are filled for those rows is a [`LagPolicy`] choice:
//!
//! - [`LagPolicy::ZeroFill`] sets every lag feature to zero. Models that
//!   lean on lags lose accuracy quickly past the first few days.
//! - [`LagPolicy::Recursive`] simulates day by day, feeding each
//!   prediction back in as the next step's history.

use crate::core::DailyForecast;
use crate::error::{Result, UrbanError};
use crate::trend::DenseModel;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// How lag features are built for future rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagPolicy {
    #[default]
    ZeroFill,
    Recursive,
}

/// Daily point forecaster over a [`DenseModel`].
#[derive(Debug, Clone, Default)]
pub struct DenseForecaster {
    policy: LagPolicy,
}

impl DenseForecaster {
    pub fn new(policy: LagPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> LagPolicy {
        self.policy
    }

    /// Forecast `horizon_days` days following the model's last observation.
    /// Stops early at the last representable calendar date.
    pub fn forecast(&self, model: &DenseModel, horizon_days: usize) -> Vec<DailyForecast> {
        let horizon = i64::try_from(horizon_days).unwrap_or(i64::MAX);
        let dates = (1..=horizon).map_while(|d| {
            Duration::try_days(d).and_then(|step| model.last_date.checked_add_signed(step))
        });

        match self.policy {
            LagPolicy::ZeroFill => dates
                .map(|date| DailyForecast {
                    date,
                    predicted: model.regressor.predict(&model.features.zero_filled_row(date)),
                })
                .collect(),
            LagPolicy::Recursive => {
                let mut history = model.history.clone();
                dates
                    .map(|date| {
                        let predicted = model.regressor.predict(&model.features.row(date, &history));
                        history.push(predicted);
                        DailyForecast { date, predicted }
                    })
                    .collect()
            }
        }
    }

    /// Forecast every day up to and including `target`.
    pub fn forecast_until(&self, model: &DenseModel, target: NaiveDate) -> Result<Vec<DailyForecast>> {
        let days = (target - model.last_date).num_days();
        if days <= 0 {
            return Err(UrbanError::InvalidParameter(format!(
                "target date {} is not after the last observation {}",
                target, model.last_date
            )));
        }
        Ok(self.forecast(model, days as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TimeSeries, TimeSeriesPoint};
    use crate::trend::{BoostingConfig, TrendFitter};

    fn model(n: usize) -> DenseModel {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let series = TimeSeries::new(
            (0..n)
                .map(|i| {
                    let v = 40.0 + 10.0 * ((i as f64) / 30.0).sin();
                    TimeSeriesPoint::new(start + Duration::days(i as i64), v)
                })
                .collect(),
        )
        .unwrap();
        TrendFitter::new()
            .with_boosting(BoostingConfig::default().with_estimators(20))
            .fit_dense(&series)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn default_policy_is_zero_fill() {
        assert_eq!(DenseForecaster::default().policy(), LagPolicy::ZeroFill);
    }

    #[test]
    fn forecast_covers_following_days() {
        let m = model(90);
        for policy in [LagPolicy::ZeroFill, LagPolicy::Recursive] {
            let out = DenseForecaster::new(policy).forecast(&m, 14);
            assert_eq!(out.len(), 14);
            assert_eq!(out[0].date, m.last_date() + Duration::days(1));
            assert_eq!(out[13].date, m.last_date() + Duration::days(14));
            assert!(out.iter().all(|f| f.predicted.is_finite()));
        }
    }

    #[test]
    fn recursive_forecast_stays_in_observed_range() {
        let m = model(120);
        let out = DenseForecaster::new(LagPolicy::Recursive).forecast(&m, 30);
        // Trees never extrapolate beyond the training targets
        assert!(out.iter().all(|f| f.predicted > 25.0 && f.predicted < 55.0));
    }

    #[test]
    fn forecast_stops_at_calendar_end() {
        let mut m = model(60);
        m.last_date = NaiveDate::MAX - Duration::days(2);
        for policy in [LagPolicy::ZeroFill, LagPolicy::Recursive] {
            let out = DenseForecaster::new(policy).forecast(&m, 10);
            assert_eq!(out.len(), 2);
            assert_eq!(out[1].date, NaiveDate::MAX);
        }
        assert_eq!(
            DenseForecaster::default().forecast_until(&m, NaiveDate::MAX).unwrap().len(),
            2
        );
    }

    #[test]
    fn forecast_until_rejects_past_dates() {
        let m = model(60);
        let forecaster = DenseForecaster::default();
        assert!(forecaster.forecast_until(&m, m.last_date()).is_err());
        let out = forecaster
            .forecast_until(&m, m.last_date() + Duration::days(3))
            .unwrap();
        assert_eq!(out.len(), 3);
    }
}
