//! Feature engineering for dense (daily) series.
//!
//! Every row carries calendar features. When the series is long enough,
//! lag and trailing rolling-mean features are added, computed on the target
//! after a centered 7-point smoothing pass that damps cloud-gap noise.

use crate::utils::stats::{centered_rolling_mean, mean};
use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Window of the centered smoothing applied before lag features.
pub const SMOOTHING_WINDOW: usize = 7;

/// Lags, in observations, used as features.
pub const LAGS: [usize; 3] = [1, 7, 30];

/// Trailing windows for rolling-mean features.
pub const ROLLING_WINDOWS: [usize; 2] = [7, 30];

/// Minimum number of rows left after dropping the lag warm-up period.
/// With the 30-row warm-up, lags start at 40 observations; shorter dense
/// series train on calendar features alone.
pub const MIN_LAGGED_ROWS: usize = 10;

const CALENDAR_NAMES: [&str; 6] = [
    "ordinal_day",
    "month",
    "year",
    "month_sin",
    "month_cos",
    "day_of_week",
];

const LAG_NAMES: [&str; 5] = [
    "lag_1",
    "lag_7",
    "lag_30",
    "rolling_mean_7",
    "rolling_mean_30",
];

fn warm_up() -> usize {
    LAGS.iter().chain(&ROLLING_WINDOWS).copied().max().unwrap_or(0)
}

/// Which feature groups a model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSet {
    pub use_lags: bool,
}

impl FeatureSet {
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = CALENDAR_NAMES.to_vec();
        if self.use_lags {
            names.extend(LAG_NAMES);
        }
        names
    }

    pub fn width(&self) -> usize {
        self.names().len()
    }

    /// Build one feature row for `date`.
    ///
    /// `history` holds the (smoothed) target values strictly before `date`.
    /// Lags reaching past the start of `history` read as zero.
    pub fn row(&self, date: NaiveDate, history: &[f64]) -> Vec<f64> {
        let mut row = calendar_features(date);
        if self.use_lags {
            let n = history.len();
            for lag in LAGS {
                row.push(if n >= lag { history[n - lag] } else { 0.0 });
            }
            for window in ROLLING_WINDOWS {
                let start = n.saturating_sub(window);
                row.push(if n > 0 { mean(&history[start..]) } else { 0.0 });
            }
        }
        row
    }

    /// Row for a future date when no history is available for the lag
    /// columns; every lag and rolling feature is zero.
    pub fn zero_filled_row(&self, date: NaiveDate) -> Vec<f64> {
        let mut row = calendar_features(date);
        if self.use_lags {
            row.extend(std::iter::repeat(0.0).take(LAG_NAMES.len()));
        }
        row
    }
}

/// Calendar features shared by training and future rows.
pub fn calendar_features(date: NaiveDate) -> Vec<f64> {
    let month = date.month() as f64;
    let angle = 2.0 * PI * month / 12.0;
    vec![
        date.num_days_from_ce() as f64,
        month,
        date.year() as f64,
        angle.sin(),
        angle.cos(),
        date.weekday().num_days_from_monday() as f64,
    ]
}

/// Design matrix and target for the dense path.
#[derive(Debug, Clone)]
pub struct TrainingFrame {
    pub features: FeatureSet,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
    pub target: Vec<f64>,
    /// Full target after optional smoothing, including warm-up rows.
    pub history: Vec<f64>,
}

impl TrainingFrame {
    /// Build the frame from observed points in timestamp order.
    ///
    /// Lag features are enabled when there are more than `lag_threshold`
    /// observations and enough rows survive the warm-up period.
    pub fn build(observed: &[(NaiveDate, f64)], lag_threshold: usize) -> Self {
        let values: Vec<f64> = observed.iter().map(|(_, v)| *v).collect();
        let warm_up = warm_up();
        let use_lags =
            values.len() > lag_threshold && values.len() >= warm_up + MIN_LAGGED_ROWS;
        let features = FeatureSet { use_lags };

        let history = if use_lags {
            centered_rolling_mean(&values, SMOOTHING_WINDOW)
        } else {
            values
        };

        let start = if use_lags { warm_up } else { 0 };
        let mut dates = Vec::with_capacity(observed.len() - start);
        let mut rows = Vec::with_capacity(observed.len() - start);
        let mut target = Vec::with_capacity(observed.len() - start);
        for (i, (date, _)) in observed.iter().enumerate().skip(start) {
            dates.push(*date);
            rows.push(features.row(*date, &history[..i]));
            target.push(history[i]);
        }

        Self {
            features,
            dates,
            rows,
            target,
            history,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
