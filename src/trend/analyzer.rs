//! Multi-series trend analysis and significance summaries.

use crate::core::TimeSeries;
use crate::trend::fitter::{FittedTrend, TrendDirection, TrendFitter};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One significant change in a [`TrendSummary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendChange {
    pub name: String,
    pub change_per_year: f64,
    pub r_squared: f64,
}

/// Partition of fitted trends by significance and direction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub significant_increases: Vec<TrendChange>,
    pub significant_decreases: Vec<TrendChange>,
    pub stable: Vec<String>,
    pub data_type: String,
}

impl TrendSummary {
    pub fn is_empty(&self) -> bool {
        self.significant_increases.is_empty()
            && self.significant_decreases.is_empty()
            && self.stable.is_empty()
    }
}

/// Runs a [`TrendFitter`] over a set of named series.
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    fitter: TrendFitter,
}

impl TrendAnalyzer {
    pub fn new(fitter: TrendFitter) -> Self {
        Self { fitter }
    }

    pub fn fitter(&self) -> &TrendFitter {
        &self.fitter
    }

    /// Fit every series. Series that are too short are omitted; series
    /// whose fit fails are logged and omitted.
    pub fn analyze(&self, series_by_name: &BTreeMap<String, TimeSeries>) -> BTreeMap<String, FittedTrend> {
        let mut trends = BTreeMap::new();
        for (name, series) in series_by_name {
            match self.fitter.try_fit(series) {
                Ok(Some(trend)) => {
                    trends.insert(name.clone(), trend);
                }
                Ok(None) => debug!(series = %name, "insufficient history, skipped"),
                Err(e) => warn!(series = %name, error = %e, "trend computation failed, skipped"),
            }
        }
        trends
    }

    /// Fit yearly index means keyed by index name then year.
    pub fn analyze_indices(
        &self,
        yearly: &BTreeMap<String, BTreeMap<i32, f64>>,
    ) -> BTreeMap<String, FittedTrend> {
        let series: BTreeMap<String, TimeSeries> = yearly
            .iter()
            .filter_map(|(name, by_year)| match TimeSeries::from_yearly(by_year) {
                Ok(ts) => Some((name.clone(), ts.with_label(name.as_str()))),
                Err(e) => {
                    warn!(series = %name, error = %e, "invalid yearly series, skipped");
                    None
                }
            })
            .collect();
        self.analyze(&series)
    }

    /// Fit land-cover classes from a year -> {class -> percentage} table.
    ///
    /// Classes absent in some years are fitted on the years they appear in.
    pub fn analyze_lulc(
        &self,
        by_year: &BTreeMap<i32, BTreeMap<String, f64>>,
    ) -> BTreeMap<String, FittedTrend> {
        let classes: BTreeSet<&String> = by_year.values().flat_map(|c| c.keys()).collect();

        let pivoted: BTreeMap<String, BTreeMap<i32, f64>> = classes
            .into_iter()
            .map(|class| {
                let history = by_year
                    .iter()
                    .filter_map(|(year, areas)| areas.get(class).map(|v| (*year, *v)))
                    .collect();
                (class.clone(), history)
            })
            .collect();

        self.analyze_indices(&pivoted)
    }

    /// Partition trends into significant increases, significant decreases
    /// and stable names.
    pub fn summarize(&self, trends: &BTreeMap<String, FittedTrend>, data_type: &str) -> TrendSummary {
        summarize(trends, data_type)
    }
}

/// Partition trends by significance and direction.
pub fn summarize(trends: &BTreeMap<String, FittedTrend>, data_type: &str) -> TrendSummary {
    let mut summary = TrendSummary {
        significant_increases: Vec::new(),
        significant_decreases: Vec::new(),
        stable: Vec::new(),
        data_type: data_type.to_string(),
    };

    for (name, trend) in trends {
        let change = || TrendChange {
            name: name.clone(),
            change_per_year: trend.slope,
            r_squared: trend.r_squared,
        };
        match (trend.significant, trend.trend_direction) {
            (true, TrendDirection::Increasing) => summary.significant_increases.push(change()),
            (true, TrendDirection::Decreasing) => summary.significant_decreases.push(change()),
            _ => summary.stable.push(name.clone()),
        }
    }
    summary
}
