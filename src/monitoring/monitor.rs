//! Threshold checks over the latest imagery aggregates.

use crate::error::Result;
use crate::monitoring::store::{Alert, PersistenceStore, RegionRecord};
use crate::providers::{DateRange, ImageryProvider, Observation, Region};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Satellite pollutant products checked over the short window.
pub const POLLUTANT_METRICS: [&str; 7] = ["NO2", "CO", "SO2", "O3", "PM25", "PM2.5", "PM10"];

/// Look-back windows for the latest value of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub pollutant_window_days: i64,
    pub lst_window_days: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            pollutant_window_days: 3,
            lst_window_days: 7,
        }
    }
}

impl MonitorConfig {
    /// Window for `metric`, or `None` when the metric cannot be monitored.
    pub fn window_days(&self, metric: &str) -> Option<i64> {
        if POLLUTANT_METRICS.contains(&metric) {
            Some(self.pollutant_window_days)
        } else if metric.starts_with("LST") {
            Some(self.lst_window_days)
        } else {
            None
        }
    }
}

/// Outcome of one monitoring pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorRun {
    pub regions_checked: usize,
    pub alerts: Vec<Alert>,
    /// Region name and error of every region whose check failed.
    pub failures: Vec<(String, String)>,
}

/// Evaluates stored thresholds for every monitored region.
pub struct Monitor<'a> {
    imagery: &'a dyn ImageryProvider,
    config: MonitorConfig,
}

impl<'a> Monitor<'a> {
    pub fn new(imagery: &'a dyn ImageryProvider, config: MonitorConfig) -> Self {
        Self { imagery, config }
    }

    /// Check one region and log every triggered alert.
    pub fn check_region(
        &self,
        store: &mut dyn PersistenceStore,
        record: &RegionRecord,
        now: NaiveDateTime,
    ) -> Result<Vec<Alert>> {
        let thresholds = store.get_thresholds(record.id)?;
        if thresholds.is_empty() {
            debug!(region = %record.name, "no thresholds, skipped");
            return Ok(Vec::new());
        }
        let region = Region::new(record.name.clone(), record.bbox);
        let today = now.date();
        let mut alerts = Vec::new();

        for threshold in thresholds.iter().filter(|t| t.enabled) {
            let Some(days) = self.config.window_days(&threshold.metric) else {
                debug!(region = %record.name, metric = %threshold.metric, "metric not monitorable");
                continue;
            };
            let range = DateRange::new(today - Duration::days(days), today)?;
            let value = match self.imagery.get_aggregate(&region, &threshold.metric, &range) {
                Observation::Value(v) if v.is_finite() => v,
                Observation::Error(e) => {
                    warn!(region = %record.name, metric = %threshold.metric, error = %e, "latest value unavailable");
                    continue;
                }
                _ => continue,
            };
            if !threshold.operator.triggers(value, threshold.value) {
                continue;
            }

            let message = format!(
                "Alert! {} in {} is {:.2} (Threshold: {} {})",
                threshold.metric, record.name, value, threshold.operator, threshold.value
            );
            info!(region = %record.name, metric = %threshold.metric, value, "threshold triggered");
            let alert = Alert {
                timestamp: now,
                region_name: record.name.clone(),
                metric: threshold.metric.clone(),
                value,
                message,
                read: false,
            };
            store.log_alert(alert.clone())?;
            alerts.push(alert);
        }
        Ok(alerts)
    }

    /// Check every stored region. A failing region is recorded and the
    /// pass continues.
    pub fn run(&self, store: &mut dyn PersistenceStore, now: NaiveDateTime) -> Result<MonitorRun> {
        let regions = store.get_all_regions()?;
        let mut run = MonitorRun::default();
        for record in &regions {
            run.regions_checked += 1;
            match self.check_region(store, record, now) {
                Ok(alerts) => run.alerts.extend(alerts),
                Err(e) => {
                    warn!(region = %record.name, error = %e, "region check failed");
                    run.failures.push((record.name.clone(), e.to_string()));
                }
            }
        }
        info!(
            regions = run.regions_checked,
            alerts = run.alerts.len(),
            failures = run.failures.len(),
            "monitoring pass complete"
        );
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::store::{InMemoryStore, Operator, Threshold};
    use crate::providers::BoundingBox;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    struct Recording {
        ranges: RefCell<Vec<(String, i64)>>,
    }

    impl ImageryProvider for Recording {
        fn get_aggregate(&self, region: &Region, metric: &str, range: &DateRange) -> Observation {
            self.ranges.borrow_mut().push((metric.to_string(), range.days()));
            match (region.name.as_str(), metric) {
                ("Delhi", "NO2") => Observation::Value(0.00031),
                ("Delhi", "LST_Day") => Observation::Value(38.5),
                ("Shimla", "LST_Day") => Observation::Error("quota exceeded".into()),
                _ => Observation::NoData,
            }
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 20)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(28.4, 76.8, 28.9, 77.4).unwrap()
    }

    #[test]
    fn triggered_thresholds_are_logged() {
        let provider = Recording {
            ranges: RefCell::new(Vec::new()),
        };
        let mut store = InMemoryStore::new();
        let delhi = store.add_region("Delhi", bbox(), now()).unwrap().unwrap();
        store.set_threshold(delhi, Threshold::new("NO2", Operator::Above, 0.0002)).unwrap();
        store.set_threshold(delhi, Threshold::new("LST_Day", Operator::Above, 40.0)).unwrap();
        store
            .set_threshold(delhi, Threshold::new("CO", Operator::Above, 0.0).disabled())
            .unwrap();
        store.set_threshold(delhi, Threshold::new("NDVI", Operator::Below, 0.3)).unwrap();
        let shimla = store.add_region("Shimla", bbox(), now()).unwrap().unwrap();
        store.set_threshold(shimla, Threshold::new("LST_Day", Operator::Above, 25.0)).unwrap();
        store.add_region("Goa", bbox(), now()).unwrap();

        let monitor = Monitor::new(&provider, MonitorConfig::default());
        let run = monitor.run(&mut store, now()).unwrap();

        assert_eq!(run.regions_checked, 3);
        assert!(run.failures.is_empty());
        assert_eq!(run.alerts.len(), 1);
        assert_eq!(
            run.alerts[0].message,
            "Alert! NO2 in Delhi is 0.00 (Threshold: > 0.0002)"
        );
        assert_eq!(store.get_unread_count().unwrap(), 1);

        // disabled and unmonitorable metrics never reach the provider
        let ranges = provider.ranges.borrow();
        assert_eq!(ranges.len(), 3);
        assert!(ranges.contains(&("NO2".to_string(), 4)));
        assert!(ranges.contains(&("LST_Day".to_string(), 8)));
    }

    #[test]
    fn windows_by_metric_family() {
        let config = MonitorConfig::default();
        assert_eq!(config.window_days("PM25"), Some(3));
        assert_eq!(config.window_days("LST_Night"), Some(7));
        assert_eq!(config.window_days("NDVI"), None);
    }
}
