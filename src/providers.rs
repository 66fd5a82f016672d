//! Boundaries to the external data collaborators.
//!
//! Imagery aggregation, land-cover composition and earthquake catalogs are
//! served by remote systems. The analysis code depends only on these
//! traits; concrete clients live outside this crate.

use crate::error::{Result, UrbanError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric names understood by imagery providers.
pub mod metric {
    pub const NDVI: &str = "NDVI";
    pub const PM25: &str = "PM2.5";
    pub const LST: &str = "LST";
    pub const PGA: &str = "PGA";
}

/// Geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        let lat_ok = (-90.0..=90.0).contains(&min_lat) && (-90.0..=90.0).contains(&max_lat);
        let lon_ok = (-180.0..=180.0).contains(&min_lon) && (-180.0..=180.0).contains(&max_lon);
        if !lat_ok || !lon_ok || min_lat > max_lat || min_lon > max_lon {
            return Err(UrbanError::InvalidParameter(format!(
                "invalid bounding box ({}, {}) - ({}, {})",
                min_lat, min_lon, max_lat, max_lon
            )));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Box of `radius_km` around a point, using 111 km per degree.
    pub fn around(lat: f64, lon: f64, radius_km: f64) -> Result<Self> {
        let d_lat = radius_km / 111.0;
        let d_lon = radius_km / (111.0 * lat.to_radians().cos().abs().max(1e-6));
        Self::new(
            (lat - d_lat).max(-90.0),
            (lon - d_lon).max(-180.0),
            (lat + d_lat).min(90.0),
            (lon + d_lon).min(180.0),
        )
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// A named area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub bbox: BoundingBox,
}

impl Region {
    pub fn new(name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            name: name.into(),
            bbox,
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(UrbanError::InvalidParameter(format!(
                "date range starts after it ends: {} > {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// January 1st through December 31st of `year`.
    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = NaiveDate::from_ymd_opt(year, 12, 31);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(UrbanError::InvalidParameter(format!("year {} out of range", year))),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Outcome of an aggregate query.
///
/// Keeps "no qualifying imagery" apart from a measured value and from a
/// provider failure, so scorers can tell an assumed default from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Observation {
    Value(f64),
    NoData,
    Error(String),
}

impl Observation {
    /// The measured value, if finite.
    pub fn value(&self) -> Option<f64> {
        match self {
            Observation::Value(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        self.value().is_some()
    }
}

impl From<Option<f64>> for Observation {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Observation::NoData, Observation::Value)
    }
}

/// One catalog earthquake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicEvent {
    pub magnitude: f64,
    pub depth_km: f64,
    pub lat: f64,
    pub lon: f64,
    pub time: NaiveDateTime,
    pub place: String,
}

/// Spatially aggregated imagery statistics.
pub trait ImageryProvider {
    /// Mean of `metric` over `region` within `range`.
    fn get_aggregate(&self, region: &Region, metric: &str, range: &DateRange) -> Observation;
}

/// Annual land-cover composition.
pub trait ClassAreaProvider {
    /// Class name to share of the region in percent, or `None` when no
    /// classification exists for the year.
    fn get_class_areas(&self, region: &Region, year: i32) -> Option<BTreeMap<String, f64>>;
}

/// Earthquake catalog search.
pub trait SeismicCatalogProvider {
    fn fetch_events(
        &self,
        bbox: &BoundingBox,
        min_magnitude: f64,
        range: &DateRange,
    ) -> Result<Vec<SeismicEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_validates_order() {
        assert!(BoundingBox::new(28.4, 76.8, 28.9, 77.4).is_ok());
        assert!(BoundingBox::new(28.9, 76.8, 28.4, 77.4).is_err());
        assert!(BoundingBox::new(95.0, 0.0, 96.0, 1.0).is_err());
    }

    #[test]
    fn box_around_point_contains_it() {
        let bbox = BoundingBox::around(19.07, 72.87, 50.0).unwrap();
        assert!(bbox.contains(19.07, 72.87));
        let (lat, lon) = bbox.center();
        assert!((lat - 19.07).abs() < 1e-9);
        assert!((lon - 72.87).abs() < 1e-9);
        assert!(bbox.max_lat - bbox.min_lat > 0.89 && bbox.max_lat - bbox.min_lat < 0.91);
    }

    #[test]
    fn date_range_for_year() {
        let range = DateRange::year(2024).unwrap();
        assert_eq!(range.days(), 366);
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
    }

    #[test]
    fn observation_distinguishes_states() {
        assert_eq!(Observation::Value(0.0).value(), Some(0.0));
        assert_eq!(Observation::NoData.value(), None);
        assert_eq!(Observation::Value(f64::NAN).value(), None);
        assert!(!Observation::Error("timeout".into()).is_value());
        assert_eq!(Observation::from(None), Observation::NoData);
        assert_eq!(Observation::from(Some(2.0)), Observation::Value(2.0));
    }
}
