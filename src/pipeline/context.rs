//! Request-scoped cache of collaborator results.
//!
//! One [`RequestContext`] lives for one dashboard interaction. Repeated
//! lookups of the same aggregate, class table or catalog search within the
//! request hit the provider once. Nothing outlives the request.

use crate::providers::{
    BoundingBox, ClassAreaProvider, DateRange, ImageryProvider, Observation, Region,
    SeismicCatalogProvider, SeismicEvent,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Region identity for cache keys: the name plus the box corners in
/// micro-degrees. Uploaded shapes often share a generic name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RegionKey {
    name: String,
    corners_micro: [i64; 4],
}

impl RegionKey {
    fn new(name: &str, bbox: &BoundingBox) -> Self {
        let micro = |deg: f64| (deg * 1e6).round() as i64;
        Self {
            name: name.to_string(),
            corners_micro: [
                micro(bbox.min_lat),
                micro(bbox.min_lon),
                micro(bbox.max_lat),
                micro(bbox.max_lon),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AggregateKey {
    region: RegionKey,
    metric: String,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CatalogKey {
    region: RegionKey,
    min_magnitude_milli: i64,
    start: NaiveDate,
    end: NaiveDate,
}

/// Cache for one request.
#[derive(Debug, Default)]
pub struct RequestContext {
    aggregates: HashMap<AggregateKey, Observation>,
    class_areas: HashMap<(RegionKey, i32), Option<BTreeMap<String, f64>>>,
    catalogs: HashMap<CatalogKey, Option<Vec<SeismicEvent>>>,
    provider_calls: usize,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls that actually reached a provider.
    pub fn provider_calls(&self) -> usize {
        self.provider_calls
    }

    pub fn clear(&mut self) {
        self.aggregates.clear();
        self.class_areas.clear();
        self.catalogs.clear();
    }

    pub fn aggregate(
        &mut self,
        provider: &dyn ImageryProvider,
        region: &Region,
        metric: &str,
        range: &DateRange,
    ) -> Observation {
        let key = AggregateKey {
            region: RegionKey::new(&region.name, &region.bbox),
            metric: metric.to_string(),
            start: range.start,
            end: range.end,
        };
        if let Some(cached) = self.aggregates.get(&key) {
            return cached.clone();
        }
        self.provider_calls += 1;
        let observation = provider.get_aggregate(region, metric, range);
        if let Observation::Error(e) = &observation {
            warn!(region = %region.name, metric, error = %e, "imagery aggregate failed");
        }
        self.aggregates.insert(key, observation.clone());
        observation
    }

    pub fn class_areas(
        &mut self,
        provider: &dyn ClassAreaProvider,
        region: &Region,
        year: i32,
    ) -> Option<BTreeMap<String, f64>> {
        let key = (RegionKey::new(&region.name, &region.bbox), year);
        if let Some(cached) = self.class_areas.get(&key) {
            return cached.clone();
        }
        self.provider_calls += 1;
        let areas = provider.get_class_areas(region, year);
        if areas.is_none() {
            debug!(region = %region.name, year, "no land-cover classification");
        }
        self.class_areas.insert(key, areas.clone());
        areas
    }

    /// Catalog events in `bbox`. Provider failures are logged and cached
    /// as `None`.
    pub fn events(
        &mut self,
        provider: &dyn SeismicCatalogProvider,
        region: &Region,
        bbox: &BoundingBox,
        min_magnitude: f64,
        range: &DateRange,
    ) -> Option<Vec<SeismicEvent>> {
        let key = CatalogKey {
            region: RegionKey::new(&region.name, bbox),
            min_magnitude_milli: (min_magnitude * 1000.0).round() as i64,
            start: range.start,
            end: range.end,
        };
        if let Some(cached) = self.catalogs.get(&key) {
            return cached.clone();
        }
        self.provider_calls += 1;
        let events = match provider.fetch_events(bbox, min_magnitude, range) {
            Ok(events) => Some(events),
            Err(e) => {
                warn!(region = %region.name, error = %e, "earthquake catalog unavailable");
                None
            }
        };
        self.catalogs.insert(key, events.clone());
        events
    }
}
