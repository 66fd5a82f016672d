//! Semantic value domains for forecast clamping.

use serde::{Deserialize, Serialize};

/// Range a metric can physically take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricDomain {
    /// Area share in percent, [0, 100].
    Percentage,
    /// Bounded index such as SAVI, [0, 1].
    UnitInterval,
    /// Normalized-difference index such as NDVI, [-1, 1].
    SignedUnit,
    /// No clamping (temperatures, concentrations).
    Unbounded,
}

impl MetricDomain {
    /// Lower and upper bound of the domain.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            MetricDomain::Percentage => (0.0, 100.0),
            MetricDomain::UnitInterval => (0.0, 1.0),
            MetricDomain::SignedUnit => (-1.0, 1.0),
            MetricDomain::Unbounded => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.bounds();
        value.clamp(lo, hi)
    }

    /// Domain of a spectral index by name. Unknown names are unbounded.
    pub fn for_index(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "SAVI" => MetricDomain::UnitInterval,
            "NDVI" | "NDWI" | "NDBI" | "EVI" => MetricDomain::SignedUnit,
            _ => MetricDomain::Unbounded,
        }
    }
}
