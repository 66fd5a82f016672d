//! Weighted multi-factor seismic risk index.
//!
//! Five components are bucketed to 20/40/60/80/100 and combined with fixed
//! weights:
//!
//! | component | weight | input                                   |
//! |-----------|--------|-----------------------------------------|
//! | pga       | 0.40   | peak ground acceleration (g)            |
//! | zone      | 0.20   | IS 1893 seismic zone                    |
//! | history   | 0.20   | catalog event count in the fetch window |
//! | fault     | 0.10   | distance to nearest fault (km)          |
//! | exposure  | 0.10   | built-up share in [0, 1]                |
//!
//! Without fault data the fault weight is dropped and the rest rescaled to
//! sum to one.

use crate::error::{Result, UrbanError};
use crate::providers::SeismicEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// IS 1893 seismic zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeismicZone {
    II,
    III,
    IV,
    V,
}

impl SeismicZone {
    /// Zone factor Z (design PGA in g).
    pub fn z_factor(&self) -> f64 {
        match self {
            SeismicZone::II => 0.10,
            SeismicZone::III => 0.16,
            SeismicZone::IV => 0.24,
            SeismicZone::V => 0.36,
        }
    }

    pub fn risk_label(&self) -> &'static str {
        match self {
            SeismicZone::II => "Low",
            SeismicZone::III => "Moderate",
            SeismicZone::IV => "High",
            SeismicZone::V => "Very High",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeismicZone::II => "II",
            SeismicZone::III => "III",
            SeismicZone::IV => "IV",
            SeismicZone::V => "V",
        }
    }
}

impl fmt::Display for SeismicZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeismicZone {
    type Err = UrbanError;

    /// Accepts roman or arabic numerals, optionally prefixed with "Zone".
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let token = upper.strip_prefix("ZONE").unwrap_or(&upper).trim();
        match token {
            "II" | "2" => Ok(SeismicZone::II),
            "III" | "3" => Ok(SeismicZone::III),
            "IV" | "4" => Ok(SeismicZone::IV),
            "V" | "5" => Ok(SeismicZone::V),
            _ => Err(UrbanError::InvalidParameter(format!(
                "unknown seismic zone '{}'",
                trimmed
            ))),
        }
    }
}

const IS_1893_ZONES: &[(&str, SeismicZone)] = &[
    ("Guwahati", SeismicZone::V),
    ("Srinagar", SeismicZone::V),
    ("Bhuj", SeismicZone::V),
    ("Port Blair", SeismicZone::V),
    ("Mandi", SeismicZone::V),
    ("Delhi", SeismicZone::IV),
    ("Patna", SeismicZone::IV),
    ("Mumbai", SeismicZone::IV),
    ("Kolkata", SeismicZone::IV),
    ("Shimla", SeismicZone::IV),
    ("Dehradun", SeismicZone::IV),
    ("Jammu", SeismicZone::IV),
    ("Chennai", SeismicZone::III),
    ("Lucknow", SeismicZone::III),
    ("Kanpur", SeismicZone::III),
    ("Varanasi", SeismicZone::III),
    ("Jaipur", SeismicZone::III),
    ("Ahmedabad", SeismicZone::III),
    ("Pune", SeismicZone::III),
    ("Bhubaneswar", SeismicZone::III),
    ("Kozhikode", SeismicZone::III),
    ("Trivandrum", SeismicZone::III),
    ("Hyderabad", SeismicZone::II),
    ("Bangalore", SeismicZone::II),
    ("Bhopal", SeismicZone::II),
    ("Ranchi", SeismicZone::II),
    ("Raipur", SeismicZone::II),
    ("Nagpur", SeismicZone::II),
    ("Visakhapatnam", SeismicZone::II),
];

/// Zone for a region by city-name match; Zone III when no city matches.
pub fn lookup_zone(region_name: &str) -> SeismicZone {
    let name = region_name.to_lowercase();
    IS_1893_ZONES
        .iter()
        .find(|(city, _)| name.contains(&city.to_lowercase()))
        .map_or(SeismicZone::III, |(_, zone)| *zone)
}

/// Risk class of a 0–100 seismic score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskClass {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskClass {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskClass::VeryHigh
        } else if score >= 60.0 {
            RiskClass::High
        } else if score >= 40.0 {
            RiskClass::Moderate
        } else if score >= 20.0 {
            RiskClass::Low
        } else {
            RiskClass::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClass::VeryLow => "Very Low",
            RiskClass::Low => "Low",
            RiskClass::Moderate => "Moderate",
            RiskClass::High => "High",
            RiskClass::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk component identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Pga,
    Zone,
    History,
    Fault,
    Exposure,
}

/// Base component weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeismicWeights {
    pub pga: f64,
    pub zone: f64,
    pub history: f64,
    pub fault: f64,
    pub exposure: f64,
}

impl Default for SeismicWeights {
    fn default() -> Self {
        Self {
            pga: 0.40,
            zone: 0.20,
            history: 0.20,
            fault: 0.10,
            exposure: 0.10,
        }
    }
}

impl SeismicWeights {
    fn validate(&self) -> Result<()> {
        let all = [self.pga, self.zone, self.history, self.fault, self.exposure];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(UrbanError::InvalidParameter(
                "seismic weights must be finite and non-negative".into(),
            ));
        }
        if self.pga + self.zone + self.history + self.exposure <= 0.0 {
            return Err(UrbanError::InvalidParameter(
                "seismic weights other than fault must not all be zero".into(),
            ));
        }
        Ok(())
    }

    /// Weights actually applied, normalized to sum to one.
    fn effective(&self, with_fault: bool) -> Vec<(Component, f64)> {
        let mut weights = vec![
            (Component::Pga, self.pga),
            (Component::Zone, self.zone),
            (Component::History, self.history),
            (Component::Exposure, self.exposure),
        ];
        if with_fault {
            weights.push((Component::Fault, self.fault));
        }
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        weights.iter().map(|&(c, w)| (c, w / total)).collect()
    }
}

/// Score, applied weight and their product for one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComponentScore {
    pub score: f64,
    pub weight: f64,
    pub weighted_score: f64,
}

/// Full seismic risk result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeismicRiskBreakdown {
    pub total_score: f64,
    pub risk_class: RiskClass,
    pub components: BTreeMap<Component, ComponentScore>,
}

impl SeismicRiskBreakdown {
    pub fn weight_sum(&self) -> f64 {
        self.components.values().map(|c| c.weight).sum()
    }
}

/// Inputs to [`SeismicRiskScorer::score`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeismicInputs {
    pub pga: f64,
    pub zone: Option<SeismicZone>,
    pub historical_count: usize,
    pub fault_dist_km: Option<f64>,
    pub exposure_index: f64,
}

pub fn pga_score(pga: f64) -> f64 {
    if pga >= 0.40 {
        100.0
    } else if pga >= 0.24 {
        80.0
    } else if pga >= 0.16 {
        60.0
    } else if pga >= 0.05 {
        40.0
    } else {
        20.0
    }
}

/// Unknown zones score like Zone II.
pub fn zone_score(zone: Option<SeismicZone>) -> f64 {
    match zone {
        Some(SeismicZone::V) => 100.0,
        Some(SeismicZone::IV) => 80.0,
        Some(SeismicZone::III) => 60.0,
        Some(SeismicZone::II) | None => 40.0,
    }
}

pub fn history_score(count: usize) -> f64 {
    match count {
        50.. => 100.0,
        20..=49 => 80.0,
        10..=19 => 60.0,
        2..=9 => 40.0,
        _ => 20.0,
    }
}

pub fn fault_score(dist_km: f64) -> f64 {
    if dist_km < 10.0 {
        100.0
    } else if dist_km < 30.0 {
        80.0
    } else if dist_km < 50.0 {
        60.0
    } else if dist_km < 100.0 {
        40.0
    } else {
        20.0
    }
}

pub fn exposure_score(exposure: f64) -> f64 {
    if exposure >= 0.5 {
        100.0
    } else if exposure >= 0.3 {
        80.0
    } else if exposure >= 0.15 {
        60.0
    } else if exposure >= 0.05 {
        40.0
    } else {
        20.0
    }
}

/// Seismic risk scorer.
#[derive(Debug, Clone, Default)]
pub struct SeismicRiskScorer {
    weights: SeismicWeights,
}

impl SeismicRiskScorer {
    pub fn new(weights: SeismicWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &SeismicWeights {
        &self.weights
    }

    /// Score a location. A `None` fault distance drops the fault component
    /// and rescales the remaining weights.
    pub fn score(
        &self,
        pga: f64,
        zone: Option<SeismicZone>,
        historical_count: usize,
        fault_dist_km: Option<f64>,
        exposure_index: f64,
    ) -> SeismicRiskBreakdown {
        let fault_dist_km = fault_dist_km.filter(|d| !d.is_nan());
        let component_score = |c: Component| match c {
            Component::Pga => pga_score(pga),
            Component::Zone => zone_score(zone),
            Component::History => history_score(historical_count),
            Component::Fault => fault_dist_km.map_or(0.0, fault_score),
            Component::Exposure => exposure_score(exposure_index),
        };

        let components: BTreeMap<Component, ComponentScore> = self
            .weights
            .effective(fault_dist_km.is_some())
            .into_iter()
            .map(|(c, weight)| {
                let score = component_score(c);
                (
                    c,
                    ComponentScore {
                        score,
                        weight,
                        weighted_score: score * weight,
                    },
                )
            })
            .collect();

        let total_score = components
            .values()
            .map(|c| c.weighted_score)
            .sum::<f64>()
            .clamp(0.0, 100.0);

        SeismicRiskBreakdown {
            total_score,
            risk_class: RiskClass::from_score(total_score),
            components,
        }
    }

    pub fn score_inputs(&self, inputs: &SeismicInputs) -> SeismicRiskBreakdown {
        self.score(
            inputs.pga,
            inputs.zone,
            inputs.historical_count,
            inputs.fault_dist_km,
            inputs.exposure_index,
        )
    }
}

/// Summary statistics of a catalog search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub count: usize,
    pub max_magnitude: Option<f64>,
    pub mean_depth_km: Option<f64>,
    pub strongest_place: Option<String>,
}

pub fn summarize_events(events: &[SeismicEvent]) -> CatalogSummary {
    let strongest = events
        .iter()
        .filter(|e| e.magnitude.is_finite())
        .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude));
    let depths: Vec<f64> = events
        .iter()
        .map(|e| e.depth_km)
        .filter(|d| d.is_finite())
        .collect();

    CatalogSummary {
        count: events.len(),
        max_magnitude: strongest.map(|e| e.magnitude),
        mean_depth_km: (!depths.is_empty()).then(|| depths.iter().sum::<f64>() / depths.len() as f64),
        strongest_place: strongest.map(|e| e.place.clone()),
    }
}
