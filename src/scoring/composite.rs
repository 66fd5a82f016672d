//! Urban Sustainability Score (USS).
//!
//! Each module scores 0–25. The composite is the sum normalized to 0–100
//! over however many modules were selected, so classification thresholds
//! always apply to a 0–100 value.
//!
//! Missing inputs never fail a score. A documented default is substituted
//! and the module is marked [`Provenance::Assumed`].

use crate::error::{Result, UrbanError};
use crate::providers::Observation;
use crate::scoring::aqi::pm25_to_aqi;
use crate::scoring::seismic::SeismicRiskBreakdown;
use crate::trend::FittedTrend;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum score of one module.
pub const MODULE_MAX: f64 = 25.0;

/// NDVI at which the vegetation term saturates.
const NDVI_SATURATION: f64 = 0.8;

/// Comfort floor and danger ceiling of land-surface temperature (°C).
const LST_FLOOR: f64 = 22.0;
const LST_CEILING: f64 = 50.0;

/// Sustainability dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Module {
    Vegetation,
    #[serde(rename = "Air Quality")]
    AirQuality,
    #[serde(rename = "Urban Heat")]
    UrbanHeat,
    #[serde(rename = "Future Risk")]
    FutureRisk,
    #[serde(rename = "Earthquake Safety")]
    EarthquakeSafety,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Vegetation,
        Module::AirQuality,
        Module::UrbanHeat,
        Module::FutureRisk,
        Module::EarthquakeSafety,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Vegetation => "Vegetation",
            Module::AirQuality => "Air Quality",
            Module::UrbanHeat => "Urban Heat",
            Module::FutureRisk => "Future Risk",
            Module::EarthquakeSafety => "Earthquake Safety",
        }
    }

    /// Name of the raw metric reported next to the score.
    pub fn metric_name(&self) -> &'static str {
        match self {
            Module::Vegetation => "NDVI",
            Module::AirQuality => "AQI",
            Module::UrbanHeat => "LST (°C)",
            Module::FutureRisk => "Risk Index",
            Module::EarthquakeSafety => "Comp. Risk",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = UrbanError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Module::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UrbanError::InvalidParameter(format!("unknown module '{}'", wanted)))
    }
}

/// Letter grade of a module score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Grade `score` as a share of `max`: 80% A, 60% B, 40% C, 20% D.
pub fn grade(score: f64, max: f64) -> Grade {
    let pct = if max > 0.0 { score / max * 100.0 } else { 0.0 };
    if pct >= 80.0 {
        Grade::A
    } else if pct >= 60.0 {
        Grade::B
    } else if pct >= 40.0 {
        Grade::C
    } else if pct >= 20.0 {
        Grade::D
    } else {
        Grade::F
    }
}

/// USS classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Classification {
    Critical,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Excellent => "Excellent",
            Classification::Good => "Good",
            Classification::Moderate => "Moderate",
            Classification::Poor => "Poor",
            Classification::Critical => "Critical",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Classification::Excellent => "Highly sustainable urban environment.",
            Classification::Good => "Sustainable with minor areas for improvement.",
            Classification::Moderate => "Balanced but facing notable environmental pressures.",
            Classification::Poor => "Significant environmental stress requiring intervention.",
            Classification::Critical => "Severe environmental degradation; urgent action needed.",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a 0–100 total.
pub fn classify(total: f64) -> Classification {
    if total >= 80.0 {
        Classification::Excellent
    } else if total >= 60.0 {
        Classification::Good
    } else if total >= 40.0 {
        Classification::Moderate
    } else if total >= 20.0 {
        Classification::Poor
    } else {
        Classification::Critical
    }
}

fn clamp_module(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, MODULE_MAX)
    }
}

/// `25 * (clamp(ndvi / 0.8, 0, 1) + (1 - impervious)) / 2`.
pub fn score_vegetation(ndvi_mean: f64, impervious_ratio: f64) -> f64 {
    let ndvi_norm = (ndvi_mean / NDVI_SATURATION).clamp(0.0, 1.0);
    let impervious = impervious_ratio.clamp(0.0, 1.0);
    clamp_module(MODULE_MAX * (ndvi_norm + (1.0 - impervious)) / 2.0)
}

/// `25 * (1 - aqi / 500)` with the AQI derived from PM2.5.
pub fn score_air_quality(pm25_mean: f64) -> f64 {
    clamp_module(aqi_score(pm25_to_aqi(pm25_mean)))
}

fn aqi_score(aqi: f64) -> f64 {
    MODULE_MAX * (1.0 - aqi / 500.0)
}

/// Linear in LST between 22 °C (full score) and 50 °C (zero).
pub fn score_urban_heat(lst_celsius: f64) -> f64 {
    let lst = lst_celsius.clamp(LST_FLOOR, LST_CEILING);
    clamp_module(MODULE_MAX * (1.0 - (lst - LST_FLOOR) / (LST_CEILING - LST_FLOOR)))
}

/// `25 * (1 - total / 100)`: low seismic risk scores high.
pub fn score_earthquake_safety(breakdown: &SeismicRiskBreakdown) -> f64 {
    clamp_module(MODULE_MAX * (1.0 - breakdown.total_score / 100.0))
}

/// Additive land-cover risk heuristic. Not a fitted model: a base risk
/// plus a fixed penalty for each adverse class trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FutureRiskPolicy {
    pub base_risk: f64,
    /// Added when the built-area slope is positive.
    pub urbanization_penalty: f64,
    /// Added when the tree-cover slope is negative.
    pub tree_loss_penalty: f64,
    /// Added when the grass slope is negative.
    pub grass_loss_penalty: f64,
    /// Risk assumed when no trends are available.
    pub no_data_risk: f64,
    pub built_area_class: String,
    pub tree_class: String,
    pub grass_class: String,
}

impl Default for FutureRiskPolicy {
    fn default() -> Self {
        Self {
            base_risk: 0.2,
            urbanization_penalty: 0.2,
            tree_loss_penalty: 0.2,
            grass_loss_penalty: 0.1,
            no_data_risk: 0.5,
            built_area_class: "Built Area".to_string(),
            tree_class: "Trees".to_string(),
            grass_class: "Grass".to_string(),
        }
    }
}

impl FutureRiskPolicy {
    /// Risk in [0, 1] from land-cover trends.
    pub fn risk(&self, trends: &BTreeMap<String, FittedTrend>) -> f64 {
        let slope = |class: &str| trends.get(class).map(|t| t.slope);
        let mut risk = self.base_risk;
        if slope(&self.built_area_class).is_some_and(|s| s > 0.0) {
            risk += self.urbanization_penalty;
        }
        if slope(&self.tree_class).is_some_and(|s| s < 0.0) {
            risk += self.tree_loss_penalty;
        }
        if slope(&self.grass_class).is_some_and(|s| s < 0.0) {
            risk += self.grass_loss_penalty;
        }
        risk.clamp(0.0, 1.0)
    }
}

/// Values assumed when a provider has no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringDefaults {
    pub ndvi: f64,
    pub impervious_ratio: f64,
    pub pm25: f64,
    pub aqi: f64,
    pub lst_celsius: f64,
}

impl Default for ScoringDefaults {
    fn default() -> Self {
        Self {
            ndvi: 0.0,
            impervious_ratio: 0.5,
            pm25: 30.0,
            aqi: 100.0,
            lst_celsius: 30.0,
        }
    }
}

/// Whether a module was computed from data or from defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Measured,
    Assumed,
}

/// Score of one sustainability module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleScore {
    pub module: Module,
    pub score: f64,
    pub grade: Grade,
    pub raw_value: f64,
    pub metric_name: String,
    pub provenance: Provenance,
}

impl ModuleScore {
    pub fn new(module: Module, score: f64, raw_value: f64, provenance: Provenance) -> Self {
        let score = clamp_module(score);
        Self {
            module,
            score,
            grade: grade(score, MODULE_MAX),
            raw_value,
            metric_name: module.metric_name().to_string(),
            provenance,
        }
    }
}

/// Composite USS over the selected modules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeScore {
    pub total: f64,
    pub classification: Classification,
    pub component_scores: Vec<ModuleScore>,
}

impl CompositeScore {
    pub fn get(&self, module: Module) -> Option<&ModuleScore> {
        self.component_scores.iter().find(|s| s.module == module)
    }

    /// Lowest-scoring module; ties go to the first listed.
    pub fn weakest(&self) -> Option<&ModuleScore> {
        self.component_scores
            .iter()
            .fold(None, |weakest: Option<&ModuleScore>, s| match weakest {
                Some(w) if w.score <= s.score => Some(w),
                _ => Some(s),
            })
    }

    pub fn assumed_modules(&self) -> Vec<Module> {
        self.component_scores
            .iter()
            .filter(|s| s.provenance == Provenance::Assumed)
            .map(|s| s.module)
            .collect()
    }
}

/// Computes module scores and the composite USS.
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    risk_policy: FutureRiskPolicy,
    defaults: ScoringDefaults,
}

impl CompositeScorer {
    pub fn new(risk_policy: FutureRiskPolicy, defaults: ScoringDefaults) -> Self {
        Self {
            risk_policy,
            defaults,
        }
    }

    pub fn risk_policy(&self) -> &FutureRiskPolicy {
        &self.risk_policy
    }

    pub fn defaults(&self) -> &ScoringDefaults {
        &self.defaults
    }

    /// Future-risk score from land-cover trends.
    pub fn score_future_risk(&self, trends: &BTreeMap<String, FittedTrend>) -> f64 {
        clamp_module(MODULE_MAX * (1.0 - self.risk_policy.risk(trends)))
    }

    pub fn vegetation(&self, ndvi: &Observation, impervious: &Observation) -> ModuleScore {
        let provenance = if ndvi.is_value() && impervious.is_value() {
            Provenance::Measured
        } else {
            Provenance::Assumed
        };
        let ndvi = ndvi.value().unwrap_or(self.defaults.ndvi);
        let impervious = impervious.value().unwrap_or(self.defaults.impervious_ratio);
        ModuleScore::new(
            Module::Vegetation,
            score_vegetation(ndvi, impervious),
            ndvi,
            provenance,
        )
    }

    /// Air quality from mean PM2.5. The raw value is the AQI.
    pub fn air_quality(&self, pm25: &Observation) -> ModuleScore {
        match pm25.value() {
            Some(pm) => {
                let aqi = pm25_to_aqi(pm);
                ModuleScore::new(Module::AirQuality, aqi_score(aqi), aqi, Provenance::Measured)
            }
            None => ModuleScore::new(
                Module::AirQuality,
                aqi_score(self.defaults.aqi),
                self.defaults.aqi,
                Provenance::Assumed,
            ),
        }
    }

    pub fn urban_heat(&self, lst: &Observation) -> ModuleScore {
        let (lst, provenance) = match lst.value() {
            Some(v) => (v, Provenance::Measured),
            None => (self.defaults.lst_celsius, Provenance::Assumed),
        };
        ModuleScore::new(Module::UrbanHeat, score_urban_heat(lst), lst, provenance)
    }

    /// Future risk from land-cover trends. The raw value is the risk.
    pub fn future_risk(&self, trends: Option<&BTreeMap<String, FittedTrend>>) -> ModuleScore {
        match trends.filter(|t| !t.is_empty()) {
            Some(trends) => {
                let risk = self.risk_policy.risk(trends);
                ModuleScore::new(
                    Module::FutureRisk,
                    MODULE_MAX * (1.0 - risk),
                    risk,
                    Provenance::Measured,
                )
            }
            None => {
                let risk = self.risk_policy.no_data_risk;
                ModuleScore::new(
                    Module::FutureRisk,
                    MODULE_MAX * (1.0 - risk),
                    risk,
                    Provenance::Assumed,
                )
            }
        }
    }

    /// Earthquake safety. The raw value is the seismic risk total.
    pub fn earthquake_safety(&self, breakdown: &SeismicRiskBreakdown, provenance: Provenance) -> ModuleScore {
        ModuleScore::new(
            Module::EarthquakeSafety,
            score_earthquake_safety(breakdown),
            breakdown.total_score,
            provenance,
        )
    }

    /// Combine module scores into the normalized USS.
    pub fn composite(&self, component_scores: Vec<ModuleScore>) -> CompositeScore {
        let k = component_scores.len();
        let total = if k == 0 {
            0.0
        } else {
            let sum: f64 = component_scores.iter().map(|s| s.score).sum();
            (sum / (MODULE_MAX * k as f64) * 100.0).clamp(0.0, 100.0)
        };
        CompositeScore {
            total,
            classification: classify(total),
            component_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeSeries;
    use crate::scoring::seismic::{SeismicRiskScorer, SeismicZone};
    use crate::trend::TrendFitter;
    use approx::assert_relative_eq;

    fn trend(values: &[f64]) -> FittedTrend {
        let data: BTreeMap<i32, f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (2018 + i as i32, *v))
            .collect();
        TrendFitter::new()
            .fit(&TimeSeries::from_yearly(&data).unwrap())
            .unwrap()
    }

    #[test]
    fn classification_boundaries_are_exact() {
        assert_eq!(classify(80.0), Classification::Excellent);
        assert_eq!(classify(79.999), Classification::Good);
        assert_eq!(classify(60.0), Classification::Good);
        assert_eq!(classify(40.0), Classification::Moderate);
        assert_eq!(classify(20.0), Classification::Poor);
        assert_eq!(classify(19.999), Classification::Critical);
    }

    #[test]
    fn grades_use_share_of_max() {
        assert_eq!(grade(20.0, 25.0), Grade::A);
        assert_eq!(grade(19.9, 25.0), Grade::B);
        assert_eq!(grade(10.0, 25.0), Grade::C);
        assert_eq!(grade(5.0, 25.0), Grade::D);
        assert_eq!(grade(4.9, 25.0), Grade::F);
        assert_eq!(grade(1.0, 0.0), Grade::F);
    }

    #[test]
    fn urban_heat_reference_points() {
        assert_eq!(score_urban_heat(22.0), 25.0);
        assert_eq!(score_urban_heat(50.0), 0.0);
        assert_relative_eq!(score_urban_heat(36.0), 12.5, epsilon = 1e-12);
        assert_eq!(score_urban_heat(10.0), 25.0);
        assert_eq!(score_urban_heat(60.0), 0.0);
    }

    #[test]
    fn vegetation_rewards_greenery_and_low_hardscape() {
        assert_relative_eq!(score_vegetation(0.8, 0.0), 25.0);
        assert_relative_eq!(score_vegetation(0.4, 0.5), 12.5);
        assert_relative_eq!(score_vegetation(999.0, -5.0), 25.0);
        assert_eq!(score_vegetation(-1.0, 1.0), 0.0);
    }

    #[test]
    fn air_quality_uses_aqi() {
        assert_relative_eq!(score_air_quality(0.0), 25.0);
        // PM2.5 35.4 -> AQI 100 -> 20
        assert_relative_eq!(score_air_quality(35.4), 20.0, epsilon = 1e-9);
        assert_eq!(score_air_quality(10_000.0), 0.0);
    }

    #[test]
    fn fallbacks_are_marked_assumed() {
        let scorer = CompositeScorer::default();

        let aq = scorer.air_quality(&Observation::NoData);
        assert_eq!(aq.raw_value, 100.0);
        assert_relative_eq!(aq.score, 20.0);
        assert_eq!(aq.provenance, Provenance::Assumed);

        let heat = scorer.urban_heat(&Observation::Error("timeout".into()));
        assert_eq!(heat.raw_value, 30.0);
        assert_eq!(heat.provenance, Provenance::Assumed);

        let risk = scorer.future_risk(None);
        assert_eq!(risk.raw_value, 0.5);
        assert_relative_eq!(risk.score, 12.5);

        let veg = scorer.vegetation(&Observation::Value(0.4), &Observation::NoData);
        assert_relative_eq!(veg.score, 12.5);
        assert_eq!(veg.provenance, Provenance::Assumed);
    }

    #[test]
    fn measured_zero_is_not_a_fallback() {
        let scorer = CompositeScorer::default();
        let aq = scorer.air_quality(&Observation::Value(0.0));
        assert_eq!(aq.raw_value, 0.0);
        assert_eq!(aq.score, 25.0);
        assert_eq!(aq.provenance, Provenance::Measured);
    }

    #[test]
    fn future_risk_penalties() {
        let scorer = CompositeScorer::default();
        let mut trends = BTreeMap::new();
        trends.insert("Built Area".to_string(), trend(&[20.0, 22.0, 25.0]));
        trends.insert("Trees".to_string(), trend(&[30.0, 28.0, 25.0]));
        trends.insert("Grass".to_string(), trend(&[5.0, 4.0, 3.5]));

        // 0.2 + 0.2 + 0.2 + 0.1
        assert_relative_eq!(scorer.risk_policy().risk(&trends), 0.7, epsilon = 1e-12);
        assert_relative_eq!(scorer.score_future_risk(&trends), 7.5, epsilon = 1e-9);

        trends.insert("Trees".to_string(), trend(&[25.0, 28.0, 30.0]));
        assert_relative_eq!(scorer.risk_policy().risk(&trends), 0.5, epsilon = 1e-12);

        let module = scorer.future_risk(Some(&trends));
        assert_eq!(module.provenance, Provenance::Measured);
        assert_relative_eq!(module.score, 12.5, epsilon = 1e-9);
    }

    #[test]
    fn composite_normalizes_over_selected_modules() {
        let scorer = CompositeScorer::default();
        let scores = vec![
            ModuleScore::new(Module::Vegetation, 20.0, 0.6, Provenance::Measured),
            ModuleScore::new(Module::UrbanHeat, 10.0, 36.0, Provenance::Measured),
        ];
        let composite = scorer.composite(scores);
        assert_relative_eq!(composite.total, 60.0, epsilon = 1e-9);
        assert_eq!(composite.classification, Classification::Good);
        assert_eq!(composite.weakest().unwrap().module, Module::UrbanHeat);
        assert!(composite.get(Module::AirQuality).is_none());
    }

    #[test]
    fn empty_composite_is_critical() {
        let composite = CompositeScorer::default().composite(vec![]);
        assert_eq!(composite.total, 0.0);
        assert_eq!(composite.classification, Classification::Critical);
        assert!(composite.weakest().is_none());
    }

    #[test]
    fn earthquake_safety_inverts_risk() {
        let scorer = CompositeScorer::default();
        let breakdown = SeismicRiskScorer::default().score(0.5, Some(SeismicZone::V), 60, Some(5.0), 0.6);
        let module = scorer.earthquake_safety(&breakdown, Provenance::Measured);
        assert_eq!(module.score, 0.0);
        assert_eq!(module.grade, Grade::F);
        assert_eq!(module.metric_name, "Comp. Risk");
    }

    #[test]
    fn module_names_round_trip() {
        for module in Module::ALL {
            assert_eq!(module.as_str().parse::<Module>().unwrap(), module);
        }
        assert!("Noise".parse::<Module>().is_err());
    }
}
