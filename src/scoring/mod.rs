//! Current-state scoring: sustainability modules, the composite USS,
//! air-quality indices and seismic risk.

pub mod aqi;
pub mod composite;
pub mod seismic;

pub use aqi::{cpcb_aqi, pm25_to_aqi, AqiCategory, CpcbAqi, Pollutant};
pub use composite::{
    classify, grade, score_air_quality, score_earthquake_safety, score_urban_heat, score_vegetation,
    Classification, CompositeScore, CompositeScorer, FutureRiskPolicy, Grade, Module, ModuleScore,
    Provenance, ScoringDefaults,
};
pub use seismic::{
    lookup_zone, summarize_events, CatalogSummary, Component, ComponentScore, RiskClass,
    SeismicInputs, SeismicRiskBreakdown, SeismicRiskScorer, SeismicWeights, SeismicZone,
};
