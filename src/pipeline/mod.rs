//! Request-level orchestration: single-region assessment, sustainability
//! reports and two-region comparison.

pub mod assessment;
pub mod comparison;
pub mod context;
pub mod sustainability;

pub use assessment::{
    AssessmentPipeline, KeyMetrics, PipelineConfig, Providers, RegionAssessment, SeismicAssessment,
    BUILT_AREA_CLASS,
};
pub use comparison::{summarize_comparison, ComparisonDriver, ComparisonResult, ComparisonThresholds};
pub use context::RequestContext;
pub use sustainability::{build_report, sector_playbook, SustainabilityPipeline};
