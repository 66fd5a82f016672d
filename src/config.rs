//! Aggregated analysis configuration.
//!
//! Every section is optional in TOML; missing keys take their defaults.
//!
//! ```toml
//! [fitter]
//! dense_threshold = 30
//!
//! [seismic_weights]
//! pga = 0.5
//! zone = 0.2
//! history = 0.1
//! fault = 0.1
//! exposure = 0.1
//!
//! [comparison]
//! lst_abs = 2.5
//! ```

use crate::error::{Result, UrbanError};
use crate::forecast::{DenseForecaster, ForecastConfig, ForecastGenerator, LagPolicy};
use crate::monitoring::MonitorConfig;
use crate::pipeline::{
    AssessmentPipeline, ComparisonDriver, ComparisonThresholds, PipelineConfig,
    SustainabilityPipeline,
};
use crate::scoring::{
    CompositeScorer, FutureRiskPolicy, ScoringDefaults, SeismicRiskScorer, SeismicWeights,
};
use crate::trend::{
    BoostingConfig, PolynomialConfig, PolynomialFitter, TrendAnalyzer, TrendFitter,
    TrendFitterConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub fitter: TrendFitterConfig,
    pub boosting: BoostingConfig,
    pub polynomial: PolynomialConfig,
    pub forecast: ForecastConfig,
    pub lag_policy: LagPolicy,
    pub risk_policy: FutureRiskPolicy,
    pub defaults: ScoringDefaults,
    pub seismic_weights: SeismicWeights,
    pub comparison: ComparisonThresholds,
    pub pipeline: PipelineConfig,
    pub monitor: MonitorConfig,
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| UrbanError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Reject values no component could work with.
    pub fn validate(&self) -> Result<()> {
        let level = self.forecast.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(UrbanError::Config(format!(
                "forecast.confidence_level must be in (0, 1), got {}",
                level
            )));
        }
        let alpha = self.fitter.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(UrbanError::Config(format!(
                "fitter.significance_level must be in (0, 1), got {}",
                alpha
            )));
        }
        let holdout = self.fitter.holdout_fraction;
        if !(holdout > 0.0 && holdout < 1.0) {
            return Err(UrbanError::Config(format!(
                "fitter.holdout_fraction must be in (0, 1), got {}",
                holdout
            )));
        }
        SeismicRiskScorer::new(self.seismic_weights.clone())
            .map_err(|e| UrbanError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn trend_fitter(&self) -> TrendFitter {
        TrendFitter::new()
            .with_config(self.fitter.clone())
            .with_boosting(self.boosting.clone())
    }

    pub fn polynomial_fitter(&self) -> PolynomialFitter {
        PolynomialFitter::new().with_config(self.polynomial.clone())
    }

    pub fn analyzer(&self) -> TrendAnalyzer {
        TrendAnalyzer::new(self.trend_fitter())
    }

    pub fn forecast_generator(&self) -> ForecastGenerator {
        ForecastGenerator::new(self.forecast.clone())
    }

    pub fn dense_forecaster(&self) -> DenseForecaster {
        DenseForecaster::new(self.lag_policy)
    }

    pub fn composite_scorer(&self) -> CompositeScorer {
        CompositeScorer::new(self.risk_policy.clone(), self.defaults.clone())
    }

    pub fn assessment_pipeline(&self) -> Result<AssessmentPipeline> {
        Ok(AssessmentPipeline::new(self.pipeline.clone())
            .with_scorer(self.composite_scorer())
            .with_seismic_scorer(SeismicRiskScorer::new(self.seismic_weights.clone())?)
            .with_analyzer(self.analyzer()))
    }

    pub fn comparison_driver(&self) -> Result<ComparisonDriver> {
        Ok(ComparisonDriver::new(
            self.assessment_pipeline()?,
            self.comparison.clone(),
        ))
    }

    pub fn sustainability_pipeline(&self) -> Result<SustainabilityPipeline> {
        Ok(SustainabilityPipeline::new(self.assessment_pipeline()?))
    }
}
