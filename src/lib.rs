//! # urbansense
//!
//! Trend fitting, forecasting and sustainability scoring for
//! satellite-derived urban metrics.
//!
//! Provides OLS and polynomial trend fitting for sparse yearly series,
//! gradient-boosted trees for dense daily series, interval forecasts, the
//! 0-100 Urban Sustainability Score, a multi-factor seismic risk index,
//! two-region comparison and threshold monitoring. Imagery, land-cover and
//! earthquake data arrive through the traits in [`providers`].

#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod monitoring;
pub mod pipeline;
pub mod providers;
pub mod report;
pub mod scoring;
pub mod trend;
pub mod utils;

pub use error::{Result, UrbanError};

pub mod prelude {
    pub use crate::config::AnalysisConfig;
    pub use crate::core::{Forecast, MetricDomain, TimeSeries};
    pub use crate::error::{Result, UrbanError};
    pub use crate::forecast::{DenseForecaster, ForecastGenerator, LagPolicy};
    pub use crate::pipeline::{
        AssessmentPipeline, ComparisonDriver, Providers, RequestContext, SustainabilityPipeline,
    };
    pub use crate::providers::{
        BoundingBox, ClassAreaProvider, DateRange, ImageryProvider, Observation, Region,
        SeismicCatalogProvider,
    };
    pub use crate::report::{Report, ReportSink};
    pub use crate::scoring::{CompositeScorer, Module, SeismicRiskScorer};
    pub use crate::trend::{FittedTrend, TrendAnalyzer, TrendFitter};
}
