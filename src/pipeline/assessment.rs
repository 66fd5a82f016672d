//! Single-region sustainability assessment.
//!
//! Pulls aggregates for the selected modules through a
//! [`RequestContext`], scores each module and combines them into the USS.
//! Missing data never aborts an assessment; affected modules fall back to
//! defaults and are marked assumed.

use crate::error::Result;
use crate::pipeline::context::RequestContext;
use crate::providers::{
    metric, ClassAreaProvider, DateRange, ImageryProvider, Observation, Region,
    SeismicCatalogProvider,
};
use crate::scoring::{
    lookup_zone, summarize_events, CatalogSummary, CompositeScore, CompositeScorer, Module,
    ModuleScore, Provenance, SeismicRiskBreakdown, SeismicRiskScorer, SeismicZone,
};
use crate::trend::{FittedTrend, TrendAnalyzer};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Land-cover class counted as impervious surface.
pub const BUILT_AREA_CLASS: &str = "Built Area";

/// External collaborators used by an assessment.
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    pub imagery: &'a dyn ImageryProvider,
    pub class_areas: &'a dyn ClassAreaProvider,
    pub seismic: &'a dyn SeismicCatalogProvider,
}

/// Windows used to gather history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Years of land-cover history before the assessment year used for
    /// the future-risk trends.
    pub trend_lookback_years: i32,
    /// Years of earthquake catalog counted, ending with the assessment
    /// year.
    pub catalog_years: i32,
    pub min_magnitude: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trend_lookback_years: 5,
            catalog_years: 10,
            min_magnitude: 2.5,
        }
    }
}

impl PipelineConfig {
    pub fn with_trend_lookback(mut self, years: i32) -> Self {
        self.trend_lookback_years = years.max(2);
        self
    }

    pub fn with_catalog_years(mut self, years: i32) -> Self {
        self.catalog_years = years.max(1);
        self
    }

    pub fn with_min_magnitude(mut self, magnitude: f64) -> Self {
        self.min_magnitude = magnitude;
        self
    }
}

/// Headline metrics of an assessment. `None` when the module producing
/// the metric was not selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub ndvi: Option<f64>,
    pub impervious: Option<f64>,
    pub aqi: Option<f64>,
    pub pm25: Option<f64>,
    pub lst: Option<f64>,
    pub risk: Option<f64>,
}

/// Seismic part of an assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeismicAssessment {
    pub zone: SeismicZone,
    pub breakdown: SeismicRiskBreakdown,
    /// `None` when the catalog could not be reached.
    pub catalog: Option<CatalogSummary>,
}

/// Result of assessing one region for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAssessment {
    pub region_name: String,
    pub year: i32,
    pub composite: CompositeScore,
    pub metrics: KeyMetrics,
    pub lulc_trends: BTreeMap<String, FittedTrend>,
    pub seismic: Option<SeismicAssessment>,
}

impl RegionAssessment {
    pub fn total(&self) -> f64 {
        self.composite.total
    }

    pub fn module(&self, module: Module) -> Option<&ModuleScore> {
        self.composite.get(module)
    }
}

/// Scores regions from provider data.
#[derive(Debug, Clone, Default)]
pub struct AssessmentPipeline {
    config: PipelineConfig,
    scorer: CompositeScorer,
    seismic: SeismicRiskScorer,
    analyzer: TrendAnalyzer,
}

impl AssessmentPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_scorer(mut self, scorer: CompositeScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_seismic_scorer(mut self, seismic: SeismicRiskScorer) -> Self {
        self.seismic = seismic;
        self
    }

    pub fn with_analyzer(mut self, analyzer: TrendAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    /// Assess `region` for `year` over the selected modules, in the order
    /// given. Duplicate modules are scored once.
    pub fn assess(
        &self,
        ctx: &mut RequestContext,
        providers: &Providers<'_>,
        region: &Region,
        modules: &[Module],
        year: i32,
    ) -> Result<RegionAssessment> {
        let range = DateRange::year(year)?;
        let mut metrics = KeyMetrics::default();
        let mut scores: Vec<ModuleScore> = Vec::with_capacity(modules.len());
        let mut lulc_trends = BTreeMap::new();
        let mut seismic = None;

        for &module in modules {
            if scores.iter().any(|s| s.module == module) {
                continue;
            }
            let score = match module {
                Module::Vegetation => {
                    let ndvi = ctx.aggregate(providers.imagery, region, metric::NDVI, &range);
                    let impervious = self.impervious(ctx, providers, region, year);
                    let score = self.scorer.vegetation(&ndvi, &impervious);
                    metrics.ndvi = Some(score.raw_value);
                    metrics.impervious = Some(
                        impervious
                            .value()
                            .unwrap_or(self.scorer.defaults().impervious_ratio),
                    );
                    score
                }
                Module::AirQuality => {
                    let pm25 = ctx.aggregate(providers.imagery, region, metric::PM25, &range);
                    let score = self.scorer.air_quality(&pm25);
                    metrics.aqi = Some(score.raw_value);
                    metrics.pm25 = Some(pm25.value().unwrap_or(self.scorer.defaults().pm25));
                    score
                }
                Module::UrbanHeat => {
                    let lst = ctx.aggregate(providers.imagery, region, metric::LST, &range);
                    let score = self.scorer.urban_heat(&lst);
                    metrics.lst = Some(score.raw_value);
                    score
                }
                Module::FutureRisk => {
                    lulc_trends = self.lulc_trends(ctx, providers, region, year);
                    let score = self.scorer.future_risk(Some(&lulc_trends));
                    metrics.risk = Some(score.raw_value);
                    score
                }
                Module::EarthquakeSafety => {
                    let (assessment, provenance) =
                        self.seismic_assessment(ctx, providers, region, &range, year)?;
                    let score = self.scorer.earthquake_safety(&assessment.breakdown, provenance);
                    seismic = Some(assessment);
                    score
                }
            };
            debug!(
                region = %region.name,
                module = %module,
                score = score.score,
                provenance = ?score.provenance,
                "module scored"
            );
            scores.push(score);
        }

        let composite = self.scorer.composite(scores);
        debug!(
            region = %region.name,
            year,
            total = composite.total,
            classification = %composite.classification,
            "assessment complete"
        );

        Ok(RegionAssessment {
            region_name: region.name.clone(),
            year,
            composite,
            metrics,
            lulc_trends,
            seismic,
        })
    }

    /// Built-area share of the region in [0, 1].
    fn impervious(
        &self,
        ctx: &mut RequestContext,
        providers: &Providers<'_>,
        region: &Region,
        year: i32,
    ) -> Observation {
        ctx.class_areas(providers.class_areas, region, year)
            .map(|areas| areas.get(BUILT_AREA_CLASS).copied().unwrap_or(0.0) / 100.0)
            .into()
    }

    fn lulc_trends(
        &self,
        ctx: &mut RequestContext,
        providers: &Providers<'_>,
        region: &Region,
        year: i32,
    ) -> BTreeMap<String, FittedTrend> {
        let first = year - self.config.trend_lookback_years;
        let by_year: BTreeMap<i32, BTreeMap<String, f64>> = (first..year)
            .filter_map(|y| {
                ctx.class_areas(providers.class_areas, region, y)
                    .map(|areas| (y, areas))
            })
            .collect();
        self.analyzer.analyze_lulc(&by_year)
    }

    fn seismic_assessment(
        &self,
        ctx: &mut RequestContext,
        providers: &Providers<'_>,
        region: &Region,
        range: &DateRange,
        year: i32,
    ) -> Result<(SeismicAssessment, Provenance)> {
        let zone = lookup_zone(&region.name);
        let pga = ctx.aggregate(providers.imagery, region, metric::PGA, range);
        let catalog_range = DateRange::new(
            first_day(year - self.config.catalog_years + 1)?,
            range.end,
        )?;
        let events = ctx.events(
            providers.seismic,
            region,
            &region.bbox,
            self.config.min_magnitude,
            &catalog_range,
        );
        let exposure = self
            .impervious(ctx, providers, region, year)
            .value()
            .unwrap_or(self.scorer.defaults().impervious_ratio);

        let provenance = if pga.is_value() && events.is_some() {
            Provenance::Measured
        } else {
            Provenance::Assumed
        };
        let catalog = events.as_deref().map(summarize_events);
        let count = catalog.as_ref().map_or(0, |c| c.count);
        let breakdown = self.seismic.score(
            pga.value().unwrap_or_else(|| zone.z_factor()),
            Some(zone),
            count,
            None,
            exposure,
        );

        Ok((
            SeismicAssessment {
                zone,
                breakdown,
                catalog,
            },
            provenance,
        ))
    }
}

fn first_day(year: i32) -> Result<NaiveDate> {
    Ok(DateRange::year(year)?.start)
}
