//! Typed report records handed to export sinks.
//!
//! Every record derives `Serialize`; [`Report::to_value`] flattens one into
//! a plain nested JSON value, which is the contract PDF and CSV writers
//! consume.

use crate::core::{DailyForecast, Forecast};
use crate::error::Result;
use crate::forecast::ForecastGenerator;
use crate::insights::{aqi_insights, lulc_insights, predictive_insights, uhi_insights, Insight};
use crate::pipeline::{ComparisonResult, KeyMetrics};
use crate::providers::Observation;
use crate::scoring::{
    cpcb_aqi, Classification, CompositeScorer, CpcbAqi, Module, ModuleScore, SeismicZone,
};
use crate::trend::{FittedTrend, TrendAnalyzer, TrendSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Qualitative band of a key metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBand {
    Good,
    Moderate,
    Poor,
    Critical,
}

/// Headline metric of the key-metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMetric {
    Ndvi,
    Impervious,
    Aqi,
    Pm25,
    Lst,
    Risk,
}

impl KeyMetric {
    pub const ALL: [KeyMetric; 6] = [
        KeyMetric::Ndvi,
        KeyMetric::Impervious,
        KeyMetric::Aqi,
        KeyMetric::Pm25,
        KeyMetric::Lst,
        KeyMetric::Risk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMetric::Ndvi => "ndvi",
            KeyMetric::Impervious => "impervious",
            KeyMetric::Aqi => "aqi",
            KeyMetric::Pm25 => "pm25",
            KeyMetric::Lst => "lst",
            KeyMetric::Risk => "risk",
        }
    }

    /// Band of `value`. NDVI is higher-is-better; every other metric is
    /// lower-is-better with inclusive upper limits.
    pub fn band(&self, value: f64) -> StatusBand {
        if let KeyMetric::Ndvi = self {
            return if value >= 0.5 {
                StatusBand::Good
            } else if value >= 0.3 {
                StatusBand::Moderate
            } else if value >= 0.2 {
                StatusBand::Poor
            } else {
                StatusBand::Critical
            };
        }
        let (good, moderate, poor) = match self {
            KeyMetric::Impervious => (0.3, 0.5, 0.7),
            KeyMetric::Aqi => (50.0, 100.0, 150.0),
            KeyMetric::Pm25 => (15.0, 35.0, 55.0),
            KeyMetric::Lst => (30.0, 35.0, 40.0),
            KeyMetric::Risk | KeyMetric::Ndvi => (0.3, 0.5, 0.7),
        };
        if value <= good {
            StatusBand::Good
        } else if value <= moderate {
            StatusBand::Moderate
        } else if value <= poor {
            StatusBand::Poor
        } else {
            StatusBand::Critical
        }
    }

    /// Short status label shown next to the value.
    pub fn label(&self, value: f64) -> &'static str {
        match self {
            KeyMetric::Ndvi if value > 0.4 => "Good",
            KeyMetric::Ndvi => "Needs Improvement",
            KeyMetric::Impervious if value < 0.3 => "Sustainable",
            KeyMetric::Impervious => "High Urbanization",
            KeyMetric::Aqi if value < 100.0 => "Satisfactory",
            KeyMetric::Aqi if value < 150.0 => "Unhealthy",
            KeyMetric::Aqi => "Poor",
            KeyMetric::Pm25 if value < 15.0 => "Meets WHO",
            KeyMetric::Pm25 => "Exceeds WHO",
            KeyMetric::Lst if value < 32.0 => "Comfortable",
            KeyMetric::Lst if value < 38.0 => "Warm",
            KeyMetric::Lst => "Hot",
            KeyMetric::Risk if value < 0.3 => "Low Risk",
            KeyMetric::Risk if value < 0.6 => "Moderate",
            KeyMetric::Risk => "High Risk",
        }
    }

    fn value_in(&self, metrics: &KeyMetrics) -> Option<f64> {
        match self {
            KeyMetric::Ndvi => metrics.ndvi,
            KeyMetric::Impervious => metrics.impervious,
            KeyMetric::Aqi => metrics.aqi,
            KeyMetric::Pm25 => metrics.pm25,
            KeyMetric::Lst => metrics.lst,
            KeyMetric::Risk => metrics.risk,
        }
    }
}

impl fmt::Display for KeyMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the key-metrics table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStatus {
    pub metric: KeyMetric,
    pub value: f64,
    pub band: StatusBand,
    pub label: String,
}

/// Status rows for every metric present in `metrics`.
pub fn metric_statuses(metrics: &KeyMetrics) -> Vec<MetricStatus> {
    KeyMetric::ALL
        .iter()
        .filter_map(|metric| {
            metric.value_in(metrics).map(|value| MetricStatus {
                metric: *metric,
                value,
                band: metric.band(value),
                label: metric.label(value).to_string(),
            })
        })
        .collect()
}

/// Land-cover change analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LulcReport {
    pub region_name: String,
    /// Year -> class -> share of the region in percent.
    pub composition: BTreeMap<i32, BTreeMap<String, f64>>,
    pub trends: BTreeMap<String, FittedTrend>,
    pub summary: TrendSummary,
    pub forecasts: BTreeMap<String, Vec<Forecast>>,
    pub insight: Option<Insight>,
}

impl LulcReport {
    /// Fit class trends, forecast `target_years` and attach an insight for
    /// the latest composition.
    pub fn build(
        region_name: impl Into<String>,
        composition: BTreeMap<i32, BTreeMap<String, f64>>,
        ndvi_mean: Option<f64>,
        analyzer: &TrendAnalyzer,
        generator: &ForecastGenerator,
        target_years: &[i32],
    ) -> Self {
        let trends = analyzer.analyze_lulc(&composition);
        let summary = analyzer.summarize(&trends, "LULC");
        let forecasts = generator.forecast_lulc(&trends, target_years);
        let insight = composition
            .values()
            .next_back()
            .and_then(|latest| lulc_insights(latest, ndvi_mean.unwrap_or(0.0)));
        Self {
            region_name: region_name.into(),
            composition,
            trends,
            summary,
            forecasts,
            insight,
        }
    }
}

/// Air-quality snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AqiReport {
    pub region_name: String,
    pub year: i32,
    pub pm25: Observation,
    pub pm10: Observation,
    /// Indian national AQI, when any pollutant was measured.
    pub cpcb: Option<CpcbAqi>,
    pub score: ModuleScore,
    pub insight: Insight,
}

impl AqiReport {
    pub fn build(
        region_name: impl Into<String>,
        year: i32,
        pm25: Observation,
        pm10: Observation,
        no2: Option<f64>,
        scorer: &CompositeScorer,
    ) -> Self {
        let cpcb = cpcb_aqi(pm25.value(), pm10.value());
        let score = scorer.air_quality(&pm25);
        let insight = aqi_insights(pm25.value().unwrap_or(scorer.defaults().pm25), no2);
        Self {
            region_name: region_name.into(),
            year,
            pm25,
            pm10,
            cpcb,
            score,
            insight,
        }
    }
}

/// Urban heat snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatReport {
    pub region_name: String,
    pub year: i32,
    pub mean_celsius: f64,
    pub max_celsius: f64,
    /// Urban core minus rural surroundings, when a rural reference exists.
    pub uhi_intensity: Option<f64>,
    pub score: ModuleScore,
    pub insight: Insight,
}

impl HeatReport {
    pub fn build(
        region_name: impl Into<String>,
        year: i32,
        mean_celsius: f64,
        max_celsius: f64,
        rural_mean_celsius: Option<f64>,
        scorer: &CompositeScorer,
    ) -> Self {
        Self {
            region_name: region_name.into(),
            year,
            mean_celsius,
            max_celsius,
            uhi_intensity: rural_mean_celsius.map(|rural| mean_celsius - rural),
            score: scorer.urban_heat(&Observation::Value(mean_celsius)),
            insight: uhi_insights(mean_celsius, max_celsius),
        }
    }
}

/// Forecasts of one metric, statistical or dense.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictiveReport {
    pub region_name: String,
    pub metric: String,
    pub trend: Option<FittedTrend>,
    pub forecasts: Vec<Forecast>,
    pub daily: Vec<DailyForecast>,
    pub insight: Option<Insight>,
}

impl PredictiveReport {
    /// Attach an outlook from forecast AQI and LST paths.
    pub fn with_outlook(mut self, aqi_path: &[f64], lst_path: &[f64]) -> Self {
        self.insight = predictive_insights(aqi_path, lst_path);
        self
    }

    /// Predicted values in time order, from whichever path was filled.
    pub fn predicted_path(&self) -> Vec<f64> {
        if self.daily.is_empty() {
            self.forecasts.iter().map(|f| f.predicted).collect()
        } else {
            self.daily.iter().map(|f| f.predicted).collect()
        }
    }
}

/// Named mitigation strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mitigation {
    pub title: String,
    pub description: String,
}

/// One roadmap row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadmapStep {
    pub timeline: String,
    pub action: String,
    pub expected_outcome: String,
}

/// Full sustainability report of one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainabilityReport {
    pub region_name: String,
    pub year: i32,
    pub total: f64,
    pub classification: Classification,
    pub classification_description: String,
    pub component_scores: Vec<ModuleScore>,
    pub weakest_sector: Module,
    pub overview: String,
    pub analysis: String,
    pub mitigations: Vec<Mitigation>,
    pub estimated_gain: f64,
    pub projected_total: f64,
    pub projected_classification: Classification,
    pub roadmap: Vec<RoadmapStep>,
    pub raw_metrics: KeyMetrics,
    pub metric_status: Vec<MetricStatus>,
    pub seismic_zone: Option<SeismicZone>,
}

/// Any exportable report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Lulc(LulcReport),
    Aqi(AqiReport),
    Heat(HeatReport),
    Predictive(PredictiveReport),
    Sustainability(SustainabilityReport),
    Comparison(ComparisonResult),
}

impl Report {
    pub fn kind(&self) -> &'static str {
        match self {
            Report::Lulc(_) => "lulc",
            Report::Aqi(_) => "aqi",
            Report::Heat(_) => "heat",
            Report::Predictive(_) => "predictive",
            Report::Sustainability(_) => "sustainability",
            Report::Comparison(_) => "comparison",
        }
    }

    /// Plain nested JSON value of the record.
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Receives finished reports for export.
pub trait ReportSink {
    fn accept(&mut self, report: &Report) -> Result<()>;
}

/// Keeps reports as JSON values in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub reports: Vec<serde_json::Value>,
}

impl ReportSink for MemorySink {
    fn accept(&mut self, report: &Report) -> Result<()> {
        self.reports.push(report.to_value()?);
        Ok(())
    }
}

/// Writes one JSON document per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for JsonLinesSink<W> {
    fn accept(&mut self, report: &Report) -> Result<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
