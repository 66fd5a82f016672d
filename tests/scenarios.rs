//! End-to-end scenarios over mock providers.

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use urbansense::config::AnalysisConfig;
use urbansense::core::{MetricDomain, TimeSeries};
use urbansense::forecast::{ForecastConfig, ForecastGenerator};
use urbansense::monitoring::{Monitor, MonitorConfig, Operator, PersistenceStore, SqliteStore, Threshold};
use urbansense::pipeline::{
    AssessmentPipeline, ComparisonDriver, ComparisonThresholds, Providers, RequestContext,
    SustainabilityPipeline,
};
use urbansense::providers::{
    metric, BoundingBox, ClassAreaProvider, DateRange, ImageryProvider, Observation, Region,
    SeismicCatalogProvider, SeismicEvent,
};
use urbansense::report::{MemorySink, Report, ReportSink};
use urbansense::scoring::{
    score_urban_heat, Module, Provenance, RiskClass, SeismicRiskScorer, SeismicZone,
};
use urbansense::trend::{TrendAnalyzer, TrendDirection, TrendFitter};
use urbansense::{Result, UrbanError};

/// Imagery keyed by region name.
struct CityImagery {
    values: BTreeMap<(String, String), f64>,
}

impl CityImagery {
    fn new(entries: &[(&str, &str, f64)]) -> Self {
        Self {
            values: entries
                .iter()
                .map(|(r, m, v)| ((r.to_string(), m.to_string()), *v))
                .collect(),
        }
    }
}

impl ImageryProvider for CityImagery {
    fn get_aggregate(&self, region: &Region, metric: &str, _: &DateRange) -> Observation {
        self.values
            .get(&(region.name.clone(), metric.to_string()))
            .copied()
            .into()
    }
}

struct CityLandCover;

impl ClassAreaProvider for CityLandCover {
    fn get_class_areas(&self, region: &Region, year: i32) -> Option<BTreeMap<String, f64>> {
        let t = (year - 2018) as f64;
        let (built, trees) = match region.name.as_str() {
            "Delhi" => (45.0 + 1.5 * t, 12.0 - 0.5 * t),
            "Bangalore" => (30.0 + 0.2 * t, 28.0 + 0.3 * t),
            _ => return None,
        };
        let mut areas = BTreeMap::new();
        areas.insert("Built Area".to_string(), built);
        areas.insert("Trees".to_string(), trees);
        areas.insert("Grass".to_string(), 8.0);
        Some(areas)
    }
}

struct Catalog;

impl SeismicCatalogProvider for Catalog {
    fn fetch_events(&self, bbox: &BoundingBox, min_magnitude: f64, _: &DateRange) -> Result<Vec<SeismicEvent>> {
        let (lat, lon) = bbox.center();
        let time = NaiveDate::from_ymd_opt(2020, 6, 1)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap();
        if lat > 25.0 {
            Ok((0..12)
                .map(|i| SeismicEvent {
                    magnitude: min_magnitude + 0.1 * i as f64,
                    depth_km: 10.0,
                    lat,
                    lon,
                    time,
                    place: format!("event {}", i),
                })
                .collect())
        } else {
            Err(UrbanError::UpstreamUnavailable("catalog timeout".into()))
        }
    }
}

fn delhi() -> Region {
    Region::new("Delhi", BoundingBox::new(28.4, 76.8, 28.9, 77.4).unwrap())
}

fn bangalore() -> Region {
    Region::new("Bangalore", BoundingBox::new(12.8, 77.4, 13.1, 77.8).unwrap())
}

fn imagery() -> CityImagery {
    CityImagery::new(&[
        ("Delhi", metric::NDVI, 0.22),
        ("Delhi", metric::PM25, 110.0),
        ("Delhi", metric::LST, 41.0),
        ("Delhi", metric::PGA, 0.25),
        ("Bangalore", metric::NDVI, 0.41),
        ("Bangalore", metric::PM25, 30.0),
        ("Bangalore", metric::LST, 33.5),
    ])
}

#[test]
fn built_area_reference_scenario() {
    let data: BTreeMap<i32, f64> = [(2018, 20.0), (2019, 22.0), (2020, 25.0), (2021, 29.0), (2022, 34.0)]
        .into_iter()
        .collect();
    let trend = TrendFitter::new()
        .fit(&TimeSeries::from_yearly(&data).unwrap())
        .unwrap();

    assert_relative_eq!(trend.slope, 3.5, epsilon = 1e-9);
    assert_eq!(trend.trend_direction, TrendDirection::Increasing);
    assert!(trend.significant);

    let forecasts = ForecastGenerator::new(ForecastConfig::default())
        .forecast(&trend, &[2025], MetricDomain::Percentage)
        .unwrap();
    let f = &forecasts[0];
    assert!((f.predicted - 44.5).abs() < 1.5);
    assert!(f.lower_bound < f.predicted && f.predicted < f.upper_bound);
    assert_eq!(f.confidence_level, "95%");
}

#[test]
fn urban_heat_reference_points() {
    assert_eq!(score_urban_heat(22.0), 25.0);
    assert_eq!(score_urban_heat(50.0), 0.0);
    assert_relative_eq!(score_urban_heat(36.0), 12.5, epsilon = 1e-12);
}

#[test]
fn seismic_reference_scenario() {
    let breakdown = SeismicRiskScorer::default().score(0.5, Some(SeismicZone::V), 60, Some(5.0), 0.6);
    assert_relative_eq!(breakdown.total_score, 100.0, epsilon = 1e-9);
    assert_eq!(breakdown.risk_class, RiskClass::VeryHigh);
    assert_relative_eq!(breakdown.weight_sum(), 1.0, epsilon = 1e-9);
}

#[test]
fn comparison_between_two_cities() {
    let imagery = imagery();
    let providers = Providers {
        imagery: &imagery,
        class_areas: &CityLandCover,
        seismic: &Catalog,
    };
    let driver = ComparisonDriver::new(AssessmentPipeline::default(), ComparisonThresholds::default());
    let mut ctx = RequestContext::new();

    let result = driver
        .compare(&mut ctx, &providers, &delhi(), &bangalore(), &Module::ALL, 2023)
        .unwrap();

    assert!(result.uss_diff < -2.0);
    assert_relative_eq!(
        result.uss_diff,
        result.region_a.total() - result.region_b.total(),
        epsilon = 1e-12
    );
    let summary = result.summary();
    assert!(summary.starts_with("**Bangalore** outperforms overall"));
    assert!(summary.contains("**Bangalore** has significantly **greener cover** (NDVI 0.41 vs 0.22)."));
    assert!(summary.contains("**Bangalore** enjoys specifically **cleaner air**"));
    assert!(summary.contains("**Bangalore** is noticeably **cooler** (33.5°C vs 41.0°C)."));
    assert!(summary.contains("**Delhi** is in **Zone IV** while **Bangalore** is in **Zone II**"));

    // Bangalore has no PGA and no catalog: assumed, but still scored
    let eq = result.region_b.module(Module::EarthquakeSafety).unwrap();
    assert_eq!(eq.provenance, Provenance::Assumed);
    let delhi_seismic = result.region_a.seismic.as_ref().unwrap();
    assert_eq!(delhi_seismic.catalog.as_ref().unwrap().count, 12);
    assert!(result.region_b.seismic.as_ref().unwrap().catalog.is_none());

    let mut sink = MemorySink::default();
    sink.accept(&Report::Comparison(result)).unwrap();
    assert_eq!(sink.reports[0]["report"], "comparison");
    assert_eq!(sink.reports[0]["region_a"]["region_name"], "Delhi");
}

#[test]
fn sustainability_report_for_missing_data_city() {
    let imagery = CityImagery::new(&[]);
    let providers = Providers {
        imagery: &imagery,
        class_areas: &CityLandCover,
        seismic: &Catalog,
    };
    let region = Region::new("Nowhere", BoundingBox::new(10.0, 70.0, 10.5, 70.5).unwrap());
    let mut ctx = RequestContext::new();

    let report = SustainabilityPipeline::default()
        .generate(&mut ctx, &providers, &region, 2023)
        .unwrap()
        .unwrap();

    assert_eq!(report.component_scores.len(), 5);
    assert!(report
        .component_scores
        .iter()
        .all(|s| s.provenance == Provenance::Assumed));
    // Every fallback is documented: NDVI 0, AQI 100, LST 30 °C, risk 0.5
    assert_eq!(report.raw_metrics.ndvi, Some(0.0));
    assert_eq!(report.raw_metrics.aqi, Some(100.0));
    assert_eq!(report.raw_metrics.lst, Some(30.0));
    assert_eq!(report.raw_metrics.risk, Some(0.5));
    assert_eq!(report.weakest_sector, Module::Vegetation);
    assert_eq!(report.mitigations[0].title, "Strategic Afforestation");
    assert!(report.projected_total > report.total);
    assert_eq!(report.seismic_zone, Some(SeismicZone::III));
}

#[test]
fn delhi_future_risk_from_land_cover_history() {
    let imagery = imagery();
    let providers = Providers {
        imagery: &imagery,
        class_areas: &CityLandCover,
        seismic: &Catalog,
    };
    let mut ctx = RequestContext::new();
    let assessment = AssessmentPipeline::default()
        .assess(&mut ctx, &providers, &delhi(), &[Module::FutureRisk], 2023)
        .unwrap();

    // Built Area rising and Trees falling; Grass flat
    assert_relative_eq!(assessment.metrics.risk.unwrap(), 0.6, epsilon = 1e-9);
    let analyzer = TrendAnalyzer::default();
    let summary = analyzer.summarize(&assessment.lulc_trends, "LULC");
    assert_eq!(summary.significant_increases[0].name, "Built Area");
    assert_eq!(summary.significant_decreases[0].name, "Trees");
    assert_eq!(summary.stable, vec!["Grass".to_string()]);
    // one module of 25 points, normalized to the 0-100 scale
    assert_relative_eq!(assessment.composite.total, 40.0, epsilon = 1e-9);
}

#[test]
fn monitoring_pass_over_stored_regions() {
    let imagery = CityImagery::new(&[("Delhi", "PM25", 140.0), ("Delhi", "LST_Day", 44.2)]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("monitoring.db");
    let now: NaiveDateTime = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();

    // The dashboard registers regions; the scheduler runs with its own handle.
    let mut dashboard = SqliteStore::open(&path).unwrap();
    let id = dashboard.add_region("Delhi", delhi().bbox, now).unwrap().unwrap();
    dashboard.set_threshold(id, Threshold::new("PM25", Operator::Above, 100.0)).unwrap();
    dashboard.set_threshold(id, Threshold::new("LST_Day", Operator::Below, 20.0)).unwrap();

    let mut scheduler = SqliteStore::open(&path).unwrap();
    let monitor = Monitor::new(&imagery, MonitorConfig::default());
    let run = monitor.run(&mut scheduler, now).unwrap();

    assert_eq!(run.regions_checked, 1);
    assert_eq!(run.alerts.len(), 1);
    assert_eq!(run.alerts[0].message, "Alert! PM25 in Delhi is 140.00 (Threshold: > 100)");
    let recent = dashboard.get_recent_alerts(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert!(!recent[0].read);
    assert_eq!(dashboard.mark_all_read().unwrap(), 1);
    assert_eq!(scheduler.get_unread_count().unwrap(), 0);
}

/// Imagery that depends only on where the box is.
struct LatitudeImagery;

impl ImageryProvider for LatitudeImagery {
    fn get_aggregate(&self, region: &Region, metric: &str, _: &DateRange) -> Observation {
        let north = region.bbox.center().0 > 20.0;
        match metric {
            metric::NDVI => Observation::Value(if north { 0.1 } else { 0.6 }),
            metric::LST => Observation::Value(if north { 42.0 } else { 31.0 }),
            _ => Observation::NoData,
        }
    }
}

#[test]
fn same_named_regions_are_assessed_separately() {
    let providers = Providers {
        imagery: &LatitudeImagery,
        class_areas: &CityLandCover,
        seismic: &Catalog,
    };
    let north = Region::new("Custom Region", delhi().bbox);
    let south = Region::new("Custom Region", bangalore().bbox);
    let mut ctx = RequestContext::new();

    let result = ComparisonDriver::new(AssessmentPipeline::default(), ComparisonThresholds::default())
        .compare(
            &mut ctx,
            &providers,
            &north,
            &south,
            &[Module::Vegetation, Module::UrbanHeat],
            2023,
        )
        .unwrap();

    assert_eq!(result.region_a.metrics.ndvi, Some(0.1));
    assert_eq!(result.region_b.metrics.ndvi, Some(0.6));
    assert_eq!(result.region_a.metrics.lst, Some(42.0));
    assert_eq!(result.region_b.metrics.lst, Some(31.0));
    assert!(result.uss_diff < 0.0);
}

#[test]
fn configured_pipeline_uses_custom_thresholds() {
    let config = AnalysisConfig::from_toml_str(
        r#"
        [comparison]
        uss_similar = 100.0
        "#,
    )
    .unwrap();
    let imagery = imagery();
    let providers = Providers {
        imagery: &imagery,
        class_areas: &CityLandCover,
        seismic: &Catalog,
    };
    let mut ctx = RequestContext::new();
    let result = config
        .comparison_driver()
        .unwrap()
        .compare(&mut ctx, &providers, &delhi(), &bangalore(), &[Module::UrbanHeat], 2023)
        .unwrap();
    assert_eq!(
        result.statements[0],
        "Both regions show **similar overall sustainability performance**."
    );
    assert_eq!(result.statements.len(), 2);
}
