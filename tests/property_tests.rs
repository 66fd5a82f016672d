//! Property-based tests for fitting, forecasting and scoring.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated series and metric values.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use std::collections::BTreeMap;
use urbansense::core::{MetricDomain, TimeSeries, TimeSeriesPoint};
use urbansense::forecast::{ForecastConfig, ForecastGenerator};
use urbansense::scoring::{
    classify, grade, score_air_quality, score_urban_heat, score_vegetation, Classification,
    CompositeScorer, Module, ModuleScore, Provenance, SeismicRiskScorer, SeismicZone,
};
use urbansense::trend::{BoostingConfig, TrendFitter};

/// Yearly series starting in 2010.
fn make_yearly(values: &[f64]) -> TimeSeries {
    let data: BTreeMap<i32, f64> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (2010 + i as i32, *v))
        .collect();
    TimeSeries::from_yearly(&data).unwrap()
}

/// Daily series starting on 2022-01-01.
fn make_daily(values: &[f64]) -> TimeSeries {
    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    TimeSeries::new(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesPoint::new(start + Duration::days(i as i64), *v))
            .collect(),
    )
    .unwrap()
}

/// Strategy for yearly values with non-zero variance.
fn yearly_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(0.0..100.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.01;
            }
            v
        })
    })
}

fn domain_strategy() -> impl Strategy<Value = MetricDomain> {
    prop_oneof![
        Just(MetricDomain::Percentage),
        Just(MetricDomain::UnitInterval),
        Just(MetricDomain::SignedUnit),
        Just(MetricDomain::Unbounded),
    ]
}

fn zone_strategy() -> impl Strategy<Value = Option<SeismicZone>> {
    prop_oneof![
        Just(None),
        Just(Some(SeismicZone::II)),
        Just(Some(SeismicZone::III)),
        Just(Some(SeismicZone::IV)),
        Just(Some(SeismicZone::V)),
    ]
}

proptest! {
    #[test]
    fn sparse_fit_is_deterministic(values in yearly_values_strategy(2, 25)) {
        let series = make_yearly(&values);
        let fitter = TrendFitter::new();
        let a = fitter.fit(&series).unwrap();
        let b = fitter.fit(&series).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn fitted_statistics_are_in_range(values in yearly_values_strategy(3, 25)) {
        let trend = TrendFitter::new().fit(&make_yearly(&values)).unwrap();
        prop_assert!((0.0..=1.0).contains(&trend.r_squared));
        let p = trend.p_value.unwrap();
        prop_assert!((0.0..=1.0).contains(&p));
        prop_assert_eq!(trend.significant, p < 0.05);
        prop_assert_eq!(trend.sample_count, values.len());
    }

    #[test]
    fn forecast_bounds_are_ordered(
        values in yearly_values_strategy(3, 20),
        years in prop::collection::vec(2030..2060_i32, 1..5),
        domain in domain_strategy(),
    ) {
        let trend = TrendFitter::new().fit(&make_yearly(&values)).unwrap();
        let generator = ForecastGenerator::new(ForecastConfig::default());
        let forecasts = generator.forecast(&trend, &years, domain).unwrap();
        let (lo, hi) = domain.bounds();

        prop_assert_eq!(forecasts.len(), years.len());
        for f in &forecasts {
            prop_assert!(f.lower_bound <= f.predicted);
            prop_assert!(f.predicted <= f.upper_bound);
            prop_assert!(f.lower_bound >= lo && f.upper_bound <= hi);
            prop_assert_eq!(f.confidence_level.as_str(), "95%");
        }
    }

    #[test]
    fn two_samples_never_forecast(a in 0.0..100.0_f64, b in 0.0..100.0_f64) {
        let trend = TrendFitter::new().fit(&make_yearly(&[a, b])).unwrap();
        let generator = ForecastGenerator::new(ForecastConfig::default());
        prop_assert!(generator.forecast(&trend, &[2030], MetricDomain::Unbounded).is_none());
    }

    #[test]
    fn module_scores_are_bounded(
        ndvi in -1e6..1e6_f64,
        impervious in -1e6..1e6_f64,
        pm25 in -1e6..1e6_f64,
        lst in -1e6..1e6_f64,
    ) {
        for score in [
            score_vegetation(ndvi, impervious),
            score_air_quality(pm25),
            score_urban_heat(lst),
        ] {
            prop_assert!((0.0..=25.0).contains(&score));
        }
    }

    #[test]
    fn composite_total_is_bounded(scores in prop::collection::vec(-50.0..50.0_f64, 0..6)) {
        let modules: Vec<ModuleScore> = scores
            .iter()
            .zip(Module::ALL.iter().cycle())
            .map(|(s, m)| ModuleScore::new(*m, *s, *s, Provenance::Measured))
            .collect();
        let composite = CompositeScorer::default().composite(modules);
        prop_assert!((0.0..=100.0).contains(&composite.total));
        prop_assert_eq!(composite.classification, classify(composite.total));
        for m in &composite.component_scores {
            prop_assert_eq!(m.grade, grade(m.score, 25.0));
        }
    }

    #[test]
    fn seismic_weights_sum_to_one_without_fault(
        pga in 0.0..1.0_f64,
        zone in zone_strategy(),
        count in 0usize..200,
        exposure in 0.0..1.0_f64,
    ) {
        let breakdown = SeismicRiskScorer::default().score(pga, zone, count, None, exposure);
        prop_assert!((breakdown.weight_sum() - 1.0).abs() < 1e-9);
        prop_assert_eq!(breakdown.components.len(), 4);

        let weighted: f64 = breakdown.components.values().map(|c| c.score * c.weight).sum();
        prop_assert!((breakdown.total_score - weighted).abs() < 1e-9);
        prop_assert!((0.0..=100.0).contains(&breakdown.total_score));
    }

    #[test]
    fn classification_is_monotone(a in 0.0..100.0_f64, b in 0.0..100.0_f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(classify(lo) <= classify(hi));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn dense_fit_is_deterministic(
        base in 10.0..50.0_f64,
        amplitude in 1.0..10.0_f64,
        len in 45usize..80,
    ) {
        let values: Vec<f64> = (0..len)
            .map(|i| base + amplitude * (i as f64 / 7.0).sin() + 0.05 * i as f64)
            .collect();
        let series = make_daily(&values);
        let fitter = TrendFitter::new().with_boosting(BoostingConfig::default().with_estimators(20));
        let a = fitter.fit(&series).unwrap();
        let b = fitter.fit(&series).unwrap();
        prop_assert_eq!(a.p_value, None);
        prop_assert_eq!(a, b);
    }
}

#[test]
fn classification_boundaries() {
    assert_eq!(classify(80.0), Classification::Excellent);
    assert_eq!(classify(79.999), Classification::Good);
    assert_eq!(classify(20.0), Classification::Poor);
    assert_eq!(classify(19.999), Classification::Critical);
}
