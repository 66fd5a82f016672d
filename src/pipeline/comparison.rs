//! Side-by-side comparison of two regions.

use crate::error::Result;
use crate::pipeline::assessment::{AssessmentPipeline, Providers, RegionAssessment};
use crate::pipeline::context::RequestContext;
use crate::providers::Region;
use crate::scoring::Module;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Deltas above which a module difference is called out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonThresholds {
    /// USS points below which both regions count as similar.
    pub uss_similar: f64,
    /// Relative NDVI difference in percent.
    pub ndvi_relative_pct: f64,
    /// Added to the NDVI denominator.
    pub ndvi_epsilon: f64,
    pub aqi_abs: f64,
    /// Absolute LST difference in °C.
    pub lst_abs: f64,
}

impl Default for ComparisonThresholds {
    fn default() -> Self {
        Self {
            uss_similar: 2.0,
            ndvi_relative_pct: 10.0,
            ndvi_epsilon: 0.001,
            aqi_abs: 20.0,
            lst_abs: 3.0,
        }
    }
}

/// Outcome of [`ComparisonDriver::compare`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub region_a: RegionAssessment,
    pub region_b: RegionAssessment,
    /// `a.total - b.total`.
    pub uss_diff: f64,
    pub statements: Vec<String>,
    pub modules: Vec<Module>,
    pub year: i32,
}

impl ComparisonResult {
    /// Statements joined into one paragraph.
    pub fn summary(&self) -> String {
        self.statements.join(" ")
    }
}

/// Assesses two regions one after the other and describes the difference.
#[derive(Debug, Clone, Default)]
pub struct ComparisonDriver {
    pipeline: AssessmentPipeline,
    thresholds: ComparisonThresholds,
}

impl ComparisonDriver {
    pub fn new(pipeline: AssessmentPipeline, thresholds: ComparisonThresholds) -> Self {
        Self {
            pipeline,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &ComparisonThresholds {
        &self.thresholds
    }

    pub fn compare(
        &self,
        ctx: &mut RequestContext,
        providers: &Providers<'_>,
        region_a: &Region,
        region_b: &Region,
        modules: &[Module],
        year: i32,
    ) -> Result<ComparisonResult> {
        let a = self.pipeline.assess(ctx, providers, region_a, modules, year)?;
        let b = self.pipeline.assess(ctx, providers, region_b, modules, year)?;
        let statements = summarize_comparison(&a, &b, modules, &self.thresholds);
        let uss_diff = a.total() - b.total();
        info!(
            region_a = %a.region_name,
            region_b = %b.region_name,
            uss_diff,
            "comparison complete"
        );
        Ok(ComparisonResult {
            region_a: a,
            region_b: b,
            uss_diff,
            statements,
            modules: modules.to_vec(),
            year,
        })
    }
}

fn raw(assessment: &RegionAssessment, module: Module) -> f64 {
    assessment.module(module).map_or(0.0, |s| s.raw_value)
}

/// Natural-language statements about how `a` and `b` differ.
pub fn summarize_comparison(
    a: &RegionAssessment,
    b: &RegionAssessment,
    modules: &[Module],
    thresholds: &ComparisonThresholds,
) -> Vec<String> {
    let mut statements = Vec::new();
    let (name_a, name_b) = (&a.region_name, &b.region_name);

    let uss_diff = a.total() - b.total();
    if uss_diff.abs() < thresholds.uss_similar {
        statements.push("Both regions show **similar overall sustainability performance**.".to_string());
    } else {
        let leader = if uss_diff > 0.0 { name_a } else { name_b };
        statements.push(format!(
            "**{}** outperforms overall with a Sustainability Score of **{:.1}** compared to **{:.1}**.",
            leader,
            a.total().max(b.total()),
            a.total().min(b.total())
        ));
    }

    if modules.contains(&Module::Vegetation) {
        let (va, vb) = (raw(a, Module::Vegetation), raw(b, Module::Vegetation));
        let diff_pct = (va - vb) / (vb + thresholds.ndvi_epsilon) * 100.0;
        if diff_pct.abs() > thresholds.ndvi_relative_pct {
            let greener = if va > vb { name_a } else { name_b };
            statements.push(format!(
                "**{}** has significantly **greener cover** (NDVI {:.2} vs {:.2}).",
                greener,
                va.max(vb),
                va.min(vb)
            ));
        }
    }

    if modules.contains(&Module::AirQuality) {
        let (va, vb) = (raw(a, Module::AirQuality), raw(b, Module::AirQuality));
        if (va - vb).abs() > thresholds.aqi_abs {
            let cleaner = if va < vb { name_a } else { name_b };
            statements.push(format!(
                "**{}** enjoys specifically **cleaner air** (AQI {:.0}).",
                cleaner,
                va.min(vb)
            ));
        }
    }

    if modules.contains(&Module::UrbanHeat) {
        let (va, vb) = (raw(a, Module::UrbanHeat), raw(b, Module::UrbanHeat));
        if (va - vb).abs() > thresholds.lst_abs {
            let cooler = if va < vb { name_a } else { name_b };
            statements.push(format!(
                "**{}** is noticeably **cooler** ({:.1}°C vs {:.1}°C).",
                cooler,
                va.min(vb),
                va.max(vb)
            ));
        }
    }

    if modules.contains(&Module::EarthquakeSafety) {
        let zone = |r: &RegionAssessment| {
            r.seismic
                .as_ref()
                .map_or_else(|| "Unknown".to_string(), |s| s.zone.to_string())
        };
        let (za, zb) = (zone(a), zone(b));
        if za != zb {
            statements.push(format!(
                "Seismic risk varies: **{}** is in **Zone {}** while **{}** is in **Zone {}**.",
                name_a, za, name_b, zb
            ));
        }
    }

    statements
}
