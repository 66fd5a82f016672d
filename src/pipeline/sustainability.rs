//! Sustainability report generation.
//!
//! Scores every module, finds the weakest sector and turns the result into
//! narrative sections: overview, per-module analysis, sector mitigations,
//! an improvement projection and a three-step roadmap.

use crate::error::Result;
use crate::pipeline::assessment::{AssessmentPipeline, Providers, RegionAssessment};
use crate::pipeline::context::RequestContext;
use crate::providers::Region;
use crate::report::{metric_statuses, Mitigation, RoadmapStep, SustainabilityReport};
use crate::scoring::{classify, Module};
use std::fmt::Write;
use tracing::info;

/// Mitigations for a sector, strongest first, and the estimated USS gain
/// from addressing it.
pub fn sector_playbook(module: Module) -> (Vec<Mitigation>, f64) {
    let entries: [(&str, &str); 3] = match module {
        Module::Vegetation => [
            ("Strategic Afforestation", "Implement Miyawaki forests in available pocket spaces."),
            ("Green Corridors", "Connect fragmented green spaces to improve biodiversity and cooling."),
            ("Permeable Paving", "Mandate permeable materials for new parking lots to reduce runoff."),
        ],
        Module::AirQuality => [
            ("Traffic Management", "Implement low-emission zones (LEZ) in city centers."),
            ("Construction Dust Control", "Enforce strict regulations for construction sites (sprinklers/barriers)."),
            ("Green Buffers", "Plant dense foliage along major highways to trap particulate matter."),
        ],
        Module::UrbanHeat => [
            ("Cool Roofs", "Subsidize white reflective paint for industrial and residential roofs."),
            ("Urban Water Bodies", "Revive and maintain lakes/ponds to act as heat sinks."),
            ("Shading Policy", "Increase tree canopy coverage along pedestrian walkways."),
        ],
        Module::FutureRisk => [
            ("Policy Framework", "Enforce stricter zoning laws preventing encroachments on wetlands."),
            ("Sustainable Transport", "Invest heavily in EV infrastructure and public transit."),
            ("Climate Resilience Plan", "Develop a 10-year master plan for climate adaptation."),
        ],
        Module::EarthquakeSafety => [
            ("Structural Retrofitting", "Retrofit hospitals, schools and other lifeline buildings to current seismic codes."),
            ("Building Code Enforcement", "Tie construction permits to IS 1893 compliant design audits."),
            ("Emergency Preparedness", "Maintain open evacuation spaces and run community response drills."),
        ],
    };
    let gain = match module {
        Module::Vegetation => 10.0,
        Module::AirQuality => 8.0,
        Module::UrbanHeat => 12.0,
        Module::FutureRisk => 5.0,
        Module::EarthquakeSafety => 6.0,
    };
    let mitigations = entries
        .iter()
        .map(|(title, description)| Mitigation {
            title: title.to_string(),
            description: description.to_string(),
        })
        .collect();
    (mitigations, gain)
}

fn overview(a: &RegionAssessment, weakest: Module) -> String {
    let mut text = format!(
        "The **Urban Sustainability Score (USS)** for **{}** is **{:.1}/100**, classified as **{}**. \
         This composite metric integrates satellite-derived data on vegetation health, air quality, \
         thermal comfort, and predictive climate risks.\n\n\
         The region's environmental state is currently driven by its **{}** performance.",
        a.region_name, a.composite.total, a.composite.classification, weakest
    );
    let m = &a.metrics;
    if let (Some(ndvi), Some(imp)) = (m.ndvi, m.impervious) {
        let _ = write!(
            text,
            " With an NDVI of **{:.2}** and an impervious surface ratio of **{:.1}%**, \
             the biological infrastructure plays a key role.",
            ndvi,
            imp * 100.0
        );
    }
    match (m.aqi, m.lst) {
        (Some(aqi), Some(lst)) => {
            let _ = write!(
                text,
                " Simultaneously, the air quality index averages around **{:.0}**, \
                 while land surface temperatures average **{:.1}°C**.",
                aqi, lst
            );
        }
        (Some(aqi), None) => {
            let _ = write!(text, " The air quality index averages around **{:.0}**.", aqi);
        }
        (None, Some(lst)) => {
            let _ = write!(text, " Land surface temperatures average **{:.1}°C**.", lst);
        }
        (None, None) => {}
    }
    text
}

fn analysis(a: &RegionAssessment) -> String {
    let m = &a.metrics;
    let mut sections: Vec<String> = Vec::new();

    if let Some(ndvi) = m.ndvi {
        let mut s = format!(
            "Vegetation & Land Use\n- Current State: NDVI is {:.2}, indicating {} vegetation.",
            ndvi,
            if ndvi > 0.4 { "healthy" } else { "sparse" }
        );
        if let Some(imp) = m.impervious {
            let _ = write!(
                s,
                "\n- Trend: Urbanization pressure is evident with {:.1}% impervious coverage.",
                imp * 100.0
            );
        }
        sections.push(s);
    }
    if let Some(aqi) = m.aqi {
        let mut s = format!("Air Quality\n- Status: Average AQI is {:.0}", aqi);
        if let Some(pm25) = m.pm25 {
            let _ = write!(s, " (PM2.5: {:.1} µg/m³)", pm25);
        }
        s.push_str(".\n- Implication: ");
        s.push_str(if aqi > 100.0 {
            "Air quality is a major concern requiring immediate intervention."
        } else {
            "Air quality is within manageable limits but requires monitoring."
        });
        sections.push(s);
    }
    if let Some(lst) = m.lst {
        sections.push(format!(
            "Urban Heat\n- Thermal Comfort: Mean LST is {:.1}°C.\n\
             - UHI Effect: High impervious surfaces contribution to heat island formation is {}.",
            lst,
            if lst > 35.0 { "significant" } else { "moderate" }
        ));
    }
    if let Some(risk) = m.risk {
        sections.push(format!(
            "Predictive Risk\n- Risk Factor: Calculated at {:.2} (0-1 scale).\n\
             - Outlook: Future development trends suggest a {} probability of environmental \
             degradation if unchecked.",
            risk,
            if risk > 0.5 { "high" } else { "stable" }
        ));
    }
    if let Some(seismic) = &a.seismic {
        sections.push(format!(
            "Seismic Safety\n- Zone: IS 1893 Zone {} ({} hazard).\n\
             - Composite Risk: {:.1}/100 ({}).",
            seismic.zone,
            seismic.zone.risk_label(),
            seismic.breakdown.total_score,
            seismic.breakdown.risk_class
        ));
    }

    sections
        .iter()
        .enumerate()
        .map(|(i, s)| format!("### {}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn roadmap(mitigations: &[Mitigation], weakest: Module) -> Vec<RoadmapStep> {
    let title = |i: usize| mitigations.get(i).map_or("", |m| m.title.as_str());
    vec![
        RoadmapStep {
            timeline: "Short-term (0-1 yr)".to_string(),
            action: format!("Pilot {} projects in hotspots.", title(0)),
            expected_outcome: "Immediate relief in critical zones.".to_string(),
        },
        RoadmapStep {
            timeline: "Mid-term (1-3 yrs)".to_string(),
            action: format!("Scale up {} across the region.", title(1)),
            expected_outcome: format!("Structural improvement in {}.", weakest),
        },
        RoadmapStep {
            timeline: "Long-term (3-10 yrs)".to_string(),
            action: format!("Full implementation of {} and policy shifts.", title(2)),
            expected_outcome: format!("Sustainable dominance of the {} sector.", weakest),
        },
    ]
}

/// Build the report from a finished assessment. `None` when the
/// assessment scored no modules.
pub fn build_report(assessment: &RegionAssessment) -> Option<SustainabilityReport> {
    let weakest = assessment.composite.weakest()?.module;
    let (mitigations, gain) = sector_playbook(weakest);
    let projected_total = (assessment.composite.total + gain).min(100.0);

    Some(SustainabilityReport {
        region_name: assessment.region_name.clone(),
        year: assessment.year,
        total: assessment.composite.total,
        classification: assessment.composite.classification,
        classification_description: assessment.composite.classification.description().to_string(),
        component_scores: assessment.composite.component_scores.clone(),
        weakest_sector: weakest,
        overview: overview(assessment, weakest),
        analysis: analysis(assessment),
        roadmap: roadmap(&mitigations, weakest),
        mitigations,
        estimated_gain: gain,
        projected_total,
        projected_classification: classify(projected_total),
        raw_metrics: assessment.metrics.clone(),
        metric_status: metric_statuses(&assessment.metrics),
        seismic_zone: assessment.seismic.as_ref().map(|s| s.zone),
    })
}

/// Runs an assessment over a fixed module set and builds the report.
#[derive(Debug, Clone)]
pub struct SustainabilityPipeline {
    assessment: AssessmentPipeline,
    modules: Vec<Module>,
}

impl Default for SustainabilityPipeline {
    fn default() -> Self {
        Self::new(AssessmentPipeline::default())
    }
}

impl SustainabilityPipeline {
    /// Pipeline over all five modules.
    pub fn new(assessment: AssessmentPipeline) -> Self {
        Self {
            assessment,
            modules: Module::ALL.to_vec(),
        }
    }

    pub fn with_modules(mut self, modules: Vec<Module>) -> Self {
        self.modules = modules;
        self
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Assess `region` and build its report. `None` when no modules are
    /// selected.
    pub fn generate(
        &self,
        ctx: &mut RequestContext,
        providers: &Providers<'_>,
        region: &Region,
        year: i32,
    ) -> Result<Option<SustainabilityReport>> {
        let assessment = self
            .assessment
            .assess(ctx, providers, region, &self.modules, year)?;
        let report = build_report(&assessment);
        if let Some(r) = &report {
            info!(
                region = %r.region_name,
                total = r.total,
                weakest = %r.weakest_sector,
                projected = %r.projected_classification,
                "sustainability report generated"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::assessment::KeyMetrics;
    use crate::scoring::{Classification, CompositeScorer, ModuleScore, Provenance};
    use std::collections::BTreeMap;

    fn assessment(scores: Vec<ModuleScore>, metrics: KeyMetrics) -> RegionAssessment {
        RegionAssessment {
            region_name: "Jaipur".to_string(),
            year: 2023,
            composite: CompositeScorer::default().composite(scores),
            metrics,
            lulc_trends: BTreeMap::new(),
            seismic: None,
        }
    }

    #[test]
    fn heat_is_weakest_sector() {
        let scores = vec![
            ModuleScore::new(Module::Vegetation, 15.0, 0.45, Provenance::Measured),
            ModuleScore::new(Module::AirQuality, 18.0, 90.0, Provenance::Measured),
            ModuleScore::new(Module::UrbanHeat, 6.0, 42.6, Provenance::Measured),
            ModuleScore::new(Module::FutureRisk, 12.5, 0.5, Provenance::Measured),
        ];
        let metrics = KeyMetrics {
            ndvi: Some(0.45),
            impervious: Some(0.35),
            aqi: Some(90.0),
            pm25: Some(28.0),
            lst: Some(42.6),
            risk: Some(0.5),
        };
        let report = build_report(&assessment(scores, metrics)).unwrap();

        // (15 + 18 + 6 + 12.5) / 100 * 100
        assert!((report.total - 51.5).abs() < 1e-9);
        assert_eq!(report.classification, Classification::Moderate);
        assert_eq!(report.weakest_sector, Module::UrbanHeat);
        assert_eq!(report.estimated_gain, 12.0);
        assert_eq!(report.projected_classification, Classification::Good);
        assert_eq!(report.mitigations[0].title, "Cool Roofs");
        assert_eq!(report.roadmap[1].action, "Scale up Urban Water Bodies across the region.");
        assert_eq!(report.roadmap[2].expected_outcome, "Sustainable dominance of the Urban Heat sector.");
        assert!(report.overview.contains("**51.5/100**"));
        assert!(report.overview.contains("impervious surface ratio of **35.0%**"));
        assert!(report.analysis.contains("indicating healthy vegetation"));
        assert!(report.analysis.contains("is significant."));
        assert!(report.analysis.contains("### 4. Predictive Risk"));
        assert_eq!(report.metric_status.len(), 6);
    }

    #[test]
    fn every_sector_has_three_mitigations() {
        for module in Module::ALL {
            let (mitigations, gain) = sector_playbook(module);
            assert_eq!(mitigations.len(), 3);
            assert!(gain > 0.0);
        }
    }

    #[test]
    fn projection_caps_at_100() {
        let scores = vec![ModuleScore::new(Module::FutureRisk, 24.0, 0.04, Provenance::Measured)];
        let metrics = KeyMetrics {
            risk: Some(0.04),
            ..Default::default()
        };
        let report = build_report(&assessment(scores, metrics)).unwrap();
        assert_eq!(report.projected_total, 100.0);
        assert_eq!(report.projected_classification, Classification::Excellent);
        assert!(report.analysis.starts_with("### 1. Predictive Risk"));
    }

    #[test]
    fn no_modules_no_report() {
        assert!(build_report(&assessment(vec![], KeyMetrics::default())).is_none());
    }
}
