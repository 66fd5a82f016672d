//! Rule-based narrative insights.
//!
//! Each generator applies fixed threshold rules to summary statistics and
//! returns findings, likely causes, actions and an outlook, together with
//! the rules that fired. Output is deterministic for a given input.

use serde::Serialize;
use std::collections::BTreeMap;

/// Land-cover classes counted as green cover.
pub const GREEN_CLASSES: [&str; 4] = ["Trees", "Grass", "Shrub & Scrub", "Crops"];

/// Land-cover classes counted as impervious.
pub const IMPERVIOUS_CLASSES: [&str; 2] = ["Built Area", "Bare Ground"];

/// Narrative insight for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insight {
    pub key_findings: Vec<String>,
    pub root_causes: Vec<String>,
    pub mitigation_actions: Vec<String>,
    pub future_risks: String,
    pub rules_used: Vec<String>,
}

impl Insight {
    fn finding(&mut self, text: impl Into<String>) {
        self.key_findings.push(text.into());
    }

    fn cause(&mut self, text: &str) {
        self.root_causes.push(text.to_string());
    }

    fn action(&mut self, text: impl Into<String>) {
        self.mitigation_actions.push(text.into());
    }

    fn rule(&mut self, text: &str) {
        self.rules_used.push(text.to_string());
    }
}

fn share_of(classes: &BTreeMap<String, f64>, names: &[&str]) -> f64 {
    names.iter().filter_map(|n| classes.get(*n)).sum()
}

/// Land-cover insight from class percentages and mean NDVI. `None` when
/// there is no class composition.
pub fn lulc_insights(class_percentages: &BTreeMap<String, f64>, ndvi_mean: f64) -> Option<Insight> {
    if class_percentages.is_empty() {
        return None;
    }
    let green = share_of(class_percentages, &GREEN_CLASSES);
    let impervious = share_of(class_percentages, &IMPERVIOUS_CLASSES);
    let mut insight = Insight::default();

    if ndvi_mean < 0.2 {
        insight.finding(format!("NDVI ({:.2}) indicates sparse vegetation coverage.", ndvi_mean));
        insight.rule("NDVI < 0.2 = sparse vegetation");
    } else if ndvi_mean <= 0.5 {
        insight.finding(format!("NDVI ({:.2}) indicates moderate vegetation density.", ndvi_mean));
        insight.rule("0.2 <= NDVI <= 0.5 = moderate vegetation");
    } else {
        insight.finding(format!("NDVI ({:.2}) indicates dense healthy vegetation.", ndvi_mean));
        insight.rule("NDVI > 0.5 = dense vegetation");
    }
    insight.finding(format!("Impervious surface covers {:.1}% of the area.", impervious));
    insight.rule("Higher impervious area = potential UHI risk");
    insight.finding(format!("Total green cover is {:.1}%.", green));

    if ndvi_mean < 0.2 || green < 20.0 {
        insight.cause("Urban expansion and construction activities leading to loss of natural vegetation.");
        insight.cause("Soil degradation or lack of irrigation in open spaces.");
    } else {
        insight.cause("Effective preservation of parks or existing agricultural zones.");
    }
    if impervious > 50.0 {
        insight.cause(
            "High density of built-up infrastructure (roads, buildings) preventing water percolation.",
        );
    }

    if green < 30.0 {
        insight.action("Increase urban green spaces by planting native trees in open areas and along roads.");
        insight.action("Implement vertical gardens or green facades on high-rise buildings.");
    }
    if impervious > 40.0 {
        insight.action("Promote permeable pavement materials for parking lots and walkways to reduce runoff.");
        insight.action("Mandate rainwater harvesting systems for new developments.");
    }
    insight.action("Regularly monitor vegetation health using satellite indices to detect early degradation.");

    insight.future_risks = if impervious > 60.0 {
        "Continued increase in impervious surfaces will likely exacerbate Urban Heat Island effects and increase flood risks due to reduced drainage."
    } else if green < 15.0 {
        "Critically low green cover poses risks to air quality and local temperature regulation, potentially leading to heat stress."
    } else {
        "Balanced land use currently, but monitoring is needed to prevent encroachment on green zones."
    }
    .to_string();

    Some(insight)
}

/// Air-quality insight from mean PM2.5 (µg/m³) and optional NO2 column.
pub fn aqi_insights(pm25: f64, no2: Option<f64>) -> Insight {
    let mut insight = Insight::default();

    if pm25 > 100.0 {
        insight.finding(format!("PM2.5 levels ({:.2}) are in the Hazardous range.", pm25));
        insight.rule("PM2.5 > 100 = Hazardous");
    } else if pm25 > 60.0 {
        insight.finding(format!("PM2.5 levels ({:.2}) exceed daily safety limits.", pm25));
        insight.rule("PM2.5 > 60 = Poor");
    } else {
        insight.finding(format!("PM2.5 levels ({:.2}) are within acceptable limits.", pm25));
    }
    if no2.is_some_and(|v| v > 0.0) {
        insight.finding("Detected NO2 presence, often associated with combustion.");
        insight.rule("High NO2 = Traffic/Industrial emissions");
    }

    if pm25 > 60.0 {
        insight.cause(
            "Accumulation of particulate matter from vehicle exhaust, dust resuspension, and construction.",
        );
        insight.cause(
            "Low wind speeds or temperature inversion preventing pollutant dispersion (especially in winter).",
        );
    }
    insight.cause("Traffic congestion during peak hours contributing to NO2 and CO levels.");

    if pm25 > 60.0 {
        insight.action("Implement dust control measures at construction sites (e.g., water sprinkling).");
        insight.action("Restrict heavy vehicle movement during peak pollution hours.");
    }
    insight.action("Enhance public transport last-mile connectivity to reduce private vehicle reliance.");
    insight.action("Create green buffers along major roadways to absorb particulate matter.");

    insight.future_risks = if pm25 > 80.0 {
        "Prolonged exposure to current PM2.5 levels poses severe regulatory and health risks, increasing respiratory ailments."
    } else {
        "Rising vehicle density may push air quality into poor categories without strict emission controls."
    }
    .to_string();

    insight
}

/// Urban heat insight from mean and maximum land-surface temperature (°C).
pub fn uhi_insights(mean_celsius: f64, max_celsius: f64) -> Insight {
    let mut insight = Insight::default();
    let spread = max_celsius - mean_celsius;

    insight.finding(format!("Mean Land Surface Temperature is {:.1}°C.", mean_celsius));
    insight.finding(format!(
        "Significant localized heat hotspots detected (Max: {:.1}°C).",
        max_celsius
    ));
    insight.finding(format!("Temperature variability is {:.1}°C across the region.", spread));
    insight.rule("Higher impervious area correlates with higher LST");
    insight.rule("Large Max-Mean diff indicates unequal heat distribution");

    insight.cause("Dense concrete/asphalt surfaces absorbing and retaining solar heat (Urban Heat Island effect).");
    insight.cause("Lack of evapotranspiration due to reduced vegetation cover in central hotspots.");
    insight.cause("Waste heat from air conditioning and vehicular traffic adding to surface temperature.");

    insight.action("Install cool roofs (high albedo materials) to reflect sunlight on industrial/commercial buildings.");
    insight.action("Increase tree canopy coverage to provide shading and cooling via evapotranspiration.");
    insight.action("Use permeable pavers for parking areas to reduce surface heat retention.");
    insight.action("Increasing vegetation by 10% may reduce surface temperature by ~1.0-1.5°C.");

    insight.future_risks = "Without mitigation, peak summer temperatures may exceed comfortable safety limits, increasing energy demand for cooling.".to_string();
    insight
}

/// Rising when the last value exceeds the first. `None` for fewer than two
/// values.
fn rising(values: &[f64]) -> Option<bool> {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 => Some(last > first),
        _ => None,
    }
}

/// Outlook from forecast AQI and LST paths. `None` when both are empty.
pub fn predictive_insights(aqi_path: &[f64], lst_path: &[f64]) -> Option<Insight> {
    if aqi_path.is_empty() && lst_path.is_empty() {
        return None;
    }
    let mut insight = Insight::default();

    let aqi_rising = match rising(aqi_path) {
        Some(true) => {
            insight.finding("Forecast suggests an upward trend in overall AQI levels.");
            true
        }
        Some(false) => {
            insight.finding("Forecast suggests stable or improving AQI levels.");
            false
        }
        None => false,
    };
    let lst_rising = match rising(lst_path) {
        Some(true) => {
            insight.finding("LST forecast indicates a gradual warming trend.");
            true
        }
        Some(false) => {
            insight.finding("LST forecast indicates stable thermal conditions.");
            false
        }
        None => false,
    };
    insight.rule("Positive slope = Increasing Trend");

    if aqi_rising {
        insight.cause("Projected industrial growth and vehicle fleet expansion outpacing emission controls.");
        insight.action("Pre-emptive implementation of stricter emission norms for new industries.");
        insight.action("Expansion of real-time monitoring network to identify emerging hotspots.");
    }
    if lst_rising {
        insight.cause("Ongoing urbanization converting natural cover to heat-absorbing built-up areas.");
        insight.action("Enforce 'Green Building' codes for all future commercial developments.");
        insight.action("Plan for urban cooling corridors (wind paths) in master city planning.");
    }
    if !aqi_rising && !lst_rising {
        insight.cause("Current trends reflect stable environmental conditions or effective existing policies.");
    }

    insight.future_risks = match (aqi_rising, lst_rising) {
        (true, true) => "Compound risk of degrading air quality and rising heat stress may significantly impact public health and livability.",
        (true, false) => "Risk of respiratory health issues increasing if pollution trend continues unchecked.",
        (false, true) => "Risk of increased energy consumption for cooling and potential heat island intensification.",
        (false, false) => "Minimal immediate risk, but continuous monitoring is advised to detect sudden changes.",
    }
    .to_string();

    Some(insight)
}
