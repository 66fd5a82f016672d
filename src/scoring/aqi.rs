//! Air-quality index conversions.
//!
//! Two scales are supported: the US EPA-style PM2.5 curve the sustainability
//! score uses, and the Indian CPCB National AQI over PM2.5 and PM10.

use serde::Serialize;
use std::fmt;

/// Upper bound of every AQI scale here.
pub const AQI_MAX: f64 = 500.0;

/// Convert a PM2.5 concentration (µg/m³) to a 0–500 AQI using the
/// piecewise-linear US breakpoints. Above 150.4 the index grows at one
/// point per µg/m³ until the cap.
pub fn pm25_to_aqi(pm25: f64) -> f64 {
    let pm = pm25.max(0.0);
    let aqi = if pm < 12.0 {
        pm * (50.0 / 12.0)
    } else if pm < 35.4 {
        50.0 + (pm - 12.0) * (50.0 / 23.4)
    } else if pm < 55.4 {
        100.0 + (pm - 35.4) * (50.0 / 20.0)
    } else if pm < 150.4 {
        150.0 + (pm - 55.4) * (50.0 / 95.0)
    } else {
        200.0 + (pm - 150.4)
    };
    aqi.min(AQI_MAX)
}

/// One row of a CPCB breakpoint table.
#[derive(Debug, Clone, Copy)]
struct Breakpoint {
    conc_lo: f64,
    conc_hi: f64,
    index_lo: f64,
    index_hi: f64,
}

const fn bp(conc_lo: f64, conc_hi: f64, index_lo: f64, index_hi: f64) -> Breakpoint {
    Breakpoint {
        conc_lo,
        conc_hi,
        index_lo,
        index_hi,
    }
}

const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    bp(0.0, 30.0, 0.0, 50.0),
    bp(31.0, 60.0, 51.0, 100.0),
    bp(61.0, 90.0, 101.0, 200.0),
    bp(91.0, 120.0, 201.0, 300.0),
    bp(121.0, 250.0, 301.0, 400.0),
    bp(251.0, 5000.0, 401.0, 500.0),
];

const PM10_BREAKPOINTS: [Breakpoint; 6] = [
    bp(0.0, 50.0, 0.0, 50.0),
    bp(51.0, 100.0, 51.0, 100.0),
    bp(101.0, 250.0, 101.0, 200.0),
    bp(251.0, 350.0, 201.0, 300.0),
    bp(351.0, 430.0, 301.0, 400.0),
    bp(431.0, 5000.0, 401.0, 500.0),
];

/// CPCB sub-index: `(Ihi - Ilo) / (Bhi - Blo) * (C - Blo) + Ilo`.
///
/// Concentrations between two published bands (e.g. 30.5 for PM2.5) are
/// assigned to the upper band, clamped at its lower concentration.
fn sub_index(conc: f64, table: &[Breakpoint]) -> f64 {
    if conc <= 0.0 {
        return 0.0;
    }
    for b in table {
        if conc <= b.conc_hi {
            let c = conc.max(b.conc_lo);
            return (b.index_hi - b.index_lo) / (b.conc_hi - b.conc_lo) * (c - b.conc_lo) + b.index_lo;
        }
    }
    table.last().map_or(AQI_MAX, |b| b.index_hi)
}

/// Pollutant driving a CPCB AQI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pollutant {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pollutant::Pm25 => f.write_str("PM2.5"),
            Pollutant::Pm10 => f.write_str("PM10"),
        }
    }
}

/// CPCB AQI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

impl AqiCategory {
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            AqiCategory::Good
        } else if aqi <= 100.0 {
            AqiCategory::Satisfactory
        } else if aqi <= 200.0 {
            AqiCategory::Moderate
        } else if aqi <= 300.0 {
            AqiCategory::Poor
        } else if aqi <= 400.0 {
            AqiCategory::VeryPoor
        } else {
            AqiCategory::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }

    /// Display color used by the dashboard legend.
    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "#00b050",
            AqiCategory::Satisfactory => "#92d050",
            AqiCategory::Moderate => "#ffff00",
            AqiCategory::Poor => "#ff9900",
            AqiCategory::VeryPoor => "#ff0000",
            AqiCategory::Severe => "#c00000",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPCB AQI: the maximum sub-index over the supplied pollutants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpcbAqi {
    pub aqi: f64,
    pub category: AqiCategory,
    pub dominant: Pollutant,
}

/// Compute the CPCB AQI from 24-hour PM2.5 and PM10 means.
///
/// Returns `None` when neither concentration is available.
pub fn cpcb_aqi(pm25: Option<f64>, pm10: Option<f64>) -> Option<CpcbAqi> {
    let candidates = [
        pm25.filter(|v| v.is_finite())
            .map(|c| (Pollutant::Pm25, sub_index(c, &PM25_BREAKPOINTS))),
        pm10.filter(|v| v.is_finite())
            .map(|c| (Pollutant::Pm10, sub_index(c, &PM10_BREAKPOINTS))),
    ];

    let (dominant, aqi) = candidates
        .into_iter()
        .flatten()
        .fold(None, |best: Option<(Pollutant, f64)>, (p, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((p, v)),
        })?;

    let aqi = aqi.round();
    Some(CpcbAqi {
        aqi,
        category: AqiCategory::from_aqi(aqi),
        dominant,
    })
}
