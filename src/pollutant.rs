//! Derived pollutant estimation.
//!
//! Converts an AQI value into a PM2.5 concentration using a piecewise-linear
//! curve over the US-AQI PM2.5 breakpoints, then derives PM10, NO2 and O3
//! through fixed ratios. The ratios are a presentation simplification, not
//! measured physics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::baseline::Pollutants;

/// `(aqi, pm25)` curve knots. Each segment is interpolated linearly.
const PM25_KNOTS: [(f64, f64); 6] = [
    (0.0, 0.0),
    (50.0, 12.0),
    (100.0, 35.4),
    (150.0, 55.4),
    (200.0, 150.4),
    (300.0, 250.4),
];

/// PM2.5 slope used beyond the last knot (AQI above 300).
const PM25_HAZARDOUS_SLOPE: f64 = 1.67;

/// PM10 as a multiple of PM2.5.
pub const PM10_RATIO: f64 = 1.4;
/// NO2 as a multiple of PM2.5.
pub const NO2_RATIO: f64 = 0.5;
/// O3 as a multiple of PM2.5.
pub const O3_RATIO: f64 = 0.3;

/// Estimates PM2.5 (µg/m³) for an AQI value.
///
/// Negative and non-finite inputs are treated as zero. Segment endpoints are
/// reproduced exactly (`50 → 12`, `100 → 35.4`).
#[must_use]
pub fn pm25_from_aqi(aqi: f64) -> f64 {
    let aqi = if aqi.is_finite() { aqi.max(0.0) } else { 0.0 };

    for pair in PM25_KNOTS.windows(2) {
        let (a_lo, c_lo) = pair[0];
        let (a_hi, c_hi) = pair[1];
        if aqi <= a_hi {
            let t = (aqi - a_lo) / (a_hi - a_lo);
            return (1.0 - t) * c_lo + t * c_hi;
        }
    }

    let (a_last, c_last) = PM25_KNOTS[PM25_KNOTS.len() - 1];
    c_last + (aqi - a_last) * PM25_HAZARDOUS_SLOPE
}

/// Estimates a full pollutant breakdown from an AQI value.
#[must_use]
pub fn estimate_pollutants(aqi: f64) -> Pollutants {
    let pm25 = pm25_from_aqi(aqi);
    Pollutants {
        pm25: Some(pm25),
        pm10: Some(pm25 * PM10_RATIO),
        no2: Some(pm25 * NO2_RATIO),
        o3: Some(pm25 * O3_RATIO),
        ..Pollutants::default()
    }
}

/// US-AQI health category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Classifies an AQI value.
    #[must_use]
    pub fn from_aqi(aqi: f64) -> Self {
        if aqi <= 50.0 {
            Self::Good
        } else if aqi <= 100.0 {
            Self::Moderate
        } else if aqi <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if aqi <= 200.0 {
            Self::Unhealthy
        } else if aqi <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Map colour (hex).
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Good => "#00e400",
            Self::Moderate => "#ffff00",
            Self::UnhealthyForSensitiveGroups => "#ff7e00",
            Self::Unhealthy => "#ff0000",
            Self::VeryUnhealthy => "#8f3f97",
            Self::Hazardous => "#7e0023",
        }
    }

    /// One-line health description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Good => "Air quality is satisfactory",
            Self::Moderate => "Air quality is acceptable",
            Self::UnhealthyForSensitiveGroups => "Sensitive groups may experience health effects",
            Self::Unhealthy => "Everyone may experience health effects",
            Self::VeryUnhealthy => "Health warnings of emergency conditions",
            Self::Hazardous => "Health alert: everyone may experience serious health effects",
        }
    }
}

impl fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pollutant identifiers used for "top pollutant" reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PollutantKind {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "NO₂")]
    No2,
    #[serde(rename = "O₃")]
    O3,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "SO₂")]
    So2,
}

impl PollutantKind {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pm25 => "PM2.5",
            Self::Pm10 => "PM10",
            Self::No2 => "NO₂",
            Self::O3 => "O₃",
            Self::Co => "CO",
            Self::So2 => "SO₂",
        }
    }
}

impl fmt::Display for PollutantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns the pollutant with the highest concentration.
///
/// PM2.5 wins ties and is the answer when nothing is reported.
#[must_use]
pub fn top_pollutant(pollutants: &Pollutants) -> PollutantKind {
    let candidates = [
        (PollutantKind::Pm10, pollutants.pm10),
        (PollutantKind::No2, pollutants.no2),
        (PollutantKind::O3, pollutants.o3),
        (PollutantKind::Co, pollutants.co),
        (PollutantKind::So2, pollutants.so2),
    ];

    let mut top = PollutantKind::Pm25;
    let mut max = pollutants.pm25.unwrap_or(0.0);
    for (kind, value) in candidates {
        if let Some(v) = value {
            if v > max {
                max = v;
                top = kind;
            }
        }
    }
    top
}
