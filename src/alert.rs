//! Alert zones.
//!
//! Alerts are computed from station/cell readings: anything at or above the
//! medium-priority AQI threshold becomes an alert, graded HIGH or MEDIUM.
//! Alerts at the same (rounded) location are collapsed, and the result is
//! ordered by AQI, worst first. Alerts seed simulations through
//! [`BaselineState::from_alert`](crate::baseline::BaselineState::from_alert).

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::Pollutants;
use crate::pollutant::{self, PollutantKind};

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Dedup key: coordinates rounded to 4 decimal places (about 11 m).
    ///
    /// Integer keys make `-0.00001` and `0.00001` collide.
    #[allow(clippy::cast_possible_truncation)]
    fn rounded_key(&self) -> (i64, i64) {
        (
            (self.lat * 1e4).round() as i64,
            (self.lng * 1e4).round() as i64,
        )
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertSeverity {
    High,
    Medium,
}

impl AlertSeverity {
    /// Map colour (hex).
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => "#dc2626",
            Self::Medium => "#f59e0b",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
        }
    }
}

/// AQI thresholds for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertThresholds {
    /// At or above this AQI an alert is HIGH.
    pub high: f64,
    /// At or above this AQI an alert is raised at all.
    pub medium: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            high: 201.0,
            medium: 151.0,
        }
    }
}

impl AlertThresholds {
    /// Severity for an AQI value, or `None` below the medium threshold.
    #[must_use]
    pub fn classify(&self, aqi: f64) -> Option<AlertSeverity> {
        if aqi >= self.high {
            Some(AlertSeverity::High)
        } else if aqi >= self.medium {
            Some(AlertSeverity::Medium)
        } else {
            None
        }
    }
}

/// A reading reported by an air-quality station or grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationReading {
    /// Station or cell id; becomes the alert's zone id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Station location or cell centre.
    pub location: GeoPoint,
    /// Reported AQI.
    pub aqi: f64,
    /// Reported concentrations.
    #[serde(default)]
    pub pollutants: Pollutants,
    /// Time of the reading.
    pub updated_at: DateTime<Utc>,
}

/// A zone whose air quality warrants attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Zone identifier.
    pub zone_id: String,
    /// Display name.
    pub zone_name: String,
    /// Severity grade.
    pub severity: AlertSeverity,
    /// AQI that triggered the alert.
    pub aqi: f64,
    /// Dominant pollutant.
    pub top_pollutant: PollutantKind,
    /// Estimated residents exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_exposed: Option<u64>,
    /// Zone location.
    pub location: GeoPoint,
    /// Time of the underlying reading.
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Builds an alert from a reading, or `None` if the reading is below threshold.
    #[must_use]
    pub fn from_reading(reading: &StationReading, thresholds: &AlertThresholds) -> Option<Self> {
        let severity = thresholds.classify(reading.aqi)?;
        Some(Self {
            zone_id: reading.id.clone(),
            zone_name: reading.name.clone(),
            severity,
            aqi: reading.aqi,
            top_pollutant: pollutant::top_pollutant(&reading.pollutants),
            population_exposed: Some(estimate_population_exposed(reading.aqi)),
            location: reading.location,
            updated_at: reading.updated_at,
        })
    }
}

/// Residents exposed, estimated from AQI tier.
#[must_use]
pub fn estimate_population_exposed(aqi: f64) -> u64 {
    if aqi >= 300.0 {
        15_000
    } else if aqi >= 201.0 {
        10_000
    } else if aqi >= 151.0 {
        7_500
    } else {
        5_000
    }
}

/// Computes the alert list for a batch of readings.
///
/// The result holds only readings at or above `thresholds.medium`. It keeps
/// the first reading at each rounded location and is sorted by AQI
/// descending; ties keep input order.
#[must_use]
pub fn compute_alerts(readings: &[StationReading], thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut seen = HashSet::new();
    let mut alerts: Vec<Alert> = readings
        .iter()
        .filter_map(|r| Alert::from_reading(r, thresholds))
        .filter(|a| seen.insert(a.location.rounded_key()))
        .collect();

    alerts.sort_by(|a, b| b.aqi.total_cmp(&a.aqi));
    alerts
}
