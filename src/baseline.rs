//! Zone baseline state.
//!
//! `BaselineState` is what a caller (or a `BaselineDataProvider`) supplies
//! for a zone. Pollutant concentrations are optional on the wire; the engine
//! resolves a `MetricSnapshot` from it by substituting the documented
//! placeholders and clamping anything negative or non-finite to zero.

use serde::{Deserialize, Serialize};

use crate::alert::Alert;
use crate::metric::Metric;
use crate::pollutant;

/// PM2.5 placeholder used when a baseline omits it.
pub const DEFAULT_PM25: f64 = 85.0;

/// NO2 placeholder used when a baseline omits it.
pub const DEFAULT_NO2: f64 = 45.0;

/// Population placeholder used when a baseline omits it.
pub const DEFAULT_POPULATION_EXPOSED: u64 = 10_000;

/// Pollutant concentrations reported for a zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pollutants {
    /// Fine particulate matter (µg/m³).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm25: Option<f64>,
    /// Coarse particulate matter (µg/m³).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    /// Nitrogen dioxide (µg/m³).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    /// Ozone (µg/m³).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    /// Carbon monoxide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co: Option<f64>,
    /// Sulphur dioxide (µg/m³).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub so2: Option<f64>,
}

impl Pollutants {
    /// Iterates over the named fields that are present.
    pub fn present(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("pm25", self.pm25),
            ("pm10", self.pm10),
            ("no2", self.no2),
            ("o3", self.o3),
            ("co", self.co),
            ("so2", self.so2),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }
}

/// Baseline pollution/traffic state for a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineState {
    /// Canonical severity scalar.
    pub aqi: f64,
    /// Pollutant breakdown; missing entries fall back to placeholders.
    #[serde(default)]
    pub pollutants: Pollutants,
    /// Residents exposed in the zone. Any JSON number is accepted so that a
    /// predicted population can be fed back as a baseline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population_exposed: Option<f64>,
}

impl BaselineState {
    /// Creates a baseline with an AQI and nothing else.
    #[must_use]
    pub fn new(aqi: f64) -> Self {
        Self {
            aqi,
            pollutants: Pollutants::default(),
            population_exposed: None,
        }
    }

    /// Sets the pollutant breakdown.
    #[must_use]
    pub fn with_pollutants(mut self, pollutants: Pollutants) -> Self {
        self.pollutants = pollutants;
        self
    }

    /// Sets the exposed population.
    #[must_use]
    pub fn with_population(mut self, population: u64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let population = population as f64;
        self.population_exposed = Some(population);
        self
    }

    /// Seeds a full baseline from an AQI value alone.
    ///
    /// Pollutants are estimated with the fixed AQI→PM2.5 curve and ratios.
    #[must_use]
    pub fn from_aqi(aqi: f64, population_exposed: Option<f64>) -> Self {
        Self {
            aqi,
            pollutants: pollutant::estimate_pollutants(aqi),
            population_exposed,
        }
    }

    /// Seeds a baseline from an alert record.
    #[must_use]
    pub fn from_alert(alert: &Alert) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let population = alert.population_exposed.unwrap_or(DEFAULT_POPULATION_EXPOSED) as f64;
        Self::from_aqi(alert.aqi, Some(population))
    }

    /// Resolves the four simulated metrics, applying placeholders and clamping.
    #[must_use]
    pub fn snapshot(&self) -> MetricSnapshot {
        #[allow(clippy::cast_precision_loss)]
        let population = self
            .population_exposed
            .unwrap_or(DEFAULT_POPULATION_EXPOSED as f64);

        MetricSnapshot {
            aqi: non_negative(self.aqi),
            pm25: non_negative(self.pollutants.pm25.unwrap_or(DEFAULT_PM25)),
            no2: non_negative(self.pollutants.no2.unwrap_or(DEFAULT_NO2)),
            population_exposed: non_negative(population),
        }
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// The four metrics the engine simulates.
///
/// Used for both the resolved baseline and the predicted state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// Air Quality Index.
    pub aqi: f64,
    /// PM2.5 concentration.
    pub pm25: f64,
    /// NO2 concentration.
    pub no2: f64,
    /// Exposed population.
    pub population_exposed: f64,
}

impl MetricSnapshot {
    /// Returns the value of `metric`.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Aqi => self.aqi,
            Metric::Pm25 => self.pm25,
            Metric::No2 => self.no2,
            Metric::Population => self.population_exposed,
        }
    }

    /// Builds a snapshot by evaluating `f` for each metric.
    pub fn from_fn(mut f: impl FnMut(Metric) -> f64) -> Self {
        Self {
            aqi: f(Metric::Aqi),
            pm25: f(Metric::Pm25),
            no2: f(Metric::No2),
            population_exposed: f(Metric::Population),
        }
    }
}

/// The predicted post-intervention state has the baseline's shape.
pub type PredictedState = MetricSnapshot;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_substitutes_placeholders() {
        let snap = BaselineState::new(180.0).snapshot();
        assert_eq!(snap.aqi, 180.0);
        assert_eq!(snap.pm25, DEFAULT_PM25);
        assert_eq!(snap.no2, DEFAULT_NO2);
        assert_eq!(snap.population_exposed, 10_000.0);
    }

    #[test]
    fn snapshot_clamps_negative_and_nan() {
        let baseline = BaselineState::new(-5.0).with_pollutants(Pollutants {
            pm25: Some(f64::NAN),
            no2: Some(-1.0),
            ..Pollutants::default()
        });
        let snap = baseline.snapshot();
        assert_eq!(snap.aqi, 0.0);
        assert_eq!(snap.pm25, 0.0);
        assert_eq!(snap.no2, 0.0);

        let snap = BaselineState {
            population_exposed: Some(-40.0),
            ..BaselineState::new(100.0)
        }
        .snapshot();
        assert_eq!(snap.population_exposed, 0.0);
    }

    #[test]
    fn from_aqi_estimates_every_pollutant() {
        let b = BaselineState::from_aqi(50.0, None);
        assert_eq!(b.pollutants.pm25, Some(12.0));
        assert!(b.pollutants.o3.is_some());
        assert_eq!(b.snapshot().pm25, 12.0);
    }

    #[test]
    fn baseline_deserializes_partial_json() {
        let b: BaselineState =
            serde_json::from_str(r#"{"aqi": 220, "pollutants": {"pm25": 105}}"#).unwrap();
        assert_eq!(b.pollutants.pm25, Some(105.0));
        assert_eq!(b.pollutants.no2, None);
        assert_eq!(b.population_exposed, None);

        let b: BaselineState = serde_json::from_str(r#"{"aqi": 90}"#).unwrap();
        assert_eq!(b.pollutants, Pollutants::default());

        let b: BaselineState =
            serde_json::from_str(r#"{"aqi": 90, "populationExposed": 11280.0}"#).unwrap();
        assert_eq!(b.snapshot().population_exposed, 11_280.0);
    }
}
