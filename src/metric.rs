//! Metrics reduced by interventions.
//!
//! Every intervention effect, ceiling, and impact factor is keyed by one of
//! four metrics. `MetricTable` is the fixed-shape container used for all of
//! them so that composition is a plain per-field accumulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A metric the engine can reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// Air Quality Index (unitless severity scalar).
    Aqi,
    /// Fine particulate matter concentration.
    Pm25,
    /// Nitrogen dioxide concentration.
    No2,
    /// Number of people exposed to unhealthy air.
    #[serde(rename = "populationExposed")]
    Population,
}

impl Metric {
    /// All metrics, in reporting order.
    pub const ALL: [Self; 4] = [Self::Aqi, Self::Pm25, Self::No2, Self::Population];

    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aqi => "aqi",
            Self::Pm25 => "pm25",
            Self::No2 => "no2",
            Self::Population => "populationExposed",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `f64` per metric.
///
/// Used for per-unit-weight coefficients, factor ceilings, and accumulated
/// impact factors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTable {
    /// AQI entry.
    #[serde(default)]
    pub aqi: f64,
    /// PM2.5 entry.
    #[serde(default)]
    pub pm25: f64,
    /// NO2 entry.
    #[serde(default)]
    pub no2: f64,
    /// Population entry.
    #[serde(default)]
    pub population: f64,
}

impl MetricTable {
    /// A table with every entry set to zero.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a table from explicit entries.
    #[must_use]
    pub const fn new(aqi: f64, pm25: f64, no2: f64, population: f64) -> Self {
        Self {
            aqi,
            pm25,
            no2,
            population,
        }
    }

    /// Returns the entry for `metric`.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Aqi => self.aqi,
            Metric::Pm25 => self.pm25,
            Metric::No2 => self.no2,
            Metric::Population => self.population,
        }
    }

    /// Mutable access to the entry for `metric`.
    pub fn get_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Aqi => &mut self.aqi,
            Metric::Pm25 => &mut self.pm25,
            Metric::No2 => &mut self.no2,
            Metric::Population => &mut self.population,
        }
    }

    /// Adds `scale * other` entry-wise.
    pub fn add_scaled(&mut self, other: &Self, scale: f64) {
        for metric in Metric::ALL {
            *self.get_mut(metric) += scale * other.get(metric);
        }
    }

    /// Entry-wise minimum against `ceiling`.
    #[must_use]
    pub fn min(&self, ceiling: &Self) -> Self {
        let mut out = *self;
        for metric in Metric::ALL {
            let slot = out.get_mut(metric);
            *slot = slot.min(ceiling.get(metric));
        }
        out
    }

    /// Iterates `(metric, value)` pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_wire_names_are_stable() {
        assert_eq!(Metric::Aqi.as_str(), "aqi");
        assert_eq!(Metric::Population.to_string(), "populationExposed");
        let json = serde_json::to_string(&Metric::Population).unwrap();
        assert_eq!(json, "\"populationExposed\"");
    }

    #[test]
    fn add_scaled_accumulates_each_metric() {
        let mut acc = MetricTable::ZERO;
        let coeffs = MetricTable::new(0.2, 0.14, 0.16, 0.06);
        acc.add_scaled(&coeffs, 0.5);
        acc.add_scaled(&coeffs, 0.5);
        assert!((acc.aqi - 0.2).abs() < 1e-12);
        assert!((acc.population - 0.06).abs() < 1e-12);
    }

    #[test]
    fn min_truncates_to_ceiling() {
        let t = MetricTable::new(0.9, 0.1, 0.5, 0.0);
        let capped = t.min(&MetricTable::new(0.6, 0.5, 0.4, 0.3));
        assert_eq!(capped, MetricTable::new(0.6, 0.1, 0.4, 0.0));
    }
}
