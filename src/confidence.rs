//! Confidence band for simulation results.
//!
//! The band is a heuristic proxy for "more independent interventions back
//! this prediction". It is not a statistical confidence interval and has no
//! calibration against observed outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Heuristic confidence attached to a prediction, in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceBand(f64);

impl ConfidenceBand {
    /// Returns the band value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

impl From<ConfidenceBand> for f64 {
    fn from(band: ConfidenceBand) -> Self {
        band.0
    }
}

/// Linear-with-ceiling confidence model.
///
/// `band = min(ceiling, base + step × active_interventions)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceModel {
    /// Band with no interventions.
    pub base: f64,
    /// Increment per active intervention.
    pub step: f64,
    /// Hard cap.
    pub ceiling: f64,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self {
            base: 0.70,
            step: 0.05,
            ceiling: 0.95,
        }
    }
}

/// Decimal places kept so that `0.70 + 2 × 0.05` reads back as `0.80`.
const QUANTUM: f64 = 1e6;

impl ConfidenceModel {
    /// Band for `active` positive-weight interventions.
    #[must_use]
    pub fn band(&self, active: usize) -> ConfidenceBand {
        #[allow(clippy::cast_precision_loss)]
        let raw = self.base + self.step * active as f64;
        let quantized = (raw * QUANTUM).round() / QUANTUM;
        ConfidenceBand(quantized.min(self.ceiling).clamp(f64::MIN_POSITIVE, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_starts_at_base() {
        assert_eq!(ConfidenceModel::default().band(0).value(), 0.70);
    }

    #[test]
    fn band_steps_by_five_points() {
        let m = ConfidenceModel::default();
        assert_eq!(m.band(1).value(), 0.75);
        assert_eq!(m.band(2).value(), 0.80);
        assert_eq!(m.band(4).value(), 0.90);
    }

    #[test]
    fn band_is_capped() {
        let m = ConfidenceModel::default();
        assert_eq!(m.band(5).value(), 0.95);
        assert_eq!(m.band(18).value(), 0.95);
    }

    #[test]
    fn display_as_percent() {
        assert_eq!(ConfidenceModel::default().band(2).to_string(), "80%");
    }
}
