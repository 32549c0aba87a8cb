//! Seedable presentation noise.
//!
//! Dashboards sometimes want predictions that do not look identical from zone
//! to zone. `Jitter` perturbs a finished [`SimulationResult`] at the transport
//! boundary; the engine itself stays deterministic.
//!
//! The perturbation for a metric is a multiplicative factor in
//! `[1 - amplitude, 1 + amplitude]` derived from `blake3(seed, zone, metric)`,
//! so the same seed and inputs always produce the same output. The factor
//! scales the composed *reduction*, not the predicted value: an empty
//! selection stays an identity and catalog ceilings still bound the result.

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::engine::{ImpactReport, SimulationEngine, SimulationResult};
use crate::metric::Metric;

/// Largest accepted amplitude.
pub const MAX_AMPLITUDE: f64 = 0.2;

/// Default amplitude when jitter is enabled.
pub const DEFAULT_AMPLITUDE: f64 = 0.05;

/// Deterministic multiplicative noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jitter {
    seed: u64,
    amplitude: f64,
}

impl Jitter {
    /// Creates a jitter source. `amplitude` is clamped to `[0, MAX_AMPLITUDE]`.
    #[must_use]
    pub fn new(seed: u64, amplitude: f64) -> Self {
        let amplitude = if amplitude.is_finite() {
            amplitude.clamp(0.0, MAX_AMPLITUDE)
        } else {
            0.0
        };
        Self { seed, amplitude }
    }

    /// The seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// The effective amplitude.
    #[must_use]
    pub const fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Multiplicative factor for one metric of one zone.
    #[must_use]
    pub fn factor(&self, zone_id: &str, metric: Metric) -> f64 {
        if self.amplitude == 0.0 {
            return 1.0;
        }

        let mut h = Hasher::new();
        h.update(&self.seed.to_le_bytes());
        h.update(zone_id.as_bytes());
        h.update(&[0]);
        h.update(metric.as_str().as_bytes());
        let hash = h.finalize();

        let mut word = [0u8; 8];
        word.copy_from_slice(&hash.as_bytes()[..8]);
        // 53 high bits give a uniform value in [0, 1).
        #[allow(clippy::cast_precision_loss)]
        let unit = (u64::from_le_bytes(word) >> 11) as f64 / (1u64 << 53) as f64;

        1.0 + self.amplitude * (2.0 * unit - 1.0)
    }

    /// Returns a copy of `result` with perturbed predictions.
    ///
    /// The AQI, PM2.5 and NO2 reduction factors of `result`'s selection are
    /// scaled and re-clamped to `engine`'s catalog ceilings; the exposed
    /// population is left as computed. Deltas and recommendations are
    /// recomputed from the perturbed prediction, the confidence band is kept.
    #[must_use]
    pub fn apply(&self, engine: &SimulationEngine, result: &SimulationResult) -> SimulationResult {
        let mut out = result.clone();
        if self.amplitude == 0.0 {
            return out;
        }

        let factors = engine.factors(&result.interventions);
        let ceilings = engine.catalog().ceilings();
        for metric in [Metric::Aqi, Metric::Pm25, Metric::No2] {
            let scaled = (factors.get(metric) * self.factor(&result.zone_id, metric))
                .clamp(0.0, ceilings.get(metric));
            let value = (result.baseline.get(metric) * (1.0 - scaled)).max(0.0);
            match metric {
                Metric::Aqi => out.predicted.aqi = value,
                Metric::Pm25 => out.predicted.pm25 = value,
                Metric::No2 => out.predicted.no2 = value,
                Metric::Population => {}
            }
        }

        out.impact = ImpactReport::between(&out.baseline, &out.predicted, result.impact.confidence_band);
        out.recommendations = engine
            .rules()
            .generate(engine.catalog(), &out.interventions, &out.impact);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::BaselineState;
    use crate::recommendation::PRIORITIZE_MESSAGE;
    use crate::selection::InterventionSelection;

    fn engine() -> SimulationEngine {
        SimulationEngine::default()
    }

    fn result() -> SimulationResult {
        let sel = InterventionSelection::new()
            .with("trafficSignalRetiming", 0.8)
            .with("lowEmissionZone", 0.6);
        engine().simulate("zone_001", &BaselineState::new(220.0), &sel)
    }

    #[test]
    fn amplitude_is_clamped() {
        assert_eq!(Jitter::new(1, 0.9).amplitude(), MAX_AMPLITUDE);
        assert_eq!(Jitter::new(1, -0.1).amplitude(), 0.0);
        assert_eq!(Jitter::new(1, f64::NAN).amplitude(), 0.0);
    }

    #[test]
    fn factor_is_bounded_and_reproducible() {
        let j = Jitter::new(42, 0.1);
        for zone in ["zone_001", "zone_002", "cpcb_017"] {
            for metric in Metric::ALL {
                let f = j.factor(zone, metric);
                assert!((0.9..=1.1).contains(&f), "{f}");
                assert_eq!(f, Jitter::new(42, 0.1).factor(zone, metric));
            }
        }
    }

    #[test]
    fn zero_amplitude_is_identity() {
        let r = result();
        assert_eq!(Jitter::new(7, 0.0).apply(&engine(), &r), r);
    }

    #[test]
    fn apply_recomputes_deltas() {
        let e = engine();
        let r = result();
        let j = Jitter::new(7, 0.2).apply(&e, &r);
        assert_eq!(j.baseline, r.baseline);
        assert!((j.impact.delta_aqi - (j.baseline.aqi - j.predicted.aqi)).abs() < 1e-12);
        assert!(j.predicted.aqi <= j.baseline.aqi);
        assert_eq!(j.predicted.population_exposed, r.predicted.population_exposed);
        assert_eq!(j.impact.confidence_band, r.impact.confidence_band);
        assert_eq!(j, Jitter::new(7, 0.2).apply(&e, &r));
    }

    #[test]
    fn empty_selection_stays_unchanged() {
        let e = engine();
        let r = e.simulate("zone_001", &BaselineState::new(220.0), &InterventionSelection::new());
        for seed in 0..32 {
            let j = Jitter::new(seed, MAX_AMPLITUDE).apply(&e, &r);
            assert_eq!(j.predicted, j.baseline);
            assert_eq!(j.impact.delta_aqi, 0.0);
            assert_eq!(j.impact.delta_pm25, 0.0);
            assert_eq!(j.impact.delta_no2, 0.0);
            assert!(j.recommendations.is_empty());
        }
    }

    #[test]
    fn ceilings_bound_jittered_predictions() {
        let e = engine();
        let all: InterventionSelection = e.catalog().iter().map(|s| (s.key.clone(), 1.0)).collect();
        let r = e.simulate("zone_001", &BaselineState::new(220.0), &all);
        let ceilings = *e.catalog().ceilings();
        for seed in 0..32 {
            let j = Jitter::new(seed, MAX_AMPLITUDE).apply(&e, &r);
            for metric in [Metric::Aqi, Metric::Pm25, Metric::No2] {
                let floor = j.baseline.get(metric) * (1.0 - ceilings.get(metric));
                assert!(j.predicted.get(metric) >= floor - 1e-9, "seed {seed} {metric}");
                assert!(j.predicted.get(metric) <= j.baseline.get(metric));
            }
        }
    }

    #[test]
    fn recommendations_follow_jittered_impact() {
        let e = engine();
        // AQI factor 0.1375 puts the unjittered delta just above 30.
        let sel = InterventionSelection::new().with("lowEmissionZone", 0.55);
        let r = e.simulate("zone_001", &BaselineState::new(220.0), &sel);
        assert!(r.impact.delta_aqi > 30.0);

        for seed in 0..64 {
            let j = Jitter::new(seed, MAX_AMPLITUDE).apply(&e, &r);
            let prioritized = j.recommendations.iter().any(|m| m == PRIORITIZE_MESSAGE);
            assert_eq!(prioritized, j.impact.delta_aqi > 30.0, "seed {seed}");
            assert_eq!(
                j.recommendations,
                e.rules().generate(e.catalog(), &sel, &j.impact)
            );
        }
    }
}
