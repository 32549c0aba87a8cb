//! Impact simulation engine.
//!
//! The engine maps `{baseline, intervention selection}` to a predicted state,
//! an impact report, a confidence band, and recommendations. It is a pure,
//! synchronous computation: no I/O, no logging, no shared mutable state. A
//! single `SimulationEngine` can be shared across threads and called
//! concurrently.
//!
//! Composition is additive and saturating: each selected intervention adds
//! `weight × coefficient` to every metric's reduction factor, and the sum is
//! truncated at the catalog's per-metric ceiling.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::{BaselineState, MetricSnapshot, PredictedState};
use crate::catalog::InterventionCatalog;
use crate::confidence::{ConfidenceBand, ConfidenceModel};
use crate::metric::{Metric, MetricTable};
use crate::recommendation::RecommendationRules;
use crate::selection::InterventionSelection;

/// Aggregate, ceiling-clamped reduction fraction per metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactFactors(MetricTable);

impl ImpactFactors {
    /// Sums every selected intervention's contribution and applies ceilings.
    #[must_use]
    pub fn compose(catalog: &InterventionCatalog, selection: &InterventionSelection) -> Self {
        let mut acc = MetricTable::ZERO;
        for spec in catalog.iter() {
            let weight = selection.weight(&spec.key);
            if weight > 0.0 {
                acc.add_scaled(&spec.coefficients, weight);
            }
        }
        Self(acc.min(catalog.ceilings()))
    }

    /// Factor for `metric`.
    #[must_use]
    pub const fn get(&self, metric: Metric) -> f64 {
        self.0.get(metric)
    }

    /// All factors.
    #[must_use]
    pub const fn as_table(&self) -> &MetricTable {
        &self.0
    }

    /// Applies the factors to a baseline snapshot.
    #[must_use]
    pub fn apply(&self, baseline: &MetricSnapshot) -> PredictedState {
        MetricSnapshot::from_fn(|m| (baseline.get(m) * (1.0 - self.get(m))).max(0.0))
    }
}

/// Quantified improvement. Positive deltas mean improvement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Baseline AQI minus predicted AQI.
    pub delta_aqi: f64,
    /// Baseline PM2.5 minus predicted PM2.5.
    pub delta_pm25: f64,
    /// Baseline NO2 minus predicted NO2.
    pub delta_no2: f64,
    /// Reduction in exposed population.
    pub population_benefiting: f64,
    /// Heuristic confidence.
    pub confidence_band: ConfidenceBand,
}

impl ImpactReport {
    /// Computes deltas between two snapshots.
    #[must_use]
    pub fn between(
        baseline: &MetricSnapshot,
        predicted: &PredictedState,
        confidence_band: ConfidenceBand,
    ) -> Self {
        Self {
            delta_aqi: baseline.aqi - predicted.aqi,
            delta_pm25: baseline.pm25 - predicted.pm25,
            delta_no2: baseline.no2 - predicted.no2,
            population_benefiting: baseline.population_exposed - predicted.population_exposed,
            confidence_band,
        }
    }
}

/// Output of one simulation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Zone the simulation was run for.
    pub zone_id: String,
    /// Resolved baseline (after placeholders and clamping).
    pub baseline: MetricSnapshot,
    /// Predicted post-intervention state.
    pub predicted: PredictedState,
    /// Deltas and confidence.
    pub impact: ImpactReport,
    /// Ordered recommendation messages.
    pub recommendations: Vec<String>,
    /// Echo of the caller's selection.
    pub interventions: InterventionSelection,
    /// Wall-clock time of computation.
    pub timestamp: DateTime<Utc>,
}

/// Stateless simulation engine bound to one catalog.
#[derive(Debug, Clone)]
pub struct SimulationEngine {
    catalog: Arc<InterventionCatalog>,
    confidence: ConfidenceModel,
    rules: RecommendationRules,
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(Arc::new(InterventionCatalog::weighted()))
    }
}

impl SimulationEngine {
    /// Creates an engine with default confidence and recommendation rules.
    #[must_use]
    pub fn new(catalog: Arc<InterventionCatalog>) -> Self {
        Self {
            catalog,
            confidence: ConfidenceModel::default(),
            rules: RecommendationRules::default(),
        }
    }

    /// Replaces the confidence model.
    #[must_use]
    pub fn with_confidence(mut self, confidence: ConfidenceModel) -> Self {
        self.confidence = confidence;
        self
    }

    /// Replaces the recommendation thresholds.
    #[must_use]
    pub fn with_rules(mut self, rules: RecommendationRules) -> Self {
        self.rules = rules;
        self
    }

    /// The catalog this engine simulates against.
    #[must_use]
    pub fn catalog(&self) -> &InterventionCatalog {
        &self.catalog
    }

    /// The recommendation thresholds.
    #[must_use]
    pub const fn rules(&self) -> &RecommendationRules {
        &self.rules
    }

    /// Composed impact factors for a selection.
    #[must_use]
    pub fn factors(&self, selection: &InterventionSelection) -> ImpactFactors {
        ImpactFactors::compose(&self.catalog, selection)
    }

    /// Confidence band for a selection.
    #[must_use]
    pub fn confidence_band(&self, selection: &InterventionSelection) -> ConfidenceBand {
        self.confidence.band(selection.active_count(&self.catalog))
    }

    /// Runs a simulation stamped with the current time.
    #[must_use]
    pub fn simulate(
        &self,
        zone_id: impl Into<String>,
        baseline: &BaselineState,
        interventions: &InterventionSelection,
    ) -> SimulationResult {
        self.simulate_at(zone_id, baseline, interventions, Utc::now())
    }

    /// Runs a simulation with an explicit timestamp.
    ///
    /// Everything except `timestamp` is a deterministic function of the inputs.
    #[must_use]
    pub fn simulate_at(
        &self,
        zone_id: impl Into<String>,
        baseline: &BaselineState,
        interventions: &InterventionSelection,
        timestamp: DateTime<Utc>,
    ) -> SimulationResult {
        let snapshot = baseline.snapshot();
        let predicted = self.factors(interventions).apply(&snapshot);
        let impact = ImpactReport::between(&snapshot, &predicted, self.confidence_band(interventions));
        let recommendations = self.rules.generate(&self.catalog, interventions, &impact);

        SimulationResult {
            zone_id: zone_id.into(),
            baseline: snapshot,
            predicted,
            impact,
            recommendations,
            interventions: interventions.clone(),
            timestamp,
        }
    }
}

static DEFAULT_ENGINE: OnceLock<SimulationEngine> = OnceLock::new();

/// Simulates against the canonical weighted catalog.
#[must_use]
pub fn simulate(
    zone_id: impl Into<String>,
    baseline: &BaselineState,
    interventions: &InterventionSelection,
) -> SimulationResult {
    DEFAULT_ENGINE
        .get_or_init(SimulationEngine::default)
        .simulate(zone_id, baseline, interventions)
}
