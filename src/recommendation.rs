//! Recommendation rules.
//!
//! Each rule is evaluated independently; every rule that matches appends one
//! message. Per-intervention messages come first, in catalog order, then the
//! impact-magnitude messages in a fixed order.

use serde::{Deserialize, Serialize};

use crate::catalog::InterventionCatalog;
use crate::engine::ImpactReport;
use crate::selection::InterventionSelection;

/// Message emitted when the AQI improvement is large.
pub const PRIORITIZE_MESSAGE: &str =
    "Significant AQI improvement expected - prioritize implementation";

/// Message emitted when many residents benefit.
pub const PHASED_ROLLOUT_MESSAGE: &str = "Large population benefit - consider phased rollout";

/// Message emitted when confidence is high.
pub const HIGH_CONFIDENCE_MESSAGE: &str = "High confidence in predicted outcomes";

/// Thresholds for the impact-magnitude messages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRules {
    /// `deltaAqi` must exceed this.
    pub delta_aqi: f64,
    /// `populationBenefiting` must exceed this.
    pub population_benefiting: f64,
    /// `confidenceBand` must exceed this.
    pub confidence: f64,
}

impl Default for RecommendationRules {
    fn default() -> Self {
        Self {
            delta_aqi: 30.0,
            population_benefiting: 5000.0,
            confidence: 0.8,
        }
    }
}

impl RecommendationRules {
    /// Produces the ordered recommendation list.
    #[must_use]
    pub fn generate(
        &self,
        catalog: &InterventionCatalog,
        selection: &InterventionSelection,
        impact: &ImpactReport,
    ) -> Vec<String> {
        let mut out: Vec<String> = catalog
            .iter()
            .filter_map(|spec| {
                let text = spec.recommendation.as_ref()?;
                (selection.weight(&spec.key) > spec.activation_threshold).then(|| text.clone())
            })
            .collect();

        if impact.delta_aqi > self.delta_aqi {
            out.push(PRIORITIZE_MESSAGE.to_string());
        }
        if impact.population_benefiting > self.population_benefiting {
            out.push(PHASED_ROLLOUT_MESSAGE.to_string());
        }
        if impact.confidence_band.value() > self.confidence {
            out.push(HIGH_CONFIDENCE_MESSAGE.to_string());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::ConfidenceModel;

    fn impact(delta_aqi: f64, population: f64, active: usize) -> ImpactReport {
        ImpactReport {
            delta_aqi,
            delta_pm25: 0.0,
            delta_no2: 0.0,
            population_benefiting: population,
            confidence_band: ConfidenceModel::default().band(active),
        }
    }

    #[test]
    fn thresholds_are_strict() {
        let catalog = InterventionCatalog::weighted();
        let sel = InterventionSelection::new()
            .with("trafficSignalRetiming", 0.5)
            .with("lowEmissionZone", 0.31);
        let recs = RecommendationRules::default().generate(&catalog, &sel, &impact(30.0, 5000.0, 2));
        assert_eq!(recs, ["Establish Low Emission Zone with vehicle restrictions"]);
    }

    #[test]
    fn interventions_precede_impact_messages() {
        let catalog = InterventionCatalog::weighted();
        let sel = InterventionSelection::new()
            .with("rerouting", 0.9)
            .with("trafficSignalRetiming", 0.9);
        let recs = RecommendationRules::default().generate(&catalog, &sel, &impact(45.0, 6000.0, 3));
        assert_eq!(
            recs,
            [
                "Implement adaptive traffic signal timing at key intersections",
                "Implement dynamic traffic management and alternative routing",
                PRIORITIZE_MESSAGE,
                PHASED_ROLLOUT_MESSAGE,
                HIGH_CONFIDENCE_MESSAGE,
            ]
        );
    }

    #[test]
    fn selection_catalog_has_only_impact_messages() {
        let catalog = InterventionCatalog::selection();
        let sel = InterventionSelection::new().with("banOpenBurning", true);
        let recs = RecommendationRules::default().generate(&catalog, &sel, &impact(40.0, 0.0, 1));
        assert_eq!(recs, [PRIORITIZE_MESSAGE]);
    }
}
