use std::sync::Arc;

use chrono::Utc;

use respire::pollutant::pm25_from_aqi;
use respire::recommendation::{HIGH_CONFIDENCE_MESSAGE, PHASED_ROLLOUT_MESSAGE, PRIORITIZE_MESSAGE};
use respire::{
    simulate, BaselineState, InterventionCatalog, InterventionSelection, Metric, Pollutants,
    SimulationEngine,
};

fn reference_baseline() -> BaselineState {
    BaselineState::new(220.0)
        .with_pollutants(Pollutants {
            pm25: Some(105.0),
            pm10: Some(150.0),
            no2: Some(55.0),
            o3: Some(30.0),
            ..Pollutants::default()
        })
        .with_population(12_000)
}

fn all_on(catalog: &InterventionCatalog) -> InterventionSelection {
    catalog.iter().map(|s| (s.key.clone(), 1.0)).collect()
}

#[test]
fn predicted_aqi_is_monotone_in_each_weight() {
    let engine = SimulationEngine::default();
    let baseline = reference_baseline();

    for spec in engine.catalog().iter() {
        let mut prev = f64::INFINITY;
        for step in 0..=20 {
            let w = f64::from(step) / 20.0;
            let sel = InterventionSelection::new()
                .with("lowEmissionZone", 0.7)
                .with(spec.key.clone(), w);
            let aqi = engine.simulate("zone_001", &baseline, &sel).predicted.aqi;
            assert!(aqi <= prev + 1e-12, "{} at {w}: {aqi} > {prev}", spec.key);
            prev = aqi;
        }
    }
}

#[test]
fn ceilings_hold_for_every_combination() {
    let engine = SimulationEngine::default();
    let baseline = reference_baseline();
    let keys: Vec<String> = engine.catalog().iter().map(|s| s.key.clone()).collect();
    let ceilings = *engine.catalog().ceilings();

    for mask in 0u32..(1 << keys.len()) {
        let sel: InterventionSelection = keys
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, k)| (k.clone(), 1.0))
            .collect();

        let factors = engine.factors(&sel);
        let result = engine.simulate("zone_001", &baseline, &sel);
        for metric in Metric::ALL {
            assert!(factors.get(metric) <= ceilings.get(metric));
            let floor = result.baseline.get(metric) * (1.0 - ceilings.get(metric));
            assert!(result.predicted.get(metric) >= floor - 1e-9);
        }
    }
}

#[test]
fn predictions_are_never_negative() {
    for catalog in [InterventionCatalog::weighted(), InterventionCatalog::selection()] {
        let sel = all_on(&catalog);
        let engine = SimulationEngine::new(Arc::new(catalog));
        let baseline = BaselineState::new(0.0).with_pollutants(Pollutants {
            pm25: Some(0.0),
            no2: Some(-4.0),
            ..Pollutants::default()
        });
        let result = engine.simulate("edge", &baseline, &sel);
        for metric in Metric::ALL {
            assert!(result.predicted.get(metric) >= 0.0);
        }
    }
}

#[test]
fn confidence_band_bounds_and_steps() {
    let engine = SimulationEngine::default();
    let keys: Vec<String> = engine.catalog().iter().map(|s| s.key.clone()).collect();

    let mut sel = InterventionSelection::new();
    let mut prev = engine.confidence_band(&sel).value();
    assert_eq!(prev, 0.70);

    for key in &keys {
        sel = sel.with(key.clone(), 0.5);
        let band = engine.confidence_band(&sel).value();
        assert!((0.70..=0.95).contains(&band));
        if prev < 0.95 {
            assert!((band - prev - 0.05).abs() < 1e-9, "{prev} -> {band}");
        } else {
            assert_eq!(band, 0.95);
        }
        prev = band;
    }

    // Zero weights and unknown keys do not count.
    let sel = InterventionSelection::new()
        .with("rerouting", 0.0)
        .with("cloudSeeding", 1.0);
    assert_eq!(engine.confidence_band(&sel).value(), 0.70);
}

#[test]
fn simulate_is_deterministic_apart_from_timestamp() {
    let engine = SimulationEngine::default();
    let sel = InterventionSelection::new()
        .with("greenBuffer", 0.9)
        .with("bikeLaneModalShift", 0.45);
    let a = engine.simulate("zone_001", &reference_baseline(), &sel);
    let b = engine.simulate("zone_001", &reference_baseline(), &sel);
    assert_eq!(a.predicted, b.predicted);
    assert_eq!(a.impact, b.impact);
    assert_eq!(a.recommendations, b.recommendations);

    let now = Utc::now();
    assert_eq!(
        engine.simulate_at("zone_001", &reference_baseline(), &sel, now),
        engine.simulate_at("zone_001", &reference_baseline(), &sel, now)
    );
}

#[test]
fn reference_scenario_round_trip() {
    let sel = InterventionSelection::new()
        .with("trafficSignalRetiming", 0.8)
        .with("lowEmissionZone", 0.6);
    let result = simulate("zone_001", &reference_baseline(), &sel);

    assert!((result.predicted.aqi - 160.6).abs() < 1e-9);
    assert!((result.impact.delta_aqi - 59.4).abs() < 1e-9);
    assert_eq!(result.impact.confidence_band.value(), 0.80);
    assert_eq!(result.baseline.pm25, 105.0);
    assert_eq!(result.interventions, sel);
    assert!(result.recommendations.contains(&PRIORITIZE_MESSAGE.to_string()));
    // 0.80 is not strictly above the 0.8 threshold.
    assert!(!result.recommendations.contains(&HIGH_CONFIDENCE_MESSAGE.to_string()));
    assert!(!result.recommendations.contains(&PHASED_ROLLOUT_MESSAGE.to_string()));
}

#[test]
fn empty_selection_leaves_baseline_untouched() {
    let engine = SimulationEngine::default();
    let result = engine.simulate("zone_001", &reference_baseline(), &InterventionSelection::new());

    assert_eq!(result.predicted, result.baseline);
    assert_eq!(result.impact.delta_aqi, 0.0);
    assert_eq!(result.impact.delta_pm25, 0.0);
    assert_eq!(result.impact.delta_no2, 0.0);
    assert_eq!(result.impact.population_benefiting, 0.0);
    assert_eq!(result.impact.confidence_band.value(), 0.70);

    let per_intervention: Vec<&str> = engine
        .catalog()
        .iter()
        .filter_map(|s| s.recommendation.as_deref())
        .collect();
    assert!(result
        .recommendations
        .iter()
        .all(|r| !per_intervention.contains(&r.as_str())));
}

#[test]
fn aqi_to_pm25_boundaries() {
    assert_eq!(pm25_from_aqi(0.0), 0.0);
    assert_eq!(pm25_from_aqi(50.0), 12.0);
    assert_eq!(pm25_from_aqi(100.0), 35.4);
    assert_eq!(BaselineState::from_aqi(100.0, None).snapshot().pm25, 35.4);
}

#[test]
fn selection_catalog_boolean_scenario() {
    let engine = SimulationEngine::new(Arc::new(InterventionCatalog::selection()));
    let sel = InterventionSelection::new()
        .with("banOpenBurning", true)
        .with("industrialEmissionControls", true)
        .with("publicAwareness", false);

    let factors = engine.factors(&sel);
    assert!((factors.get(Metric::Aqi) - 0.42).abs() < 1e-12);
    assert!((factors.get(Metric::Pm25) - 0.336).abs() < 1e-12);
    assert!((factors.get(Metric::No2) - 0.168).abs() < 1e-12);

    let result = engine.simulate("zone_001", &BaselineState::new(200.0), &sel);
    assert!((result.predicted.aqi - 116.0).abs() < 1e-9);
    assert_eq!(result.impact.confidence_band.value(), 0.80);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["interventions"]["banOpenBurning"], true);
    assert_eq!(json["interventions"]["publicAwareness"], false);
}

#[test]
fn out_of_range_weights_are_clamped_by_the_engine() {
    let engine = SimulationEngine::default();
    let over = InterventionSelection::new().with("lowEmissionZone", 3.0);
    let full = InterventionSelection::new().with("lowEmissionZone", 1.0);
    let under = InterventionSelection::new().with("lowEmissionZone", -2.0);

    assert_eq!(engine.factors(&over), engine.factors(&full));
    assert_eq!(engine.factors(&under), engine.factors(&InterventionSelection::new()));
}
