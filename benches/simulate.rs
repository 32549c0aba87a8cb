use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use respire::{
    BaselineState, InMemoryBaselineProvider, InterventionCatalog, InterventionSelection,
    Pollutants, SimulationEngine, SimulationService,
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

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(1));

    let weighted = SimulationEngine::default();
    let sel = InterventionSelection::new()
        .with("trafficSignalRetiming", 0.8)
        .with("lowEmissionZone", 0.6)
        .with("greenBuffer", 0.3);
    let baseline = reference_baseline();
    group.bench_function("simulate_weighted", |b| {
        b.iter(|| weighted.simulate(black_box("zone_001"), black_box(&baseline), black_box(&sel)));
    });

    let catalog = InterventionCatalog::selection();
    let all: InterventionSelection = catalog.iter().map(|s| (s.key.clone(), true)).collect();
    let selection = SimulationEngine::new(Arc::new(catalog));
    group.bench_function("simulate_selection_all", |b| {
        b.iter(|| selection.simulate(black_box("zone_001"), black_box(&baseline), black_box(&all)));
    });

    group.finish();
}

fn bench_service(c: &mut Criterion) {
    let provider = InMemoryBaselineProvider::new();
    provider.insert("zone_001", reference_baseline()).unwrap();
    let svc = SimulationService::new(Arc::new(SimulationEngine::default()), Arc::new(provider));
    let body = br#"{"zoneId":"zone_001","interventions":{"trafficSignalRetiming":0.8,"lowEmissionZone":0.6}}"#;

    c.bench_function("service_handle_json", |b| {
        b.iter(|| svc.handle_json(black_box(body)).unwrap());
    });
}

criterion_group!(benches, bench_engine, bench_service);
criterion_main!(benches);
