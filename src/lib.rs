//! # Respire - Air-Quality Intervention Impact Simulation
//!
//! Respire estimates how a set of urban interventions (low-emission zones,
//! signal retiming, green buffers, ...) would change a zone's air-quality
//! metrics. Given a baseline and a weighted selection of interventions it
//! returns a predicted state, the improvement deltas, a heuristic confidence
//! band and recommendation messages.
//!
//! ## Core Concepts
//!
//! - **Baseline**: a zone's current AQI, pollutant concentrations and exposed population
//! - **Catalog**: the closed set of interventions with per-metric reduction coefficients and ceilings
//! - **Selection**: intervention key → weight in `[0, 1]` (or an on/off flag)
//! - **Engine**: pure, deterministic mapping from baseline + selection to a `SimulationResult`
//!
//! Around the engine sit the edges: alert computation, baseline providers,
//! a validating JSON transport with optional seeded jitter, and a dashboard
//! event broadcaster.
//!
//! ## Usage
//!
//! ```rust
//! use respire::{simulate, BaselineState, InterventionSelection};
//!
//! let baseline = BaselineState::new(220.0);
//! let selection = InterventionSelection::new()
//!     .with("trafficSignalRetiming", 0.8)
//!     .with("lowEmissionZone", 0.6);
//!
//! let result = simulate("zone_001", &baseline, &selection);
//! assert!((result.predicted.aqi - 160.6).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core model
pub mod baseline;
pub mod catalog;
pub mod confidence;
pub mod error;
pub mod metric;
pub mod pollutant;
pub mod recommendation;
pub mod selection;

// Simulation
pub mod engine;

// Edges
pub mod alert;
pub mod broadcast;
pub mod config;
pub mod jitter;
pub mod provider;
pub mod transport;

// Re-export primary types at crate root for convenience
pub use alert::{compute_alerts, Alert, AlertSeverity, AlertThresholds, GeoPoint, StationReading};
pub use baseline::{BaselineState, MetricSnapshot, Pollutants, PredictedState};
pub use catalog::{CatalogVariant, InterventionCatalog, InterventionSpec};
pub use confidence::{ConfidenceBand, ConfidenceModel};
pub use engine::{simulate, ImpactFactors, ImpactReport, SimulationEngine, SimulationResult};
pub use error::{
    CatalogError, ChannelError, ConfigError, ProviderError, RespireError, RespireResult,
    ValidationError,
};
pub use metric::{Metric, MetricTable};
pub use pollutant::{AqiCategory, PollutantKind};
pub use recommendation::RecommendationRules;
pub use selection::{InterventionSelection, InterventionWeight};

// Edge re-exports
pub use broadcast::{Broadcaster, BroadcasterConfig, DashboardEvent, EventKind, Subscription};
pub use config::RespireConfig;
pub use jitter::Jitter;
pub use provider::{
    AlertBaselineProvider, AlertRegistry, BaselineDataProvider, InMemoryAlertRegistry,
    InMemoryBaselineProvider,
};
pub use transport::{error_response, ErrorResponse, SimulationRequest, SimulationService};
