//! JSON transport boundary.
//!
//! The engine trusts its inputs; this layer does not. Requests arrive as JSON
//! bytes, are size-checked and validated, resolved against the injected
//! baseline provider when they carry no baseline, run through the engine,
//! optionally jittered, published to the dashboard broadcaster, and encoded
//! back to JSON. Failures map to an HTTP-style `ErrorResponse`.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::baseline::BaselineState;
use crate::broadcast::{Broadcaster, DashboardEvent, EventKind};
use crate::engine::{SimulationEngine, SimulationResult};
use crate::error::{ProviderError, RespireError, RespireResult, ValidationError};
use crate::jitter::Jitter;
use crate::pollutant::AqiCategory;
use crate::provider::BaselineDataProvider;
use crate::selection::InterventionSelection;

/// Default maximum size of a request payload.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Maximum size of a response payload.
const MAX_RESPONSE_JSON_BYTES: usize = 1024 * 1024;

fn zone_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:-]{1,128}$").ok())
        .as_ref()
}

/// A validated simulation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Zone to simulate.
    pub zone_id: String,
    /// Explicit baseline; when absent the provider is consulted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineState>,
    /// Selected interventions.
    #[serde(default)]
    pub interventions: InterventionSelection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    zone_id: Option<String>,
    #[serde(default)]
    baseline: Option<BaselineState>,
    #[serde(default)]
    interventions: InterventionSelection,
}

impl SimulationRequest {
    /// Checks zone id, weights and baseline numbers.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_zone_id(&self.zone_id)?;

        for (key, weight) in self.interventions.iter() {
            let value = weight.raw();
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::WeightOutOfRange {
                    key: key.to_string(),
                    value,
                });
            }
        }

        if let Some(baseline) = &self.baseline {
            validate_number("baseline.aqi", baseline.aqi)?;
            for (name, value) in baseline.pollutants.present() {
                validate_number(&format!("baseline.pollutants.{name}"), value)?;
            }
            if let Some(population) = baseline.population_exposed {
                validate_number("baseline.populationExposed", population)?;
            }
        }

        Ok(())
    }
}

fn validate_zone_id(zone_id: &str) -> Result<(), ValidationError> {
    if zone_id_pattern().is_some_and(|re| re.is_match(zone_id)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidZoneId {
            zone_id: zone_id.chars().take(128).collect(),
        })
    }
}

fn validate_number(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            value,
        })
    }
}

/// Parses and validates a request payload.
///
/// # Errors
///
/// Returns a `ValidationError` for oversized, malformed or out-of-range input.
pub fn parse_request(bytes: &[u8], max_bytes: usize) -> Result<SimulationRequest, ValidationError> {
    if bytes.len() > max_bytes {
        return Err(ValidationError::PayloadTooLarge {
            actual: bytes.len(),
            max: max_bytes,
        });
    }

    let raw: RawRequest = serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedJson {
        message: e.to_string(),
    })?;

    let zone_id = raw.zone_id.ok_or_else(|| ValidationError::MissingField {
        field: "zoneId".to_string(),
    })?;

    let request = SimulationRequest {
        zone_id,
        baseline: raw.baseline,
        interventions: raw.interventions,
    };
    request.validate()?;
    Ok(request)
}

/// Serializes a response body.
///
/// # Errors
///
/// Returns an internal error if serialization fails or the body is too large.
pub fn encode_json<T: Serialize>(value: &T) -> RespireResult<Vec<u8>> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| RespireError::internal(format!("failed to serialize response JSON: {e}")))?;
    if bytes.len() > MAX_RESPONSE_JSON_BYTES {
        return Err(RespireError::internal("serialized JSON exceeds size limit"));
    }
    Ok(bytes)
}

/// Error body returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: u16,
    /// Short error summary.
    pub error: String,
    /// Detail message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Maps an error to its client-facing body.
#[must_use]
pub fn error_response(err: &RespireError) -> ErrorResponse {
    let (status, error) = match err {
        RespireError::Validation(_) => (400, "Invalid request"),
        RespireError::Provider(ProviderError::ZoneNotFound { .. }) => (404, "Zone not found"),
        RespireError::Provider(_)
        | RespireError::Catalog(_)
        | RespireError::Config(_)
        | RespireError::Channel(_)
        | RespireError::Internal { .. } => (500, "Internal server error"),
    };

    ErrorResponse {
        status,
        error: error.to_string(),
        details: Some(err.to_string()),
    }
}

/// Baseline view returned by `baseline_json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineView {
    /// Zone id.
    pub zone_id: String,
    /// Baseline as stored.
    #[serde(flatten)]
    pub baseline: BaselineState,
    /// Health category of the baseline AQI.
    pub category: AqiCategory,
}

/// Request handler wiring the engine to its collaborators.
pub struct SimulationService {
    engine: Arc<SimulationEngine>,
    provider: Arc<dyn BaselineDataProvider>,
    jitter: Option<Jitter>,
    broadcaster: Option<Arc<Broadcaster>>,
    max_request_bytes: usize,
}

impl std::fmt::Debug for SimulationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationService")
            .field("catalog", &self.engine.catalog().name())
            .field("jitter", &self.jitter)
            .field("broadcaster", &self.broadcaster.is_some())
            .field("max_request_bytes", &self.max_request_bytes)
            .finish_non_exhaustive()
    }
}

impl SimulationService {
    /// Creates a service without jitter or broadcasting.
    #[must_use]
    pub fn new(engine: Arc<SimulationEngine>, provider: Arc<dyn BaselineDataProvider>) -> Self {
        Self {
            engine,
            provider,
            jitter: None,
            broadcaster: None,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }

    /// Enables presentation jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Publishes every result to `broadcaster`.
    #[must_use]
    pub fn with_broadcaster(mut self, broadcaster: Arc<Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Overrides the request size limit.
    #[must_use]
    pub fn with_max_request_bytes(mut self, max: usize) -> Self {
        self.max_request_bytes = max;
        self
    }

    /// The engine in use.
    #[must_use]
    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    fn resolve_baseline(&self, request: &SimulationRequest) -> RespireResult<BaselineState> {
        if let Some(baseline) = &request.baseline {
            return Ok(baseline.clone());
        }
        debug!(zone_id = %request.zone_id, "resolving baseline from provider");
        Ok(self.provider.require_baseline(&request.zone_id)?)
    }

    /// Runs an already-validated request.
    ///
    /// # Errors
    ///
    /// Returns a provider error when no baseline is available for the zone.
    pub fn run(&self, request: &SimulationRequest) -> RespireResult<SimulationResult> {
        let baseline = self.resolve_baseline(request)?;
        let mut result = self
            .engine
            .simulate(request.zone_id.clone(), &baseline, &request.interventions);
        if let Some(jitter) = &self.jitter {
            result = jitter.apply(&self.engine, &result);
        }

        let unknown = request.interventions.unknown_keys(self.engine.catalog()).count();
        info!(
            zone_id = %result.zone_id,
            interventions = request.interventions.len(),
            unknown,
            delta_aqi = result.impact.delta_aqi,
            "simulation completed"
        );

        if let Some(broadcaster) = &self.broadcaster {
            match serde_json::to_value(&result) {
                Ok(data) => {
                    broadcaster.publish(&DashboardEvent::new(EventKind::SimulationResult, data));
                }
                Err(e) => warn!(error = %e, "failed to encode simulation result event"),
            }
        }

        Ok(result)
    }

    /// Handles a JSON request body and returns the JSON result body.
    ///
    /// # Errors
    ///
    /// Returns validation, provider or internal errors; see [`error_response`].
    pub fn handle_json(&self, body: &[u8]) -> RespireResult<Vec<u8>> {
        let request = parse_request(body, self.max_request_bytes).map_err(|e| {
            warn!(error = %e, "rejected simulation request");
            e
        })?;
        let result = self.run(&request)?;
        encode_json(&result)
    }

    /// Returns the baseline the service would use for `zone_id`, as JSON.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed zone id and a not-found
    /// error for an unknown zone.
    pub fn baseline_json(&self, zone_id: &str) -> RespireResult<Vec<u8>> {
        validate_zone_id(zone_id)?;
        let baseline = self.provider.require_baseline(zone_id)?;
        encode_json(&BaselineView {
            zone_id: zone_id.to_string(),
            category: AqiCategory::from_aqi(baseline.aqi),
            baseline,
        })
    }
}
