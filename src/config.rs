//! Runtime configuration.
//!
//! `RespireConfig::default()` reproduces the stock behaviour. `from_env`
//! overrides fields from `RESPIRE_*` environment variables and rejects
//! malformed values instead of silently falling back.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::alert::{compute_alerts, Alert, AlertThresholds, StationReading};
use crate::broadcast::{Broadcaster, BroadcasterConfig, DEFAULT_BROADCAST_CAPACITY};
use crate::catalog::{CatalogVariant, InterventionCatalog};
use crate::engine::SimulationEngine;
use crate::error::{CatalogError, ConfigError, ProviderError, RespireResult};
use crate::jitter::{Jitter, DEFAULT_AMPLITUDE, MAX_AMPLITUDE};
use crate::provider::{AlertRegistry, BaselineDataProvider};
use crate::transport::{SimulationService, DEFAULT_MAX_REQUEST_BYTES};

/// Service configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RespireConfig {
    /// AQI at or above which an alert is HIGH.
    pub high_priority_aqi: f64,
    /// AQI at or above which an alert is raised.
    pub medium_priority_aqi: f64,
    /// Built-in catalog used when no path is given.
    pub catalog: CatalogVariant,
    /// JSON catalog file overriding the built-in.
    pub catalog_path: Option<PathBuf>,
    /// Enables presentation jitter with this seed.
    pub jitter_seed: Option<u64>,
    /// Jitter amplitude, clamped to `[0, 0.2]`.
    pub jitter_amplitude: f64,
    /// Largest accepted request body.
    pub max_request_bytes: usize,
    /// Per-subscriber dashboard buffer.
    pub broadcast_capacity: usize,
}

impl Default for RespireConfig {
    fn default() -> Self {
        let thresholds = AlertThresholds::default();
        Self {
            high_priority_aqi: thresholds.high,
            medium_priority_aqi: thresholds.medium,
            catalog: CatalogVariant::default(),
            catalog_path: None,
            jitter_seed: None,
            jitter_amplitude: DEFAULT_AMPLITUDE,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

impl RespireConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparsable values or inverted thresholds.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparsable values or inverted thresholds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = parse_var(&lookup, "RESPIRE_HIGH_PRIORITY_AQI")? {
            cfg.high_priority_aqi = finite("RESPIRE_HIGH_PRIORITY_AQI", v)?;
        }
        if let Some(v) = parse_var(&lookup, "RESPIRE_MEDIUM_PRIORITY_AQI")? {
            cfg.medium_priority_aqi = finite("RESPIRE_MEDIUM_PRIORITY_AQI", v)?;
        }
        if let Some(raw) = lookup("RESPIRE_CATALOG") {
            cfg.catalog = raw.parse().map_err(|e: CatalogError| ConfigError::InvalidVar {
                key: "RESPIRE_CATALOG".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }
        if let Some(raw) = lookup("RESPIRE_CATALOG_PATH") {
            if !raw.trim().is_empty() {
                cfg.catalog_path = Some(PathBuf::from(raw));
            }
        }
        cfg.jitter_seed = parse_var(&lookup, "RESPIRE_JITTER_SEED")?;
        let amplitude: Option<f64> = parse_var(&lookup, "RESPIRE_JITTER_AMPLITUDE")?;
        if let Some(v) = amplitude {
            cfg.jitter_amplitude = finite("RESPIRE_JITTER_AMPLITUDE", v)?.clamp(0.0, MAX_AMPLITUDE);
        }
        if let Some(v) = parse_var(&lookup, "RESPIRE_MAX_REQUEST_BYTES")? {
            cfg.max_request_bytes = v;
        }
        if let Some(v) = parse_var(&lookup, "RESPIRE_BROADCAST_CAPACITY")? {
            cfg.broadcast_capacity = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ThresholdOrder` if medium exceeds high.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.medium_priority_aqi > self.high_priority_aqi {
            return Err(ConfigError::ThresholdOrder {
                medium: self.medium_priority_aqi,
                high: self.high_priority_aqi,
            });
        }
        Ok(())
    }

    /// Alert thresholds.
    #[must_use]
    pub fn alert_thresholds(&self) -> AlertThresholds {
        AlertThresholds {
            high: self.high_priority_aqi,
            medium: self.medium_priority_aqi,
        }
    }

    /// Computes alerts for `readings` with the configured thresholds.
    #[must_use]
    pub fn compute_alerts(&self, readings: &[StationReading]) -> Vec<Alert> {
        compute_alerts(readings, &self.alert_thresholds())
    }

    /// Recomputes alerts for `readings` and installs them in `registry`.
    ///
    /// Returns the number of alerts installed.
    ///
    /// # Errors
    ///
    /// Returns the registry's error if the alert set cannot be replaced.
    pub fn refresh_alerts(
        &self,
        registry: &dyn AlertRegistry,
        readings: &[StationReading],
    ) -> Result<usize, ProviderError> {
        let alerts = self.compute_alerts(readings);
        let count = alerts.len();
        registry.replace(alerts)?;
        info!(
            readings = readings.len(),
            alerts = count,
            high = self.high_priority_aqi,
            medium = self.medium_priority_aqi,
            "alerts refreshed"
        );
        Ok(count)
    }

    /// Jitter, if a seed is configured.
    #[must_use]
    pub fn jitter(&self) -> Option<Jitter> {
        self.jitter_seed.map(|seed| Jitter::new(seed, self.jitter_amplitude))
    }

    /// Loads the configured catalog.
    ///
    /// # Errors
    ///
    /// Returns a catalog error if the catalog file cannot be loaded.
    pub fn catalog(&self) -> Result<InterventionCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => InterventionCatalog::from_path(path),
            None => Ok(self.catalog.build()),
        }
    }

    /// Builds an engine over the configured catalog.
    ///
    /// # Errors
    ///
    /// Returns a catalog error if the catalog file cannot be loaded.
    pub fn build_engine(&self) -> RespireResult<SimulationEngine> {
        Ok(SimulationEngine::new(Arc::new(self.catalog()?)))
    }

    /// Builds a dashboard broadcaster.
    #[must_use]
    pub fn build_broadcaster(&self) -> Broadcaster {
        Broadcaster::new(BroadcasterConfig {
            capacity: self.broadcast_capacity,
        })
    }

    /// Builds a service with the configured engine, limits and jitter.
    ///
    /// # Errors
    ///
    /// Returns a catalog error if the catalog file cannot be loaded.
    pub fn build_service(
        &self,
        provider: Arc<dyn BaselineDataProvider>,
    ) -> RespireResult<SimulationService> {
        let engine = self.build_engine()?;
        info!(
            catalog = %engine.catalog().name(),
            interventions = engine.catalog().len(),
            jitter = self.jitter_seed.is_some(),
            "simulation service configured"
        );

        let mut service = SimulationService::new(Arc::new(engine), provider)
            .with_max_request_bytes(self.max_request_bytes);
        if let Some(jitter) = self.jitter() {
            service = service.with_jitter(jitter);
        }
        Ok(service)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidVar {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

fn finite(key: &str, v: f64) -> Result<f64, ConfigError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(ConfigError::InvalidVar {
            key: key.to_string(),
            value: v.to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        })
    }
}
