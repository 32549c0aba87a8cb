//! In-memory providers.
//!
//! Thread-safe, `RwLock`-backed implementations of the provider traits. They
//! are intended for tests, embedded usage, and as reference implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::alert::Alert;
use crate::baseline::BaselineState;
use crate::error::ProviderError;
use crate::provider::traits::{AlertRegistry, BaselineDataProvider};

fn lock_err(context: &'static str) -> ProviderError {
    ProviderError::Backend(format!("poisoned lock: {context}"))
}

/// Baselines held in a map keyed by zone id.
#[derive(Debug, Default)]
pub struct InMemoryBaselineProvider {
    zones: RwLock<HashMap<String, BaselineState>>,
}

impl InMemoryBaselineProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the baseline for a zone.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Backend` if the lock is poisoned.
    pub fn insert(
        &self,
        zone_id: impl Into<String>,
        baseline: BaselineState,
    ) -> Result<(), ProviderError> {
        let mut zones = self.zones.write().map_err(|_| lock_err("baseline.insert"))?;
        zones.insert(zone_id.into(), baseline);
        Ok(())
    }

    /// Number of zones held.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Backend` if the lock is poisoned.
    pub fn len(&self) -> Result<usize, ProviderError> {
        let zones = self.zones.read().map_err(|_| lock_err("baseline.len"))?;
        Ok(zones.len())
    }
}

impl BaselineDataProvider for InMemoryBaselineProvider {
    fn baseline(&self, zone_id: &str) -> Result<Option<BaselineState>, ProviderError> {
        let zones = self.zones.read().map_err(|_| lock_err("baseline.get"))?;
        Ok(zones.get(zone_id).cloned())
    }
}

/// Alerts held in memory, kept sorted worst first.
#[derive(Debug, Default)]
pub struct InMemoryAlertRegistry {
    alerts: RwLock<Vec<Alert>>,
}

impl InMemoryAlertRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertRegistry for InMemoryAlertRegistry {
    fn alerts(&self) -> Result<Vec<Alert>, ProviderError> {
        let alerts = self.alerts.read().map_err(|_| lock_err("alerts.list"))?;
        Ok(alerts.clone())
    }

    fn get(&self, zone_id: &str) -> Result<Option<Alert>, ProviderError> {
        let alerts = self.alerts.read().map_err(|_| lock_err("alerts.get"))?;
        Ok(alerts.iter().find(|a| a.zone_id == zone_id).cloned())
    }

    fn replace(&self, mut next: Vec<Alert>) -> Result<(), ProviderError> {
        next.sort_by(|a, b| b.aqi.total_cmp(&a.aqi));
        let mut alerts = self.alerts.write().map_err(|_| lock_err("alerts.replace"))?;
        debug!(previous = alerts.len(), current = next.len(), "replaced alert set");
        *alerts = next;
        Ok(())
    }
}

/// Derives baselines from alert records.
///
/// Only the alert's AQI and population are known, so the pollutant breakdown
/// is estimated with the fixed AQI conversion curve.
#[derive(Debug)]
pub struct AlertBaselineProvider<R: ?Sized> {
    registry: Arc<R>,
}

impl<R: AlertRegistry + ?Sized> AlertBaselineProvider<R> {
    /// Wraps a registry.
    #[must_use]
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }
}

impl<R: AlertRegistry + ?Sized> BaselineDataProvider for AlertBaselineProvider<R> {
    fn baseline(&self, zone_id: &str) -> Result<Option<BaselineState>, ProviderError> {
        Ok(self.registry.get(zone_id)?.map(|alert| BaselineState::from_alert(&alert)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::alert::{AlertSeverity, GeoPoint};
    use crate::pollutant::PollutantKind;

    fn alert(zone_id: &str, aqi: f64) -> Alert {
        Alert {
            zone_id: zone_id.to_string(),
            zone_name: zone_id.to_uppercase(),
            severity: AlertSeverity::High,
            aqi,
            top_pollutant: PollutantKind::Pm25,
            population_exposed: None,
            location: GeoPoint::new(17.385, 78.4867),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn baseline_provider_roundtrip() {
        let p = InMemoryBaselineProvider::new();
        p.insert("zone_001", BaselineState::new(220.0)).unwrap();
        assert_eq!(p.baseline("zone_001").unwrap().unwrap().aqi, 220.0);
        assert!(p.baseline("zone_404").unwrap().is_none());
        assert_eq!(p.len().unwrap(), 1);
    }

    #[test]
    fn require_baseline_reports_missing_zone() {
        let p = InMemoryBaselineProvider::new();
        let err = p.require_baseline("nowhere").unwrap_err();
        assert!(matches!(err, ProviderError::ZoneNotFound { zone_id } if zone_id == "nowhere"));
    }

    #[test]
    fn registry_keeps_alerts_sorted() {
        let r = InMemoryAlertRegistry::new();
        r.replace(vec![alert("a", 160.0), alert("b", 240.0)]).unwrap();
        let ids: Vec<_> = r.alerts().unwrap().into_iter().map(|a| a.zone_id).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(r.get("a").unwrap().unwrap().aqi, 160.0);
    }

    #[test]
    fn alert_provider_estimates_pollutants() {
        let registry = Arc::new(InMemoryAlertRegistry::new());
        registry.replace(vec![alert("zone_050", 50.0)]).unwrap();
        let provider = AlertBaselineProvider::new(registry);

        let baseline = provider.baseline("zone_050").unwrap().unwrap();
        assert_eq!(baseline.pollutants.pm25, Some(12.0));
        assert_eq!(baseline.population_exposed, Some(10_000.0));
        assert!(provider.baseline("missing").unwrap().is_none());
    }
}
