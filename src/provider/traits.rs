//! Provider traits.

use crate::alert::Alert;
use crate::baseline::BaselineState;
use crate::error::ProviderError;

/// Supplies the baseline state for a zone.
///
/// Implementations must be safe to share across threads.
pub trait BaselineDataProvider: Send + Sync {
    /// Returns the baseline for `zone_id`, or `None` if the zone is unknown.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the backing source fails.
    fn baseline(&self, zone_id: &str) -> Result<Option<BaselineState>, ProviderError>;

    /// Like [`baseline`](Self::baseline), but an unknown zone is an error.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::ZoneNotFound` for unknown zones.
    fn require_baseline(&self, zone_id: &str) -> Result<BaselineState, ProviderError> {
        self.baseline(zone_id)?.ok_or_else(|| ProviderError::ZoneNotFound {
            zone_id: zone_id.to_string(),
        })
    }
}

/// Holds the current set of alert zones.
pub trait AlertRegistry: Send + Sync {
    /// All current alerts, worst first.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the registry cannot be read.
    fn alerts(&self) -> Result<Vec<Alert>, ProviderError>;

    /// The alert for one zone.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the registry cannot be read.
    fn get(&self, zone_id: &str) -> Result<Option<Alert>, ProviderError>;

    /// Replaces the alert set (e.g. after a polling cycle).
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the registry cannot be written.
    fn replace(&self, alerts: Vec<Alert>) -> Result<(), ProviderError>;
}
