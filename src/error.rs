//! Error types for Respire.
//!
//! All errors in Respire are strongly typed using thiserror.
//! The simulation engine itself is total and never fails; errors only
//! arise at the edges (catalog loading, configuration, baseline lookups,
//! and request validation at the transport boundary).

use thiserror::Error;

/// Validation errors raised while checking caller input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Intervention '{key}' has weight {value}, expected a value in [0.0, 1.0]")]
    WeightOutOfRange {
        key: String,
        value: f64,
    },

    #[error("Field '{field}' must be a finite, non-negative number (got {value})")]
    InvalidNumber {
        field: String,
        value: f64,
    },

    #[error("Invalid zone id '{zone_id}'")]
    InvalidZoneId {
        zone_id: String,
    },

    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Payload of {actual} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        actual: usize,
        max: usize,
    },

    #[error("Malformed request JSON: {message}")]
    MalformedJson {
        message: String,
    },
}

/// Errors raised while building or loading an intervention catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog '{name}' has no interventions")]
    Empty {
        name: String,
    },

    #[error("Intervention key cannot be empty")]
    EmptyKey,

    #[error("Duplicate intervention key: {key}")]
    DuplicateKey {
        key: String,
    },

    #[error("Intervention '{key}' has invalid {field}: {value}")]
    InvalidCoefficient {
        key: String,
        field: String,
        value: f64,
    },

    #[error("Ceiling for {metric} must be in [0.0, 1.0] (got {value})")]
    InvalidCeiling {
        metric: String,
        value: f64,
    },

    #[error("Unknown catalog variant: {name}")]
    UnknownVariant {
        name: String,
    },

    #[error("Failed to parse catalog: {message}")]
    Parse {
        message: String,
    },

    #[error("Failed to read catalog file {path}: {message}")]
    Io {
        path: String,
        message: String,
    },
}

/// Errors raised by baseline and alert providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Zone not found: {zone_id}")]
    ZoneNotFound {
        zone_id: String,
    },

    #[error("Provider backend error: {0}")]
    Backend(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidVar {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Medium priority threshold {medium} exceeds high priority threshold {high}")]
    ThresholdOrder {
        medium: f64,
        high: f64,
    },
}

/// Errors raised by dashboard subscriptions.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Subscription disconnected")]
    Disconnected,

    #[error("Timed out after {duration_ms}ms waiting for an event")]
    Timeout {
        duration_ms: u64,
    },
}

/// Top-level error type for Respire.
#[derive(Debug, Error)]
pub enum RespireError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl RespireError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if the requested zone does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Provider(ProviderError::ZoneNotFound { .. }))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Provider(e) => matches!(e, ProviderError::Unavailable(_)),
            Self::Channel(e) => matches!(e, ChannelError::Timeout { .. }),
            Self::Validation(_) | Self::Catalog(_) | Self::Config(_) | Self::Internal { .. } => {
                false
            }
        }
    }
}

/// Result type alias for Respire operations.
pub type RespireResult<T> = Result<T, RespireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_weight() {
        let err = ValidationError::WeightOutOfRange {
            key: "rerouting".to_string(),
            value: 1.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("rerouting"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_catalog_error_duplicate() {
        let err = CatalogError::DuplicateKey {
            key: "greenBuffer".to_string(),
        };
        assert!(format!("{err}").contains("greenBuffer"));
    }

    #[test]
    fn test_respire_error_from_validation() {
        let err: RespireError = ValidationError::MissingField {
            field: "zoneId".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_respire_error_not_found() {
        let err: RespireError = ProviderError::ZoneNotFound {
            zone_id: "zone_042".to_string(),
        }
        .into();
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert!(format!("{err}").contains("zone_042"));
    }

    #[test]
    fn test_respire_error_retryable() {
        let err: RespireError = ProviderError::Unavailable("upstream timeout".to_string()).into();
        assert!(err.is_retryable());

        let err: RespireError = ProviderError::Backend("poisoned".to_string()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_respire_error_internal() {
        let err = RespireError::internal("unexpected state");
        assert!(err.is_internal());
        assert!(format!("{err}").contains("unexpected state"));
    }
}
