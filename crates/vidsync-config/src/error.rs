//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file")]
    Read {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The config file was not valid JSON for the expected schema.
    #[error("failed to parse config file")]
    Parse {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) const fn invalid(
        field: &'static str,
        reason: &'static str,
        value: Option<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            reason,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn invalid_helper_captures_context() {
        let err = ConfigError::invalid("event_capacity", "zero", Some("0".to_string()));
        match &err {
            ConfigError::InvalidField {
                field,
                reason,
                value,
            } => {
                assert_eq!(*field, "event_capacity");
                assert_eq!(*reason, "zero");
                assert_eq!(value.as_deref(), Some("0"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
        assert_eq!(err.to_string(), "invalid configuration field");
        assert!(err.source().is_none());
    }
}
