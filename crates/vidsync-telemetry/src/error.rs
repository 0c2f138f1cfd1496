//! Error types for telemetry operations.

use std::string::FromUtf8Error;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing logging or maintaining metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("tracing subscriber already installed")]
    SubscriberInstall {
        /// Underlying installation error.
        source: TryInitError,
    },
    /// A log format string was not recognised.
    #[error("unknown log format")]
    UnknownLogFormat {
        /// Value supplied by the caller.
        value: String,
    },
    /// A collector could not be built or registered.
    #[error("metric setup failed")]
    Metric {
        /// Setup step (`build` or `register`).
        operation: &'static str,
        /// Metric name.
        metric: &'static str,
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// The registry could not be rendered to text.
    #[error("metrics rendering failed")]
    MetricsRender {
        /// Underlying Prometheus error.
        source: prometheus::Error,
    },
    /// Rendered metrics were not valid UTF-8.
    #[error("rendered metrics were not utf-8")]
    MetricsUtf8 {
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
}

impl TelemetryError {
    pub(crate) const fn metric(
        operation: &'static str,
        metric: &'static str,
        source: prometheus::Error,
    ) -> Self {
        Self::Metric {
            operation,
            metric,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn messages_are_constant_and_sources_preserved() {
        let setup = TelemetryError::metric(
            "register",
            "files_copied_total",
            prometheus::Error::AlreadyReg,
        );
        assert_eq!(setup.to_string(), "metric setup failed");
        assert!(setup.source().is_some());
        assert!(matches!(
            setup,
            TelemetryError::Metric {
                operation: "register",
                ..
            }
        ));

        let render = TelemetryError::MetricsRender {
            source: prometheus::Error::Msg("encode".into()),
        };
        assert_eq!(render.to_string(), "metrics rendering failed");
        assert!(render.source().is_some());

        let unknown = TelemetryError::UnknownLogFormat {
            value: "xml".into(),
        };
        assert_eq!(unknown.to_string(), "unknown log format");
        assert!(unknown.source().is_none());
    }
}
