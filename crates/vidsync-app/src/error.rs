//! # Design
//!
//! - Centralize application-level errors for bootstrap and the workflow gate.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Result alias for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: vidsync_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: vidsync_telemetry::TelemetryError,
    },
    /// Filesystem binding setup failed.
    #[error("filesystem binding setup failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: vidsync_fsops::FsOpsError,
    },
    /// A workflow operation was refused.
    #[error("workflow operation refused")]
    Workflow {
        /// Operation identifier.
        operation: &'static str,
        /// Source workflow error.
        source: WorkflowError,
    },
    /// A background workflow task panicked or was cancelled.
    #[error("workflow task failed")]
    Task {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl AppError {
    /// Wrap a configuration error.
    #[must_use]
    pub const fn config(operation: &'static str, source: vidsync_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    /// Wrap a telemetry error.
    #[must_use]
    pub const fn telemetry(
        operation: &'static str,
        source: vidsync_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    /// Wrap a workflow refusal.
    #[must_use]
    pub const fn workflow(operation: &'static str, source: WorkflowError) -> Self {
        Self::Workflow { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: vidsync_fsops::FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }
}

/// Reasons the workflow refuses to start an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Another operation holds the workflow gate.
    #[error("workflow busy")]
    Busy,
    /// A required capability has not been granted.
    #[error("permission denied")]
    PermissionDenied {
        /// Capability label.
        capability: &'static str,
    },
}
