//! # Design
//!
//! - One error enum per platform seam (index, storage, deletion, consent).
//! - Keep messages constant; carry the offending input as context fields.
//! - Preserve IO sources without interpolating them into messages.

use std::io;

use thiserror::Error;
use uuid::Uuid;

/// Result alias for media index queries.
pub type IndexResult<T> = Result<T, IndexError>;
/// Result alias for storage stream operations.
pub type StorageResult<T> = Result<T, StorageError>;
/// Result alias for deletion service calls.
pub type DeletionResult<T> = Result<T, DeletionError>;
/// Result alias for consent prompts.
pub type ConsentResult<T> = Result<T, ConsentError>;

/// Failures raised by a media index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The caller lacks permission to read the index.
    #[error("media index access denied")]
    AccessDenied {
        /// Collection that was queried.
        collection: &'static str,
    },
    /// The index could not be reached.
    #[error("media index unavailable")]
    Unavailable {
        /// Collection that was queried.
        collection: &'static str,
        /// Backend-provided detail.
        detail: String,
    },
    /// IO failures while scanning the backing store.
    #[error("media index io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
}

/// Failures raised while opening or committing storage streams.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No entry exists at the requested location.
    #[error("storage entry not found")]
    NotFound {
        /// Location or name that was requested.
        target: String,
    },
    /// The location points outside the storage root.
    #[error("storage location outside root")]
    OutsideRoot {
        /// Offending location.
        target: String,
    },
    /// The location scheme is not understood by this binding.
    #[error("unsupported storage location")]
    UnsupportedLocation {
        /// Offending location.
        target: String,
    },
    /// A destination name cannot be used in the private store.
    #[error("invalid destination name")]
    InvalidName {
        /// Offending name.
        name: String,
        /// Machine-readable reason.
        reason: &'static str,
    },
    /// IO failures while streaming bytes.
    #[error("storage io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Location or name involved in the failure.
        target: String,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl StorageError {
    /// Wrap an IO failure with its operation and target.
    #[must_use]
    pub fn io(operation: &'static str, target: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation,
            target: target.into(),
            source,
        }
    }
}

/// Failures raised by a deletion service.
#[derive(Debug, Error)]
pub enum DeletionError {
    /// The service refused the request without offering a consent path.
    #[error("deletion rejected")]
    Rejected {
        /// Machine-readable reason.
        reason: &'static str,
        /// Offending location when available.
        location: Option<String>,
    },
    /// The consent token is not known to the service.
    #[error("unknown consent token")]
    UnknownToken {
        /// Token identifier.
        token: Uuid,
    },
    /// IO failures while deleting entries.
    #[error("deletion io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Location involved in the failure.
        location: String,
        /// Underlying IO error.
        source: io::Error,
    },
}

/// Failures raised by a consent prompt.
#[derive(Debug, Error)]
pub enum ConsentError {
    /// The prompt was dismissed without an answer.
    #[error("consent prompt dismissed")]
    Dismissed,
    /// IO failures while interacting with the user.
    #[error("consent prompt io failure")]
    Io {
        /// Underlying IO error.
        source: io::Error,
    },
}
