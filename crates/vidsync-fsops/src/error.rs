//! Setup errors for the filesystem bindings. Runtime failures use the
//! per-seam error types from `vidsync-core`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for binding construction.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// A filesystem binding could not be constructed.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// A storage root could not be created or resolved.
    #[error("storage root unavailable")]
    Io {
        /// Setup step that touched the filesystem.
        operation: &'static str,
        /// Root being prepared.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A video pattern did not compile.
    #[error("invalid video pattern")]
    Pattern {
        /// Setup step (`compile_pattern` or `build_globset`).
        operation: &'static str,
        /// Offending pattern, or the joined set.
        pattern: String,
        /// Underlying globset error.
        source: globset::Error,
    },
    /// Binding configuration was rejected.
    #[error("invalid binding configuration")]
    InvalidInput {
        /// Configuration field at fault.
        field: &'static str,
        /// Machine-readable reason.
        reason: &'static str,
        /// Offending value, when there is one.
        value: Option<String>,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, root: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: root.into(),
            source,
        }
    }

    pub(crate) const fn pattern(
        operation: &'static str,
        pattern: String,
        source: globset::Error,
    ) -> Self {
        Self::Pattern {
            operation,
            pattern,
            source,
        }
    }
}
