//! Typed configuration model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Runtime configuration for the synchronization workflow and its bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Root of the shared storage volume scanned for videos.
    pub shared_root: PathBuf,
    /// Private sandbox that receives mirrored copies.
    pub private_root: PathBuf,
    /// Shared-storage directories owned by this application; deletions under
    /// them need no user consent.
    pub owned_roots: Vec<PathBuf>,
    /// Glob patterns (relative to `shared_root`) identifying video files.
    pub video_patterns: Vec<String>,
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format (`json` or `pretty`); inferred from the build when unset.
    pub log_format: Option<String>,
    /// Replay capacity of the workflow event bus.
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            shared_root: PathBuf::from(defaults::SHARED_ROOT),
            private_root: PathBuf::from(defaults::PRIVATE_ROOT),
            owned_roots: Vec::new(),
            video_patterns: defaults::VIDEO_PATTERNS
                .iter()
                .map(ToString::to_string)
                .collect(),
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: None,
            event_capacity: defaults::EVENT_CAPACITY,
        }
    }
}
