//! Default values applied when neither the config file nor the environment
//! supplies a setting.

/// Shared storage root scanned for videos.
pub(crate) const SHARED_ROOT: &str = "shared";
/// Private sandbox that receives mirrored copies.
pub(crate) const PRIVATE_ROOT: &str = ".vidsync/private";
/// Default log level.
pub(crate) const LOG_LEVEL: &str = "info";
/// Default event bus replay capacity.
pub(crate) const EVENT_CAPACITY: usize = 256;
/// Glob patterns identifying video files.
pub(crate) const VIDEO_PATTERNS: &[&str] = &[
    "**/*.mp4", "**/*.m4v", "**/*.mkv", "**/*.webm", "**/*.mov", "**/*.avi", "**/*.3gp",
];
/// Log formats accepted by the telemetry layer.
pub(crate) const LOG_FORMATS: &[&str] = &["json", "pretty"];
