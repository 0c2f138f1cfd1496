//! Configuration loading: defaults, then an optional JSON file, then
//! `VIDSYNC_*` environment overrides.
//!
//! # Design
//! - Environment lookups go through a closure so tests never touch the real
//!   process environment.
//! - Validation runs once on the merged result.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;
use crate::validate::{parse_capacity, parse_list, validate};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "VIDSYNC_";

/// Load configuration using the real process environment.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if the
/// merged configuration fails validation.
pub fn load(path: Option<&Path>) -> ConfigResult<AppConfig> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Load configuration with a caller-supplied environment lookup.
///
/// A missing file at `path` is an error; `None` skips the file layer.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if the
/// merged configuration fails validation.
pub fn load_with<F>(path: Option<&Path>, env: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_file(path)?,
        None => AppConfig::default(),
    };
    apply_env(&mut config, &env)?;
    validate(&config)?;
    debug!(
        shared_root = %config.shared_root.display(),
        private_root = %config.private_root.display(),
        owned_roots = config.owned_roots.len(),
        "configuration loaded"
    );
    Ok(config)
}

fn read_file(path: &Path) -> ConfigResult<AppConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env<F>(config: &mut AppConfig, env: &F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env(&format!("{ENV_PREFIX}{name}"));

    if let Some(value) = lookup("SHARED_ROOT") {
        config.shared_root = PathBuf::from(value);
    }
    if let Some(value) = lookup("PRIVATE_ROOT") {
        config.private_root = PathBuf::from(value);
    }
    if let Some(value) = lookup("OWNED_ROOTS") {
        config.owned_roots = parse_list(&value).into_iter().map(PathBuf::from).collect();
    }
    if let Some(value) = lookup("VIDEO_PATTERNS") {
        config.video_patterns = parse_list(&value);
    }
    if let Some(value) = lookup("LOG_LEVEL") {
        config.log_level = value;
    }
    if let Some(value) = lookup("LOG_FORMAT") {
        config.log_format = Some(value.trim().to_ascii_lowercase());
    }
    if let Some(value) = lookup("EVENT_CAPACITY") {
        config.event_capacity = parse_capacity("event_capacity", &value)?;
    }
    Ok(())
}
