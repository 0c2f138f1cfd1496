//! Validation and parsing helpers for configuration values.

use std::path::{Component, Path};

use crate::defaults::LOG_FORMATS;
use crate::error::{ConfigError, ConfigResult};
use crate::model::AppConfig;

/// Check cross-field invariants of a fully merged configuration.
///
/// # Errors
///
/// Returns `ConfigError::InvalidField` naming the first offending field.
pub fn validate(config: &AppConfig) -> ConfigResult<()> {
    if config.event_capacity == 0 {
        return Err(ConfigError::invalid(
            "event_capacity",
            "zero",
            Some(config.event_capacity.to_string()),
        ));
    }

    if config.video_patterns.is_empty() {
        return Err(ConfigError::invalid("video_patterns", "empty", None));
    }
    if let Some(blank) = config
        .video_patterns
        .iter()
        .find(|pattern| pattern.trim().is_empty())
    {
        return Err(ConfigError::invalid(
            "video_patterns",
            "blank_pattern",
            Some(blank.clone()),
        ));
    }

    if config.log_level.trim().is_empty() {
        return Err(ConfigError::invalid("log_level", "empty", None));
    }
    if let Some(format) = &config.log_format {
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::invalid(
                "log_format",
                "unknown_format",
                Some(format.clone()),
            ));
        }
    }

    if is_empty_path(&config.shared_root) {
        return Err(ConfigError::invalid("shared_root", "empty", None));
    }
    if is_empty_path(&config.private_root) {
        return Err(ConfigError::invalid("private_root", "empty", None));
    }
    if config.private_root.starts_with(&config.shared_root) {
        return Err(ConfigError::invalid(
            "private_root",
            "inside_shared_root",
            Some(config.private_root.display().to_string()),
        ));
    }
    if let Some(escape) = config
        .owned_roots
        .iter()
        .find(|root| root.components().any(|part| part == Component::ParentDir))
    {
        return Err(ConfigError::invalid(
            "owned_roots",
            "parent_component",
            Some(escape.display().to_string()),
        ));
    }

    Ok(())
}

/// Parse a positive integer setting.
pub(crate) fn parse_capacity(field: &'static str, raw: &str) -> ConfigResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(field, "not_an_integer", Some(raw.to_string())))
}

/// Split a comma-separated list, dropping empty entries.
pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn is_empty_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn reason(result: ConfigResult<()>) -> Option<(&'static str, &'static str)> {
        match result {
            Err(ConfigError::InvalidField { field, reason, .. }) => Some((field, reason)),
            _ => None,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn rejects_zero_capacity_and_empty_patterns() {
        let config = AppConfig {
            event_capacity: 0,
            ..AppConfig::default()
        };
        assert_eq!(reason(validate(&config)), Some(("event_capacity", "zero")));

        let config = AppConfig {
            video_patterns: Vec::new(),
            ..AppConfig::default()
        };
        assert_eq!(reason(validate(&config)), Some(("video_patterns", "empty")));

        let config = AppConfig {
            video_patterns: vec!["  ".into()],
            ..AppConfig::default()
        };
        assert_eq!(
            reason(validate(&config)),
            Some(("video_patterns", "blank_pattern"))
        );
    }

    #[test]
    fn rejects_unknown_log_format() {
        let config = AppConfig {
            log_format: Some("xml".into()),
            ..AppConfig::default()
        };
        assert_eq!(
            reason(validate(&config)),
            Some(("log_format", "unknown_format"))
        );
    }

    #[test]
    fn rejects_private_root_nested_in_shared_root() {
        let config = AppConfig {
            shared_root: PathBuf::from("/storage/emulated/0"),
            private_root: PathBuf::from("/storage/emulated/0/Android/data/app"),
            ..AppConfig::default()
        };
        assert_eq!(
            reason(validate(&config)),
            Some(("private_root", "inside_shared_root"))
        );
    }

    #[test]
    fn rejects_owned_roots_with_parent_components() {
        let config = AppConfig {
            owned_roots: vec![PathBuf::from("shared/../elsewhere")],
            ..AppConfig::default()
        };
        assert_eq!(
            reason(validate(&config)),
            Some(("owned_roots", "parent_component"))
        );
    }

    #[test]
    fn list_and_capacity_parsers() {
        assert_eq!(parse_list(" a, ,b ,"), vec!["a", "b"]);
        assert_eq!(parse_capacity("event_capacity", " 12 ").ok(), Some(12));
        assert!(parse_capacity("event_capacity", "twelve").is_err());
    }
}
