use std::sync::Arc;

use tracing::info;
use vidsync_config::AppConfig;
use vidsync_core::{ConsentFlow, PermissionGate};
use vidsync_events::EventBus;
use vidsync_fsops::{DirectoryMediaIndex, FsDeletionService, FsPrivateStore, FsSharedStorage};
use vidsync_telemetry::{LogFormat, LoggingConfig, Metrics};

use crate::error::{AppError, AppResult};
use crate::workflow::{WorkflowController, WorkflowDeps};

/// Logging settings derived from `config`.
///
/// # Errors
///
/// Returns an error if the configured log format is unknown.
pub fn logging_config(config: &AppConfig) -> AppResult<LoggingConfig<'_>> {
    let format = match config.log_format.as_deref() {
        Some(raw) => raw
            .parse::<LogFormat>()
            .map_err(|err| AppError::telemetry("telemetry.log_format", err))?,
        None => LogFormat::infer(),
    };
    Ok(LoggingConfig {
        level: &config.log_level,
        format,
        ..LoggingConfig::default()
    })
}

/// Install the global tracing subscriber for `config`.
///
/// # Errors
///
/// Returns an error if the log format is unknown or a subscriber is already
/// installed.
pub fn init_telemetry(config: &AppConfig) -> AppResult<()> {
    let logging = logging_config(config)?;
    vidsync_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))
}

/// Build a workflow over the filesystem bindings described by `config`.
///
/// The private root is created when missing; the shared root must exist.
///
/// # Errors
///
/// Returns an error if a binding cannot be constructed or the metrics
/// registry fails to initialise.
pub fn build_workflow(
    config: &AppConfig,
    permissions: Arc<dyn PermissionGate>,
    consent: Arc<dyn ConsentFlow>,
) -> AppResult<WorkflowController> {
    let index = DirectoryMediaIndex::new(&config.shared_root, &config.video_patterns)
        .map_err(|err| AppError::fsops("bindings.media_index", err))?;
    let shared = FsSharedStorage::new(&config.shared_root)
        .map_err(|err| AppError::fsops("bindings.shared_storage", err))?;
    let private = FsPrivateStore::new(&config.private_root)
        .map_err(|err| AppError::fsops("bindings.private_store", err))?;
    let deletion = FsDeletionService::new(&config.shared_root, &config.owned_roots)
        .map_err(|err| AppError::fsops("bindings.deletion_service", err))?;
    let metrics = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;

    info!(
        shared_root = %shared.root().display(),
        private_root = %private.root().display(),
        owned_roots = config.owned_roots.len(),
        "filesystem bindings ready"
    );

    Ok(WorkflowController::new(WorkflowDeps {
        index: Arc::new(index),
        shared: Arc::new(shared),
        private: Arc::new(private),
        deletion: Arc::new(deletion),
        consent,
        permissions,
        events: EventBus::with_capacity(config.event_capacity),
        metrics,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::path::PathBuf;
    use vidsync_core::ConsentDecision;
    use vidsync_test_support::fixtures::StorageFixture;
    use vidsync_test_support::mocks::{ScriptedConsent, StaticPermissionGate};

    #[test]
    fn logging_config_follows_configured_format() -> Result<()> {
        let config = AppConfig {
            log_level: "debug".into(),
            log_format: Some("json".into()),
            ..AppConfig::default()
        };
        let logging = logging_config(&config)?;
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);

        let default_config = AppConfig::default();
        let inferred = logging_config(&default_config)?;
        assert_eq!(inferred.format, LogFormat::infer());
        Ok(())
    }

    #[test]
    fn missing_shared_root_fails_binding_setup() {
        let config = AppConfig {
            shared_root: PathBuf::from("/definitely/not/a/vidsync/root"),
            ..AppConfig::default()
        };
        let result = build_workflow(
            &config,
            Arc::new(StaticPermissionGate::new(true)),
            Arc::new(ScriptedConsent::always(ConsentDecision::Confirmed)),
        );
        assert!(matches!(
            result,
            Err(AppError::FsOps {
                operation: "bindings.media_index",
                ..
            })
        ));
    }

    #[test]
    fn fixture_config_builds_a_workflow() -> Result<()> {
        let fixture = StorageFixture::new()?;
        let workflow = build_workflow(
            &fixture.config(&[]),
            Arc::new(StaticPermissionGate::new(true)),
            Arc::new(ScriptedConsent::always(ConsentDecision::Confirmed)),
        )?;
        assert!(workflow.snapshot().records.is_empty());
        Ok(())
    }
}
