//! Rendering helpers for records, mirror reports and workflow events.

use std::fmt::Write as _;

use anyhow::anyhow;
use vidsync_core::{DeletionOutcome, VideoRecord};
use vidsync_events::Event;
use vidsync_fsops::MirrorReport;

use crate::cli::{CliError, CliResult, OutputFormat};

pub(crate) const RECORDS_LOADED: &str = "Videos loaded";
pub(crate) const RECORDS_SAVED: &str = "Videos saved";
pub(crate) const DELETION_CONFIRMED: &str = "Videos deleted successfully";
pub(crate) const DELETION_UNSUCCESSFUL: &str = "Videos deletion unsuccessful";

pub(crate) fn render_records(records: &[VideoRecord], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(records)
            .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}"))),
        OutputFormat::Table => {
            let mut text = format!("{:>6} {:>12} {:<24} NAME\n", "ID", "SIZE", "FOLDER");
            for record in records {
                let _ = writeln!(
                    text,
                    "{:>6} {:>12} {:<24} {}",
                    record.id,
                    record.size,
                    record.relative_path.as_deref().unwrap_or("-"),
                    record.name
                );
            }
            Ok(text)
        }
    }
}

pub(crate) fn render_report(report: &MirrorReport) -> String {
    let mut text = format!(
        "copied {} videos ({} bytes)",
        report.copied.len(),
        report.bytes_copied()
    );
    for failure in &report.failures {
        let _ = write!(
            text,
            "\n  failed {} at {}: {}",
            failure.name,
            failure.stage.as_str(),
            failure.message
        );
    }
    text
}

/// Notification shown once a deletion attempt settles.
pub(crate) const fn deletion_notice(outcome: &DeletionOutcome) -> &'static str {
    match outcome {
        DeletionOutcome::Confirmed => DELETION_CONFIRMED,
        _ => DELETION_UNSUCCESSFUL,
    }
}

/// Progress line for mirror events; other events stay silent.
pub(crate) fn describe_event(event: &Event) -> Option<String> {
    match event {
        Event::MirrorStarted { total } => Some(format!("mirroring {total} videos")),
        Event::MirrorItemCopied { name, bytes, .. } => {
            Some(format!("  saved {name} ({bytes} bytes)"))
        }
        Event::MirrorItemFailed {
            name,
            stage,
            message,
            ..
        } => Some(format!("  skipped {name}: {stage} failed ({message})")),
        _ => None,
    }
}
