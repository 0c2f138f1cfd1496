//! Subcommand handlers driving the workflow controller.

use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use vidsync_app::{AppError, WorkflowController};
use vidsync_core::{DeletionOutcome, VideoRecord};
use vidsync_events::{Event, EventId};
use vidsync_fsops::MirrorReport;

use crate::cli::{CliError, CliResult, OutputFormat};
use crate::output::{
    RECORDS_LOADED, RECORDS_SAVED, deletion_notice, describe_event, render_records,
    render_report,
};

const PROGRESS_DRAIN: Duration = Duration::from_secs(1);

pub(crate) async fn handle_list(
    workflow: &WorkflowController,
    output: OutputFormat,
) -> CliResult<()> {
    let records = load(workflow).await?;
    print!("{}", render_records(&records, output)?);
    if output == OutputFormat::Json {
        println!();
    }
    Ok(())
}

pub(crate) async fn handle_mirror(workflow: &WorkflowController) -> CliResult<()> {
    load(workflow).await?;
    let report = mirror(workflow).await?;
    ensure_saved(&report)
}

pub(crate) async fn handle_delete(workflow: &WorkflowController) -> CliResult<()> {
    load(workflow).await?;
    delete(workflow).await
}

/// Deletion runs only after every record was saved.
pub(crate) async fn handle_sync(workflow: &WorkflowController) -> CliResult<()> {
    load(workflow).await?;
    let report = mirror(workflow).await?;
    ensure_saved(&report)?;
    delete(workflow).await
}

async fn load(workflow: &WorkflowController) -> CliResult<Vec<VideoRecord>> {
    workflow.request_read_permission().await;
    let records = workflow
        .load_records()
        .await
        .map_err(CliError::workflow)?;
    eprintln!("{RECORDS_LOADED} ({})", records.len());
    Ok(records)
}

async fn mirror(workflow: &WorkflowController) -> CliResult<MirrorReport> {
    let mut progress = spawn_progress(workflow, workflow.events().last_event_id());

    let result = workflow.mirror_records().await;
    if result.is_ok() {
        let _ = tokio::time::timeout(PROGRESS_DRAIN, &mut progress).await;
    }
    progress.abort();
    let report = result.map_err(CliError::workflow)?;
    println!("{}", render_report(&report));
    Ok(report)
}

fn spawn_progress(workflow: &WorkflowController, after: Option<EventId>) -> JoinHandle<()> {
    let mut stream = workflow.events().subscribe(after);
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            if let Some(line) = describe_event(&envelope.event) {
                eprintln!("{line}");
            }
            if matches!(envelope.event, Event::MirrorCompleted { .. }) {
                break;
            }
        }
    })
}

fn ensure_saved(report: &MirrorReport) -> CliResult<()> {
    if report.succeeded() {
        eprintln!("{RECORDS_SAVED}");
        Ok(())
    } else {
        Err(CliError::failure(anyhow!(
            "{} of {} videos could not be saved",
            report.failures.len(),
            report.copied.len() + report.failures.len()
        )))
    }
}

async fn delete(workflow: &WorkflowController) -> CliResult<()> {
    let outcome = workflow.delete_records().await.map_err(CliError::workflow)?;
    eprintln!("{}", deletion_notice(&outcome));
    match outcome {
        DeletionOutcome::Confirmed | DeletionOutcome::Denied => Ok(()),
        DeletionOutcome::Failed { message } => {
            Err(CliError::failure(anyhow!("deletion failed: {message}")))
        }
        DeletionOutcome::DeferredToUser(_) => Err(CliError::failure(anyhow!(
            "deletion is still waiting for consent"
        ))),
    }
}

/// Counters collected during the run, in Prometheus text format.
pub(crate) fn metrics_report(workflow: &WorkflowController) -> CliResult<String> {
    workflow
        .metrics()
        .render()
        .map_err(|err| CliError::failure(AppError::telemetry("cli.metrics", err)))
}
