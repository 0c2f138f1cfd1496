//! End-to-end synchronization over the filesystem bindings.

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use vidsync_app::{WorkflowController, build_workflow};
use vidsync_core::{ConsentDecision, DeletionOutcome};
use vidsync_events::{DeletionPhase, PermissionState};
use vidsync_test_support::fixtures::StorageFixture;
use vidsync_test_support::mocks::{ScriptedConsent, StaticPermissionGate};

fn workflow(
    fixture: &StorageFixture,
    owned: &[&str],
    consent: Arc<ScriptedConsent>,
) -> Result<WorkflowController> {
    Ok(build_workflow(
        &fixture.config(owned),
        Arc::new(StaticPermissionGate::new(true)),
        consent,
    )?)
}

#[tokio::test]
async fn enumerate_then_mirror_copies_every_video() -> Result<()> {
    let fixture = StorageFixture::new()?;
    fixture.write_video("Movies/zeta.mp4", b"zeta-bytes")?;
    fixture.write_video("Camera/alpha.mkv", b"alpha")?;
    fixture.write_video("notes.txt", b"not a video")?;
    let workflow = workflow(
        &fixture,
        &[],
        Arc::new(ScriptedConsent::always(ConsentDecision::Denied)),
    )?;

    assert_eq!(
        workflow.request_read_permission().await,
        PermissionState::Granted
    );
    let records = workflow.load_records().await?;
    let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
    assert_eq!(names, vec!["alpha.mkv", "zeta.mp4"]);

    let report = workflow.mirror_records().await?;
    assert!(report.succeeded());
    assert_eq!(fixture.private_files()?, vec!["alpha.mkv", "zeta.mp4"]);
    assert_eq!(
        fs::read(fixture.private().join("zeta.mp4"))?,
        fs::read(fixture.shared().join("Movies/zeta.mp4"))?
    );
    assert!(!workflow.snapshot().busy);
    Ok(())
}

#[tokio::test]
async fn vanished_source_is_skipped_and_leaves_no_partial_file() -> Result<()> {
    let fixture = StorageFixture::new()?;
    fixture.write_video("a.mp4", b"a")?;
    let doomed = fixture.write_video("b.mp4", b"b")?;
    fixture.write_video("c.mp4", b"c")?;
    let workflow = workflow(
        &fixture,
        &[],
        Arc::new(ScriptedConsent::always(ConsentDecision::Denied)),
    )?;
    workflow.request_read_permission().await;
    workflow.load_records().await?;
    fs::remove_file(doomed)?;

    let report = workflow.mirror_records().await?;
    assert!(!report.succeeded());
    assert_eq!(report.copied.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "b.mp4");
    assert_eq!(fixture.private_files()?, vec!["a.mp4", "c.mp4"]);
    assert!(!workflow.snapshot().busy);
    Ok(())
}

#[tokio::test]
async fn same_named_videos_keep_the_later_copy() -> Result<()> {
    let fixture = StorageFixture::new()?;
    fixture.write_video("A/clip.mp4", b"first")?;
    fixture.write_video("B/clip.mp4", b"second-and-last")?;
    let workflow = workflow(
        &fixture,
        &[],
        Arc::new(ScriptedConsent::always(ConsentDecision::Denied)),
    )?;
    workflow.request_read_permission().await;
    workflow.load_records().await?;

    let report = workflow.mirror_records().await?;
    assert!(report.succeeded());
    assert_eq!(fixture.private_files()?, vec!["clip.mp4"]);
    assert_eq!(
        fs::read(fixture.private().join("clip.mp4"))?,
        b"second-and-last"
    );
    Ok(())
}

#[tokio::test]
async fn owned_videos_are_deleted_without_consent() -> Result<()> {
    let fixture = StorageFixture::new()?;
    let clip = fixture.write_video("Camera/clip.mp4", b"clip")?;
    let consent = Arc::new(ScriptedConsent::always(ConsentDecision::Denied));
    let workflow = workflow(&fixture, &["Camera"], Arc::clone(&consent))?;
    workflow.request_read_permission().await;
    workflow.load_records().await?;

    let outcome = workflow.delete_records().await?;
    assert_eq!(outcome, DeletionOutcome::Confirmed);
    assert_eq!(consent.calls(), 0);
    assert!(!clip.exists());
    assert_eq!(workflow.snapshot().deletion, DeletionPhase::Confirmed);
    assert!(workflow.load_records().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn foreign_videos_survive_a_denied_consent() -> Result<()> {
    let fixture = StorageFixture::new()?;
    let clip = fixture.write_video("Movies/clip.mp4", b"clip")?;
    let consent = Arc::new(ScriptedConsent::always(ConsentDecision::Denied));
    let workflow = workflow(&fixture, &["Camera"], Arc::clone(&consent))?;
    workflow.request_read_permission().await;
    workflow.load_records().await?;

    let outcome = workflow.delete_records().await?;
    assert_eq!(outcome, DeletionOutcome::Denied);
    assert_eq!(consent.calls(), 1);
    assert!(clip.exists());
    assert_eq!(workflow.load_records().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn foreign_videos_are_deleted_after_consent() -> Result<()> {
    let fixture = StorageFixture::new()?;
    let clip = fixture.write_video("Movies/clip.mp4", b"clip")?;
    let workflow = workflow(
        &fixture,
        &[],
        Arc::new(ScriptedConsent::always(ConsentDecision::Confirmed)),
    )?;
    workflow.request_read_permission().await;
    workflow.load_records().await?;

    assert_eq!(
        workflow.delete_records().await?,
        DeletionOutcome::Confirmed
    );
    assert!(!clip.exists());
    Ok(())
}
