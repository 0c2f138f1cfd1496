//! The synchronization workflow: single owner of [`WorkflowState`].
//!
//! # Design
//! - State lives in a `watch` channel; only the controller writes it.
//! - Enumeration, mirroring and deletion share one gate taken with
//!   `try_lock`, so an overlapping trigger is refused with `Busy`.
//! - `busy` is raised only around enumeration and mirroring and is lowered
//!   by a drop guard on every exit path.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vidsync_core::{
    Capability, ConsentFlow, DeletionOutcome, DeletionRequester, DeletionService, MediaIndex,
    MediaIndexReader, PermissionGate, PrivateStore, SharedStorage, VideoRecord,
};
use vidsync_events::{DeletionPhase, Event, EventBus, PermissionState};
use vidsync_fsops::{MirrorReport, StorageMirror};
use vidsync_telemetry::Metrics;

use crate::error::{WorkflowError, WorkflowResult};

/// Observable workflow state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    /// Records from the latest enumeration.
    pub records: Vec<VideoRecord>,
    /// True while an enumeration or mirror run is in flight.
    pub busy: bool,
    /// Read permission for shared media.
    pub read_permission: PermissionState,
    /// Phase of the latest deletion attempt.
    pub deletion: DeletionPhase,
}

/// Platform bindings and shared services the controller runs against.
pub struct WorkflowDeps {
    /// Media catalogue.
    pub index: Arc<dyn MediaIndex>,
    /// Source of video bytes.
    pub shared: Arc<dyn SharedStorage>,
    /// Destination for mirrored copies.
    pub private: Arc<dyn PrivateStore>,
    /// Shared-storage deletion endpoint.
    pub deletion: Arc<dyn DeletionService>,
    /// User consent step for deletions.
    pub consent: Arc<dyn ConsentFlow>,
    /// User permission prompt.
    pub permissions: Arc<dyn PermissionGate>,
    /// Event bus receiving workflow events.
    pub events: EventBus,
    /// Metrics registry.
    pub metrics: Metrics,
}

/// Serialises the workflow operations and publishes their effects.
#[derive(Clone)]
pub struct WorkflowController {
    inner: Arc<Inner>,
}

struct Inner {
    reader: MediaIndexReader,
    mirror: StorageMirror,
    deleter: DeletionRequester,
    permissions: Arc<dyn PermissionGate>,
    state: watch::Sender<WorkflowState>,
    gate: Mutex<()>,
    events: EventBus,
    metrics: Metrics,
}

impl WorkflowController {
    /// Wire a controller over `deps`.
    #[must_use]
    pub fn new(deps: WorkflowDeps) -> Self {
        let WorkflowDeps {
            index,
            shared,
            private,
            deletion,
            consent,
            permissions,
            events,
            metrics,
        } = deps;
        let (state, _) = watch::channel(WorkflowState::default());
        Self {
            inner: Arc::new(Inner {
                reader: MediaIndexReader::new(index),
                mirror: StorageMirror::new(shared, private, events.clone(), metrics.clone()),
                deleter: DeletionRequester::new(deletion, consent),
                permissions,
                state,
                gate: Mutex::new(()),
                events,
                metrics,
            }),
        }
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.inner.state.subscribe()
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> WorkflowState {
        self.inner.state.borrow().clone()
    }

    /// Event bus the workflow publishes to.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Metrics registry the workflow records into.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Ask the permission gate for read access to shared media and store the
    /// answer.
    pub async fn request_read_permission(&self) -> PermissionState {
        let capability = Capability::ReadSharedMedia;
        let grants = self.inner.permissions.request(&[capability]).await;
        let permission = if grants.is_granted(capability) {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        };

        self.inner
            .state
            .send_modify(|state| state.read_permission = permission);
        self.inner
            .events
            .publish(Event::PermissionChanged { state: permission });
        info!(capability = capability.label(), permission = ?permission, "read permission updated");
        permission
    }

    /// Replace the held records with a fresh enumeration.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` without read permission and `Busy` while
    /// another operation runs.
    pub async fn load_records(&self) -> WorkflowResult<Vec<VideoRecord>> {
        if !self.inner.state.borrow().read_permission.is_granted() {
            return Err(WorkflowError::PermissionDenied {
                capability: Capability::ReadSharedMedia.label(),
            });
        }
        let _gate = self.acquire("load_records")?;
        let _busy = BusyGuard::raise(&self.inner);

        self.inner.state.send_modify(|state| state.records.clear());
        self.inner.events.publish(Event::RecordsCleared);

        let records = self.inner.reader.enumerate().await;
        self.inner.metrics.set_records_listed(records.len());
        self.inner
            .state
            .send_modify(|state| state.records.clone_from(&records));
        self.inner.events.publish(Event::RecordsLoaded {
            count: records.len(),
        });
        info!(count = records.len(), "records loaded");
        Ok(records)
    }

    /// Mirror the held records into private storage.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while another operation runs.
    pub async fn mirror_records(&self) -> WorkflowResult<MirrorReport> {
        let _gate = self.acquire("mirror_records")?;
        let _busy = BusyGuard::raise(&self.inner);

        let records = self.inner.state.borrow().records.clone();
        Ok(self.inner.mirror.mirror(&records).await)
    }

    /// Delete the held records from shared storage, consulting the consent
    /// flow when the platform requires it.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while another operation runs.
    pub async fn delete_records(&self) -> WorkflowResult<DeletionOutcome> {
        let _gate = self.acquire("delete_records")?;
        let records = self.inner.state.borrow().records.clone();

        self.enter_phase(DeletionPhase::Requesting);
        let mut outcome = self.inner.deleter.request(&records).await;
        if let DeletionOutcome::DeferredToUser(pending) = outcome {
            self.enter_phase(DeletionPhase::DeferredToUser);
            outcome = self.inner.deleter.resolve(pending).await;
        }

        let phase = outcome.phase();
        self.inner.metrics.inc_deletion(phase.label());
        self.enter_phase(phase);
        Ok(outcome)
    }

    /// Run [`Self::load_records`] on a background task.
    #[must_use]
    pub fn spawn_load_records(&self) -> JoinHandle<WorkflowResult<Vec<VideoRecord>>> {
        let this = self.clone();
        tokio::spawn(async move { this.load_records().await })
    }

    /// Run [`Self::mirror_records`] on a background task.
    #[must_use]
    pub fn spawn_mirror_records(&self) -> JoinHandle<WorkflowResult<MirrorReport>> {
        let this = self.clone();
        tokio::spawn(async move { this.mirror_records().await })
    }

    /// Run [`Self::delete_records`] on a background task.
    #[must_use]
    pub fn spawn_delete_records(&self) -> JoinHandle<WorkflowResult<DeletionOutcome>> {
        let this = self.clone();
        tokio::spawn(async move { this.delete_records().await })
    }

    fn acquire(&self, operation: &'static str) -> WorkflowResult<MutexGuard<'_, ()>> {
        self.inner.gate.try_lock().map_err(|_| {
            warn!(operation, "workflow busy; operation refused");
            WorkflowError::Busy
        })
    }

    fn enter_phase(&self, next: DeletionPhase) {
        let mut moved = false;
        self.inner.state.send_modify(|state| {
            moved = state.deletion.advance(next.clone());
        });
        if moved {
            self.inner
                .events
                .publish(Event::DeletionPhaseChanged { phase: next });
        } else {
            warn!(phase = next.label(), "illegal deletion phase transition ignored");
        }
    }
}

struct BusyGuard<'a> {
    inner: &'a Inner,
}

impl<'a> BusyGuard<'a> {
    fn raise(inner: &'a Inner) -> Self {
        set_busy(inner, true);
        Self { inner }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        set_busy(self.inner, false);
    }
}

fn set_busy(inner: &Inner, busy: bool) {
    inner.state.send_modify(|state| state.busy = busy);
    inner.events.publish(Event::BusyChanged { busy });
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use vidsync_core::ConsentDecision;
    use vidsync_test_support::mocks::{
        MemoryMedia, MemoryPrivateStore, ScriptedConsent, StaticPermissionGate,
    };

    fn controller(media: &MemoryMedia, granted: bool) -> Result<WorkflowController> {
        let media = Arc::new(media.clone());
        Ok(WorkflowController::new(WorkflowDeps {
            index: media.clone(),
            shared: media.clone(),
            private: Arc::new(MemoryPrivateStore::new()),
            deletion: media,
            consent: Arc::new(ScriptedConsent::always(ConsentDecision::Denied)),
            permissions: Arc::new(StaticPermissionGate::new(granted)),
            events: EventBus::with_capacity(64),
            metrics: Metrics::new()?,
        }))
    }

    #[tokio::test]
    async fn permission_answer_is_stored_and_published() -> Result<()> {
        let workflow = controller(&MemoryMedia::new(), false)?;
        let mut stream = workflow.events().subscribe(None);

        assert_eq!(workflow.snapshot().read_permission, PermissionState::Unknown);
        assert_eq!(
            workflow.request_read_permission().await,
            PermissionState::Denied
        );
        assert_eq!(workflow.snapshot().read_permission, PermissionState::Denied);
        let envelope = stream.next().await;
        assert_eq!(
            envelope.map(|envelope| envelope.event),
            Some(Event::PermissionChanged {
                state: PermissionState::Denied
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn load_records_sorts_and_lowers_busy() -> Result<()> {
        let media = MemoryMedia::new()
            .with_video(1, "b.mp4", b"b")
            .with_video(2, "a.mp4", b"a");
        let workflow = controller(&media, true)?;
        workflow.request_read_permission().await;

        let records = workflow.load_records().await?;
        let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["a.mp4", "b.mp4"]);

        let state = workflow.snapshot();
        assert_eq!(state.records, records);
        assert!(!state.busy);
        assert_eq!(workflow.metrics().snapshot().records_listed, 2);
        Ok(())
    }

    #[tokio::test]
    async fn deletion_phases_are_tracked_in_state() -> Result<()> {
        let media = MemoryMedia::new().with_video(1, "a.mp4", b"a");
        let workflow = controller(&media, true)?;
        workflow.request_read_permission().await;
        workflow.load_records().await?;

        let outcome = workflow.delete_records().await?;
        assert_eq!(outcome, DeletionOutcome::Denied);
        assert_eq!(workflow.snapshot().deletion, DeletionPhase::Denied);
        assert_eq!(workflow.metrics().deletions("denied"), 1);
        assert_eq!(media.ids(), vec![1]);
        Ok(())
    }
}
