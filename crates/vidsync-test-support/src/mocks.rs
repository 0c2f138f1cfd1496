//! In-memory fakes of the platform seams.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio::sync::Notify;
use uuid::Uuid;
use vidsync_core::{
    BoxedReader, BoxedWriter, Capability, ConsentDecision, ConsentError, ConsentFlow,
    ConsentResult, ConsentToken, DeleteResponse, DeletionError, DeletionResult, DeletionService,
    IndexError, IndexResult, IndexRow, Location, MediaIndex, MediaQuery, PermissionGate,
    PermissionGrants, PrivateStore, RecordId, SharedStorage, StorageError, StorageResult,
};

const MEMORY_SCHEME: &str = "memory://video/";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
struct MemoryEntry {
    id: RecordId,
    name: String,
    bytes: Vec<u8>,
    relative_path: Option<String>,
}

#[derive(Default)]
struct MediaState {
    entries: Vec<MemoryEntry>,
    denied: bool,
    unreadable: HashSet<RecordId>,
    owned: HashSet<RecordId>,
    pending: HashMap<Uuid, Vec<RecordId>>,
    fail_deletions: bool,
    delete_requests: usize,
}

/// Shared media catalogue acting as media index, shared storage and
/// deletion service at once, so deletions show up in the next query.
///
/// Rows are returned in insertion order, not sorted.
#[derive(Clone, Default)]
pub struct MemoryMedia {
    state: Arc<Mutex<MediaState>>,
    query_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl MemoryMedia {
    /// Empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with_video(self, id: u64, name: &str, bytes: &[u8]) -> Self {
        self.insert(id, name, bytes);
        self
    }

    /// Add a video entry.
    pub fn insert(&self, id: u64, name: &str, bytes: &[u8]) {
        lock(&self.state).entries.push(MemoryEntry {
            id: RecordId(id),
            name: name.to_string(),
            bytes: bytes.to_vec(),
            relative_path: Some("Movies".to_string()),
        });
    }

    /// Location string used for `id`.
    #[must_use]
    pub fn location(id: u64) -> Location {
        Location::new(format!("{MEMORY_SCHEME}{id}"))
    }

    /// Make every query fail with `AccessDenied`.
    pub fn deny_access(&self) {
        lock(&self.state).denied = true;
    }

    /// Make reads of `id` fail.
    pub fn make_unreadable(&self, id: u64) {
        lock(&self.state).unreadable.insert(RecordId(id));
    }

    /// Mark `id` as owned by the application; its deletion needs no consent.
    pub fn mark_owned(&self, id: u64) {
        lock(&self.state).owned.insert(RecordId(id));
    }

    /// Make every deletion request fail with an IO error.
    pub fn fail_deletions(&self) {
        lock(&self.state).fail_deletions = true;
    }

    /// Hold queries until the returned handle is notified.
    #[must_use]
    pub fn pause_queries(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *lock(&self.query_gate) = Some(Arc::clone(&notify));
        notify
    }

    /// Identifiers still present in the catalogue.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        lock(&self.state)
            .entries
            .iter()
            .map(|entry| entry.id.0)
            .collect()
    }

    /// Number of `request_delete` calls received.
    #[must_use]
    pub fn delete_requests(&self) -> usize {
        lock(&self.state).delete_requests
    }

    /// Number of deletions awaiting consent.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.state).pending.len()
    }

    fn id_for(location: &Location) -> Option<RecordId> {
        location
            .as_str()
            .strip_prefix(MEMORY_SCHEME)
            .and_then(|raw| raw.parse().ok())
            .map(RecordId)
    }
}

#[async_trait]
impl MediaIndex for MemoryMedia {
    async fn query(&self, _query: &MediaQuery) -> IndexResult<Vec<IndexRow>> {
        let gate = lock(&self.query_gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = lock(&self.state);
        if state.denied {
            return Err(IndexError::AccessDenied {
                collection: "video",
            });
        }
        Ok(state
            .entries
            .iter()
            .map(|entry| IndexRow {
                id: entry.id,
                name: entry.name.clone(),
                size: entry.bytes.len() as u64,
                relative_path: entry.relative_path.clone(),
            })
            .collect())
    }

    fn location_for(&self, id: RecordId) -> Location {
        Self::location(id.0)
    }
}

#[async_trait]
impl SharedStorage for MemoryMedia {
    async fn open_read(&self, location: &Location) -> StorageResult<BoxedReader> {
        let not_found = || StorageError::NotFound {
            target: location.to_string(),
        };
        let id = Self::id_for(location).ok_or_else(not_found)?;
        let state = lock(&self.state);
        if state.unreadable.contains(&id) {
            return Err(StorageError::io(
                "open_source",
                location.as_str(),
                io::Error::new(io::ErrorKind::PermissionDenied, "unreadable"),
            ));
        }
        let entry = state
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(not_found)?;
        Ok(Box::new(io::Cursor::new(entry.bytes.clone())))
    }
}

#[async_trait]
impl DeletionService for MemoryMedia {
    async fn request_delete(&self, locations: &[Location]) -> DeletionResult<DeleteResponse> {
        let mut state = lock(&self.state);
        state.delete_requests += 1;
        if state.fail_deletions {
            return Err(DeletionError::Io {
                operation: "request_delete",
                location: locations
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                source: io::Error::other("storage offline"),
            });
        }

        let ids = locations
            .iter()
            .map(|location| {
                Self::id_for(location).ok_or_else(|| DeletionError::Rejected {
                    reason: "unsupported_location",
                    location: Some(location.to_string()),
                })
            })
            .collect::<DeletionResult<Vec<_>>>()?;

        if ids.iter().all(|id| state.owned.contains(id)) {
            state.entries.retain(|entry| !ids.contains(&entry.id));
            return Ok(DeleteResponse::Granted);
        }

        let token = ConsentToken::issue(locations.to_vec());
        state.pending.insert(token.id, ids);
        Ok(DeleteResponse::ConsentRequired(token))
    }

    async fn finalize(
        &self,
        token: &ConsentToken,
        decision: ConsentDecision,
    ) -> DeletionResult<()> {
        let mut state = lock(&self.state);
        let ids = state
            .pending
            .remove(&token.id)
            .ok_or(DeletionError::UnknownToken { token: token.id })?;
        if decision == ConsentDecision::Confirmed {
            state.entries.retain(|entry| !ids.contains(&entry.id));
        }
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    staged: HashMap<String, Arc<Mutex<Vec<u8>>>>,
    committed: HashMap<String, Vec<u8>>,
    failing_commits: HashSet<String>,
}

/// In-memory private store with the same staging semantics as the
/// filesystem store.
#[derive(Clone, Default)]
pub struct MemoryPrivateStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryPrivateStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make commits of `name` fail.
    pub fn fail_commit_for(&self, name: &str) {
        lock(&self.state).failing_commits.insert(name.to_string());
    }

    /// Committed bytes for `name`.
    #[must_use]
    pub fn committed(&self, name: &str) -> Option<Vec<u8>> {
        lock(&self.state).committed.get(name).cloned()
    }

    /// Names of committed entries, sorted.
    #[must_use]
    pub fn committed_names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.state).committed.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of staged, uncommitted destinations.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        lock(&self.state).staged.len()
    }
}

#[async_trait]
impl PrivateStore for MemoryPrivateStore {
    async fn open_write(&self, name: &str) -> StorageResult<BoxedWriter> {
        if name.is_empty() || name.contains('/') {
            return Err(StorageError::InvalidName {
                name: name.to_string(),
                reason: "path_separator",
            });
        }
        let buffer = Arc::new(Mutex::new(Vec::new()));
        lock(&self.state)
            .staged
            .insert(name.to_string(), Arc::clone(&buffer));
        Ok(Box::new(MemoryWriter { buffer }))
    }

    async fn commit(&self, name: &str) -> StorageResult<()> {
        let mut state = lock(&self.state);
        if state.failing_commits.contains(name) {
            return Err(StorageError::io(
                "commit",
                name,
                io::Error::other("commit refused"),
            ));
        }
        let buffer = state
            .staged
            .remove(name)
            .ok_or_else(|| StorageError::NotFound {
                target: name.to_string(),
            })?;
        let bytes = lock(&buffer).clone();
        state.committed.insert(name.to_string(), bytes);
        Ok(())
    }

    async fn discard(&self, name: &str) -> StorageResult<()> {
        lock(&self.state).staged.remove(name);
        Ok(())
    }
}

struct MemoryWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        lock(&self.buffer).extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Consent flow replaying scripted answers; once the script runs out it
/// repeats the fallback decision.
pub struct ScriptedConsent {
    script: Mutex<VecDeque<Option<ConsentDecision>>>,
    fallback: Option<ConsentDecision>,
    calls: AtomicUsize,
}

impl ScriptedConsent {
    /// Always answer `decision`.
    #[must_use]
    pub fn always(decision: ConsentDecision) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(decision),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always dismiss the prompt.
    #[must_use]
    pub fn dismissed() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue one answer ahead of the fallback; `None` dismisses.
    #[must_use]
    pub fn then(self, answer: Option<ConsentDecision>) -> Self {
        lock(&self.script).push_back(answer);
        self
    }

    /// Number of prompts shown.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConsentFlow for ScriptedConsent {
    async fn resolve(&self, _token: &ConsentToken) -> ConsentResult<ConsentDecision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = lock(&self.script).pop_front().unwrap_or(self.fallback);
        answer.ok_or(ConsentError::Dismissed)
    }
}

/// Permission gate with a fixed answer.
pub struct StaticPermissionGate {
    granted: bool,
    calls: AtomicUsize,
}

impl StaticPermissionGate {
    /// Gate answering `granted` for every capability.
    #[must_use]
    pub const fn new(granted: bool) -> Self {
        Self {
            granted,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of prompts shown.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionGate for StaticPermissionGate {
    async fn request(&self, capabilities: &[Capability]) -> PermissionGrants {
        self.calls.fetch_add(1, Ordering::SeqCst);
        capabilities
            .iter()
            .fold(PermissionGrants::default(), |grants, capability| {
                grants.with(*capability, self.granted)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn media_reads_and_deletes_entries() -> Result<()> {
        let media = MemoryMedia::new()
            .with_video(1, "a.mp4", b"aa")
            .with_video(2, "b.mp4", b"bb");
        media.mark_owned(1);

        let mut reader = media.open_read(&MemoryMedia::location(2)).await?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        assert_eq!(bytes, b"bb");

        let response = media.request_delete(&[MemoryMedia::location(1)]).await?;
        assert_eq!(response, DeleteResponse::Granted);
        assert_eq!(media.ids(), vec![2]);

        let DeleteResponse::ConsentRequired(token) =
            media.request_delete(&[MemoryMedia::location(2)]).await?
        else {
            panic!("expected consent");
        };
        media.finalize(&token, ConsentDecision::Denied).await?;
        assert_eq!(media.ids(), vec![2]);
        assert_eq!(media.delete_requests(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn store_commits_staged_bytes() -> Result<()> {
        let store = MemoryPrivateStore::new();
        let mut writer = store.open_write("clip.mp4").await?;
        writer.write_all(b"clip").await?;
        writer.shutdown().await?;
        assert_eq!(store.staged_count(), 1);
        store.commit("clip.mp4").await?;
        assert_eq!(store.committed("clip.mp4"), Some(b"clip".to_vec()));
        assert_eq!(store.staged_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn scripted_consent_falls_back_after_script() -> Result<()> {
        let consent = ScriptedConsent::always(ConsentDecision::Denied)
            .then(Some(ConsentDecision::Confirmed))
            .then(None);
        let token = ConsentToken::issue(Vec::new());
        assert_eq!(consent.resolve(&token).await?, ConsentDecision::Confirmed);
        assert!(matches!(
            consent.resolve(&token).await,
            Err(ConsentError::Dismissed)
        ));
        assert_eq!(consent.resolve(&token).await?, ConsentDecision::Denied);
        assert_eq!(consent.calls(), 3);
        Ok(())
    }
}
