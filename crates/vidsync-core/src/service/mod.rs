//! Platform seams implemented by storage bindings.
//!
//! Every trait is object safe so the workflow can hold `Arc<dyn Trait>` and a
//! platform can swap bindings without touching the workflow.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{ConsentResult, DeletionResult, IndexResult, StorageResult};
use crate::model::{
    Capability, ConsentDecision, ConsentToken, DeleteResponse, IndexRow, Location, MediaQuery,
    PermissionGrants, RecordId,
};

/// Readable byte stream opened from shared storage.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
/// Writable byte stream opened in the private store.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Platform-owned catalogue of media content.
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Run a read-only query against the index.
    async fn query(&self, query: &MediaQuery) -> IndexResult<Vec<IndexRow>>;

    /// Build the location that opens the bytes behind `id`.
    fn location_for(&self, id: RecordId) -> Location;
}

/// Read side of shared storage.
#[async_trait]
pub trait SharedStorage: Send + Sync {
    /// Open a read stream for the entry at `location`.
    async fn open_read(&self, location: &Location) -> StorageResult<BoxedReader>;
}

/// Application-private, sandboxed destination store.
///
/// Writes are staged: `open_write` hands out a sink, `commit` publishes the
/// staged bytes under `name` (replacing any previous entry), and `discard`
/// drops them.
#[async_trait]
pub trait PrivateStore: Send + Sync {
    /// Open a staged write destination for `name`.
    async fn open_write(&self, name: &str) -> StorageResult<BoxedWriter>;

    /// Publish the staged bytes for `name`.
    async fn commit(&self, name: &str) -> StorageResult<()>;

    /// Drop the staged bytes for `name`; default implementation does nothing.
    async fn discard(&self, name: &str) -> StorageResult<()> {
        let _ = name;
        Ok(())
    }
}

/// Shared-storage deletion endpoint.
#[async_trait]
pub trait DeletionService: Send + Sync {
    /// Ask the platform to delete the entries at `locations`.
    async fn request_delete(&self, locations: &[Location]) -> DeletionResult<DeleteResponse>;

    /// Report the consent decision for a deferred request.
    ///
    /// Platforms that delete inside their own consent UI keep the default,
    /// which does nothing.
    async fn finalize(
        &self,
        token: &ConsentToken,
        decision: ConsentDecision,
    ) -> DeletionResult<()> {
        let _ = (token, decision);
        Ok(())
    }
}

/// User-facing consent step for deletions the application does not own.
#[async_trait]
pub trait ConsentFlow: Send + Sync {
    /// Present the consent step for `token` and return the user's answer.
    async fn resolve(&self, token: &ConsentToken) -> ConsentResult<ConsentDecision>;
}

/// User-facing permission prompt.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Request `capabilities`; the answer covers each requested capability.
    async fn request(&self, capabilities: &[Capability]) -> PermissionGrants;
}
