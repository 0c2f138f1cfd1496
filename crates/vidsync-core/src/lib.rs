#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Platform-agnostic media synchronization interfaces and DTOs.
//!
//! Layout: `model/` (records, queries, deletion protocol types), `service/`
//! (traits implemented by platform bindings), `index.rs` (`MediaIndexReader`),
//! `deletion.rs` (`DeletionRequester`), `error.rs` (error taxonomy).

pub mod deletion;
pub mod error;
pub mod index;
pub mod model;
pub mod service;

pub use deletion::DeletionRequester;
pub use error::{
    ConsentError, ConsentResult, DeletionError, DeletionResult, IndexError, IndexResult,
    StorageError, StorageResult,
};
pub use index::MediaIndexReader;
pub use model::{
    Capability, ConsentDecision, ConsentToken, DeleteResponse, DeletionOutcome, IndexRow,
    Location, MediaKind, MediaQuery, PendingConsent, PermissionGrants, RecordId, SortOrder,
    VideoRecord,
};
pub use service::{
    BoxedReader, BoxedWriter, ConsentFlow, DeletionService, MediaIndex, PermissionGate,
    PrivateStore, SharedStorage,
};
