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

//! Filesystem bindings for the media synchronization workflow and the
//! mirror pipeline that copies shared videos into private storage.
//!
//! Layout: `mirror.rs` (`StorageMirror`), `index.rs` (`DirectoryMediaIndex`),
//! `storage.rs` (`FsSharedStorage`, `FsPrivateStore`), `deletion.rs`
//! (`FsDeletionService`), `location.rs` (`file://` helpers), `error.rs`.

pub mod deletion;
pub mod error;
pub mod index;
pub mod location;
pub mod mirror;
pub mod storage;

pub use deletion::FsDeletionService;
pub use error::{FsOpsError, FsOpsResult};
pub use index::DirectoryMediaIndex;
pub use location::{file_location, path_from_location};
pub use mirror::{MirrorFailure, MirrorReport, MirrorStage, MirroredItem, StorageMirror};
pub use storage::{FsPrivateStore, FsSharedStorage, PARTIAL_SUFFIX};
