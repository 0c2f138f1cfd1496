//! Filesystem shared storage (read side) and private sandbox store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use vidsync_core::{
    BoxedReader, BoxedWriter, Location, PrivateStore, SharedStorage, StorageError, StorageResult,
};

use crate::error::{FsOpsError, FsOpsResult};
use crate::location::path_from_location;

/// Suffix of staged, not yet committed files in the private store.
pub const PARTIAL_SUFFIX: &str = ".partial";

pub(crate) fn is_partial_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(PARTIAL_SUFFIX)
}

/// Read-only view over a shared storage root.
#[derive(Debug, Clone)]
pub struct FsSharedStorage {
    root: PathBuf,
}

impl FsSharedStorage {
    /// Open the shared root at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be resolved.
    pub fn new(root: &Path) -> FsOpsResult<Self> {
        Ok(Self {
            root: root
                .canonicalize()
                .map_err(|source| FsOpsError::io("resolve_shared_root", root, source))?,
        })
    }

    /// Canonical shared root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SharedStorage for FsSharedStorage {
    async fn open_read(&self, location: &Location) -> StorageResult<BoxedReader> {
        let target = location.as_str();
        let path = path_from_location(location).ok_or_else(|| StorageError::UnsupportedLocation {
            target: target.to_string(),
        })?;
        let resolved = fs::canonicalize(&path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound {
                    target: target.to_string(),
                }
            } else {
                StorageError::io("resolve_source", target, err)
            }
        })?;
        if !resolved.starts_with(&self.root) {
            return Err(StorageError::OutsideRoot {
                target: target.to_string(),
            });
        }

        let file = fs::File::open(&resolved)
            .await
            .map_err(|err| StorageError::io("open_source", target, err))?;
        Ok(Box::new(file))
    }
}

/// Sandbox directory receiving mirrored copies.
///
/// `open_write` writes to `.<name>.partial`; `commit` renames it onto
/// `<name>`, replacing any earlier copy; `discard` removes it.
#[derive(Debug, Clone)]
pub struct FsPrivateStore {
    root: PathBuf,
}

impl FsPrivateStore {
    /// Open (creating when missing) the private store at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or resolved.
    pub fn new(root: &Path) -> FsOpsResult<Self> {
        std::fs::create_dir_all(root)
            .map_err(|source| FsOpsError::io("create_private_root", root, source))?;
        Ok(Self {
            root: root
                .canonicalize()
                .map_err(|source| FsOpsError::io("resolve_private_root", root, source))?,
        })
    }

    /// Canonical private root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a committed entry named `name` lives at.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidName` for names that would escape the store.
    pub fn entry_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    /// Names of committed entries, sorted; staged files are not listed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn entries(&self) -> StorageResult<Vec<String>> {
        let target = self.root.display().to_string();
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|err| StorageError::io("list_private", target.as_str(), err))?;
        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|err| StorageError::io("list_private", target.as_str(), err))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_partial_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn staging_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!(".{name}{PARTIAL_SUFFIX}")))
    }
}

#[async_trait]
impl PrivateStore for FsPrivateStore {
    async fn open_write(&self, name: &str) -> StorageResult<BoxedWriter> {
        let staging = self.staging_path(name)?;
        let file = fs::File::create(&staging)
            .await
            .map_err(|err| StorageError::io("open_destination", name, err))?;
        Ok(Box::new(file))
    }

    async fn commit(&self, name: &str) -> StorageResult<()> {
        let staging = self.staging_path(name)?;
        let target = self.root.join(name);
        fs::rename(&staging, &target).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound {
                    target: name.to_string(),
                }
            } else {
                StorageError::io("commit", name, err)
            }
        })?;
        debug!(name, path = %target.display(), "private entry committed");
        Ok(())
    }

    async fn discard(&self, name: &str) -> StorageResult<()> {
        let staging = self.staging_path(name)?;
        match fs::remove_file(&staging).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io("discard", name, err)),
        }
    }
}

fn validate_name(name: &str) -> StorageResult<()> {
    let reason = if name.is_empty() {
        Some("empty")
    } else if name == "." || name == ".." {
        Some("dot_segment")
    } else if name.contains(['/', '\\']) {
        Some("path_separator")
    } else if name.contains('\0') {
        Some("nul_byte")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(StorageError::InvalidName {
            name: name.to_string(),
            reason,
        })
    })
}
