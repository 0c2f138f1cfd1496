//! Directory-backed media index.
//!
//! Walks the shared root, keeps files whose path (relative to the root)
//! matches one of the configured video globs, and numbers them in walk order.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use vidsync_core::{
    IndexError, IndexResult, IndexRow, Location, MediaIndex, MediaKind, MediaQuery, RecordId,
    SortOrder,
};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};
use crate::location::file_location;
use crate::storage::is_partial_name;

const VIDEO_COLLECTION: &str = "video";
const UNRESOLVED_SCHEME: &str = "vidsync-index://";

/// Media index over a directory tree.
#[derive(Clone)]
pub struct DirectoryMediaIndex {
    root: PathBuf,
    patterns: GlobSet,
    paths: Arc<Mutex<HashMap<RecordId, PathBuf>>>,
}

impl DirectoryMediaIndex {
    /// Build an index over `root` matching `patterns`.
    ///
    /// # Errors
    ///
    /// Returns an error if no pattern is given, a pattern does not compile,
    /// or the root cannot be resolved.
    pub fn new(root: &Path, patterns: &[String]) -> FsOpsResult<Self> {
        Ok(Self {
            root: root
                .canonicalize()
                .map_err(|source| FsOpsError::io("resolve_shared_root", root, source))?,
            patterns: build_globset(patterns)?,
            paths: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Canonical root scanned by this index.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock_paths(&self) -> MutexGuard<'_, HashMap<RecordId, PathBuf>> {
        self.paths
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl MediaIndex for DirectoryMediaIndex {
    async fn query(&self, query: &MediaQuery) -> IndexResult<Vec<IndexRow>> {
        let MediaKind::Video = query.kind;
        let root = self.root.clone();
        let patterns = self.patterns.clone();
        let scanned = tokio::task::spawn_blocking(move || scan(&root, &patterns))
            .await
            .map_err(|err| IndexError::Unavailable {
                collection: VIDEO_COLLECTION,
                detail: err.to_string(),
            })??;

        let mut rows = Vec::with_capacity(scanned.len());
        {
            let mut paths = self.lock_paths();
            paths.clear();
            for (row, path) in scanned {
                paths.insert(row.id, path);
                rows.push(row);
            }
        }

        match query.sort {
            SortOrder::NameAscending => rows.sort_by(|left, right| left.name.cmp(&right.name)),
        }
        debug!(root = %self.root.display(), count = rows.len(), "directory index scanned");
        Ok(rows)
    }

    fn location_for(&self, id: RecordId) -> Location {
        self.lock_paths().get(&id).map_or_else(
            || Location::new(format!("{UNRESOLVED_SCHEME}{id}")),
            |path| file_location(path),
        )
    }
}

fn scan(root: &Path, patterns: &GlobSet) -> IndexResult<Vec<(IndexRow, PathBuf)>> {
    let mut found = Vec::new();
    let mut next_id = 1_u64;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(root_failure(err)),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry under shared root");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if !patterns.is_match(relative) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_partial_name(&name) {
            continue;
        }
        let size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!(
                    path = %entry.path().display(),
                    error = %err,
                    "skipping entry without metadata"
                );
                continue;
            }
        };
        let relative_path = relative
            .parent()
            .map(|parent| parent.to_string_lossy().into_owned())
            .filter(|parent| !parent.is_empty());

        let id = RecordId(next_id);
        next_id += 1;
        found.push((
            IndexRow {
                id,
                name,
                size,
                relative_path,
            },
            entry.path().to_path_buf(),
        ));
    }

    Ok(found)
}

fn root_failure(err: walkdir::Error) -> IndexError {
    let kind = err.io_error().map(io::Error::kind);
    match kind {
        Some(io::ErrorKind::PermissionDenied) => IndexError::AccessDenied {
            collection: VIDEO_COLLECTION,
        },
        _ => IndexError::Unavailable {
            collection: VIDEO_COLLECTION,
            detail: err.to_string(),
        },
    }
}

fn build_globset(patterns: &[String]) -> FsOpsResult<GlobSet> {
    if patterns.is_empty() {
        return Err(FsOpsError::InvalidInput {
            field: "video_patterns",
            reason: "empty",
            value: None,
        });
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern)
                .map_err(|source| FsOpsError::pattern("compile_pattern", pattern.clone(), source))?,
        );
    }
    builder
        .build()
        .map_err(|source| FsOpsError::pattern("build_globset", patterns.join(","), source))
}
