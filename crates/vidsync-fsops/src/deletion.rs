//! Filesystem deletion service.
//!
//! Entries under an owned root are deleted on request. Anything else is held
//! behind a consent token until the decision comes back through `finalize`.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;
use vidsync_core::{
    ConsentDecision, ConsentToken, DeleteResponse, DeletionError, DeletionResult,
    DeletionService, Location,
};

use crate::error::{FsOpsError, FsOpsResult};
use crate::location::path_from_location;

/// Deletion endpoint over a shared storage root.
#[derive(Debug, Clone)]
pub struct FsDeletionService {
    root: PathBuf,
    owned_roots: Vec<PathBuf>,
    pending: Arc<Mutex<HashMap<Uuid, Vec<PathBuf>>>>,
}

impl FsDeletionService {
    /// Build a service for `shared_root`; relative `owned_roots` resolve
    /// against it.
    ///
    /// # Errors
    ///
    /// Returns an error if the shared root cannot be resolved or an owned root
    /// lies outside it.
    pub fn new(shared_root: &Path, owned_roots: &[PathBuf]) -> FsOpsResult<Self> {
        let root = shared_root
            .canonicalize()
            .map_err(|source| FsOpsError::io("resolve_shared_root", shared_root, source))?;

        let mut owned = Vec::with_capacity(owned_roots.len());
        for candidate in owned_roots {
            let joined = if candidate.is_absolute() {
                candidate.clone()
            } else {
                root.join(candidate)
            };
            let resolved = joined.canonicalize().unwrap_or(joined);
            if !resolved.starts_with(&root) {
                return Err(FsOpsError::InvalidInput {
                    field: "owned_roots",
                    reason: "outside_shared_root",
                    value: Some(candidate.display().to_string()),
                });
            }
            owned.push(resolved);
        }

        Ok(Self {
            root,
            owned_roots: owned,
            pending: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Number of deletions awaiting a consent decision.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<Uuid, Vec<PathBuf>>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn resolve(&self, location: &Location) -> DeletionResult<PathBuf> {
        let path = path_from_location(location).ok_or_else(|| DeletionError::Rejected {
            reason: "unsupported_location",
            location: Some(location.to_string()),
        })?;
        let escapes = path
            .components()
            .any(|component| component == Component::ParentDir);
        if escapes || !path.starts_with(&self.root) {
            return Err(DeletionError::Rejected {
                reason: "outside_shared_root",
                location: Some(location.to_string()),
            });
        }
        Ok(path)
    }

    fn is_owned(&self, path: &Path) -> bool {
        self.owned_roots.iter().any(|owned| path.starts_with(owned))
    }
}

#[async_trait]
impl DeletionService for FsDeletionService {
    async fn request_delete(&self, locations: &[Location]) -> DeletionResult<DeleteResponse> {
        let paths = locations
            .iter()
            .map(|location| self.resolve(location))
            .collect::<DeletionResult<Vec<_>>>()?;

        if paths.iter().all(|path| self.is_owned(path)) {
            remove_all(&paths).await?;
            info!(count = paths.len(), "owned entries deleted");
            return Ok(DeleteResponse::Granted);
        }

        let token = ConsentToken::issue(locations.to_vec());
        self.lock_pending().insert(token.id, paths);
        debug!(token = %token.id, count = locations.len(), "deletion awaiting consent");
        Ok(DeleteResponse::ConsentRequired(token))
    }

    async fn finalize(
        &self,
        token: &ConsentToken,
        decision: ConsentDecision,
    ) -> DeletionResult<()> {
        let paths = self
            .lock_pending()
            .remove(&token.id)
            .ok_or(DeletionError::UnknownToken { token: token.id })?;

        match decision {
            ConsentDecision::Confirmed => {
                remove_all(&paths).await?;
                info!(token = %token.id, count = paths.len(), "consented entries deleted");
            }
            ConsentDecision::Denied => {
                debug!(token = %token.id, "consent denied; entries kept");
            }
        }
        Ok(())
    }
}

async fn remove_all(paths: &[PathBuf]) -> DeletionResult<()> {
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "entry already gone");
            }
            Err(source) => {
                return Err(DeletionError::Io {
                    operation: "remove_entry",
                    location: path.display().to_string(),
                    source,
                });
            }
        }
    }
    Ok(())
}
