//! Scratch storage trees for filesystem-backed tests.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;
use vidsync_config::AppConfig;

/// Temporary directory holding a shared root and a private root side by side.
pub struct StorageFixture {
    _temp: TempDir,
    shared: PathBuf,
    private: PathBuf,
}

impl StorageFixture {
    /// Create an empty shared root and an empty private root.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let shared = temp.path().join("shared");
        let private = temp.path().join("private");
        fs::create_dir_all(&shared)?;
        fs::create_dir_all(&private)?;
        Ok(Self {
            shared: shared.canonicalize()?,
            private: private.canonicalize()?,
            _temp: temp,
        })
    }

    /// Shared root.
    #[must_use]
    pub fn shared(&self) -> &Path {
        &self.shared
    }

    /// Private root.
    #[must_use]
    pub fn private(&self) -> &Path {
        &self.private
    }

    /// Write `bytes` to `relative` under the shared root, creating parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_video(&self, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.shared.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Sorted file names directly under the private root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn private_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.private)? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Configuration pointing at this fixture's roots.
    #[must_use]
    pub fn config(&self, owned_roots: &[&str]) -> AppConfig {
        AppConfig {
            shared_root: self.shared.clone(),
            private_root: self.private.clone(),
            owned_roots: owned_roots.iter().map(PathBuf::from).collect(),
            event_capacity: 64,
            ..AppConfig::default()
        }
    }
}
