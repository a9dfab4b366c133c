//! Advisory lock serializing config rewrites across processes

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Exclusive lock held for the lifetime of the guard
pub struct ConfigLock {
    file: File,
    path: PathBuf,
}

impl ConfigLock {
    /// Block until the lock file at `path` is held exclusively
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| Error::Lock(format!("{}: {}", path.display(), e)))?;

        file.lock()
            .map_err(|e| Error::Lock(format!("{}: {}", path.display(), e)))?;
        trace!("Locked {}", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        trace!("Unlocked {}", self.path.display());
    }
}
