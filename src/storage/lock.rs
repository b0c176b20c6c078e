use std::{
    fs::{File, OpenOptions},
    path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::storage::StorageError;

/// Exclusive advisory lock held for a whole load-modify-save cycle.
///
/// Released when dropped.
pub struct WriteLock {
    file: File,
    path: PathBuf,
}

impl WriteLock {
    /// Blocks until no other process holds the lock at `path`
    pub fn acquire(path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| StorageError::LockFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        file.lock_exclusive().map_err(|e| StorageError::LockFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        log::debug!("Acquired write lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            log::warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskdeck.lock");

        let lock = WriteLock::acquire(&path).unwrap();
        let other = File::open(&path).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(lock);
        assert!(other.try_lock_exclusive().is_ok());
    }
}
