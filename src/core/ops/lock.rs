//! core::ops::lock
//!
//! Exclusive lock on a sync store.
//!
//! # Architecture
//!
//! The store lock ensures only one sync run commits into a given store at
//! a time, across threads, engines and processes. It is an OS-level file
//! lock on `<repo>/.git/cloudgraph/lock`, so it lives outside the tracked
//! tree and is never staged.
//!
//! # Invariants
//!
//! - Lock must be held for the whole stage + commit step
//! - Lock is automatically released on drop (RAII pattern)
//! - [`SyncLock::acquire`] waits for the lock; [`SyncLock::try_acquire`]
//!   fails fast
//!
//! # Example
//!
//! ```ignore
//! use cloudgraph::core::ops::lock::SyncLock;
//! use cloudgraph::core::paths::StorePaths;
//!
//! let paths = StorePaths::with_defaults(root);
//! let lock = SyncLock::acquire(&paths)?;
//! // stage and commit
//! drop(lock);
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::StorePaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),

    /// Failed to release the lock.
    #[error("failed to release lock: {0}")]
    ReleaseFailed(String),
}

/// An exclusive lock on a sync store.
///
/// Released when dropped, even if the holder panics.
#[derive(Debug)]
pub struct SyncLock {
    path: PathBuf,
    /// `Some` while the lock is held.
    file: Option<File>,
}

impl SyncLock {
    /// Acquire the store lock, blocking until it is available.
    ///
    /// # Errors
    ///
    /// - [`LockError::CreateFailed`] if the lock file cannot be created
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &StorePaths) -> Result<Self, LockError> {
        let (path, file) = Self::open(paths)?;
        file.lock_exclusive()
            .map_err(|e| LockError::AcquireFailed(e.to_string()))?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    /// Attempt to acquire the store lock without waiting.
    ///
    /// Returns `Ok(None)` if another holder has it.
    pub fn try_acquire(paths: &StorePaths) -> Result<Option<Self>, LockError> {
        let (path, file) = Self::open(paths)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                path,
                file: Some(file),
            })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }

    fn open(paths: &StorePaths) -> Result<(PathBuf, File), LockError> {
        let state_dir = paths.state_dir();
        fs::create_dir_all(&state_dir).map_err(|e| {
            LockError::CreateFailed(format!("cannot create {}: {}", state_dir.display(), e))
        })?;

        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;
        Ok((path, file))
    }

    /// Check if the lock is currently held.
    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(&mut self) -> Result<(), LockError> {
        if let Some(file) = self.file.take() {
            file.unlock()
                .map_err(|e| LockError::ReleaseFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        // Best-effort release on drop
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
