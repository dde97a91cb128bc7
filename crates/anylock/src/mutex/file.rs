//! Cross-process file-lock backend.
//!
//! The native handle is a file descriptor holding an advisory exclusive lock
//! (`flock` on unix, `LockFileEx` on Windows, via `fs2`). The key maps to
//! `<lock_dir>/<sanitized-key>.lock`; independent instances for the same key
//! open the same path and contend through the OS.
//!
//! Lock files are NOT deleted on release - removing them reopens the
//! time-of-check race on the next acquisition.

use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    time::Duration as StdDuration,
};

use fs2::FileExt;

use crate::{
    error::{Error, Result},
    key::{safe_filename, validate_key},
    lock::{RawLock, DEFAULT_POLL_INTERVAL},
};

/// Exclusive cross-process lock bound to a lock file.
#[derive(Debug)]
pub struct FileMutex {
    key: String,
    path: PathBuf,
    file: File,
    poll_interval: StdDuration,
}

impl FileMutex {
    /// Create an adapter for `key` with lock files in the system temp
    /// directory.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        Self::in_dir(key, std::env::temp_dir())
    }

    /// Create an adapter for `key` with lock files in `lock_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockFileOpen`] naming the attempted path when the
    /// lock file cannot be created - missing directory, permissions, or
    /// descriptor exhaustion.
    pub fn in_dir(key: impl Into<String>, lock_dir: impl Into<PathBuf>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;

        let path = lock_dir
            .into()
            .join(format!("{}.lock", safe_filename(&key)));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| Error::LockFileOpen {
                path: path.clone(),
                source: err.into(),
            })?;

        tracing::debug!(path = %path.display(), "opened lock file");
        Ok(Self {
            key,
            path,
            file,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// The resource key this mutex guards.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path of the lock file backing this mutex.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Override the bounded-wait poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: StdDuration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl RawLock for FileMutex {
    fn attempt_acquire(&self) -> Result<bool> {
        match self.file.try_lock_exclusive() {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(err) => Err(Error::FileLockOperation {
                path: self.path.clone(),
                source: err.into(),
            }),
        }
    }

    fn blocking_acquire(&self) -> Result<()> {
        self.file
            .lock_exclusive()
            .map_err(|err| Error::FileLockOperation {
                path: self.path.clone(),
                source: err.into(),
            })
    }

    fn release(&self) -> Result<()> {
        // LOCK_UN on a descriptor that holds nothing is itself a no-op, and
        // other instances hold the lock through their own descriptors.
        FileExt::unlock(&self.file).map_err(|err| Error::FileLockOperation {
            path: self.path.clone(),
            source: err.into(),
        })
    }

    fn poll_interval(&self) -> StdDuration {
        self.poll_interval
    }
}
