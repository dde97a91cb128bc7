//! Error types for anylock with two categories:
//!
//! - **Invalid-argument errors**: bad durations, capacities, keys, settings
//! - **Concurrency errors**: the native handle could not be created, opened,
//!   or operated on
//!
//! Acquisition non-success is NOT an error: `try_lock` returning `false` is a
//! normal outcome callers branch on. Release failures during cleanup are
//! logged and swallowed, never propagated.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for lock operations.
///
/// All failure modes are represented as distinct variants with full context.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Duration constructed with a negative (or non-finite) amount
    #[error("duration amount must be a finite non-negative number, got {amount}")]
    InvalidDurationAmount { amount: f64 },

    /// Semaphore constructed with a zero capacity
    #[error("max_acquire must be a positive integer, got 0")]
    ZeroMaxAcquire,

    /// Lock settings failed validation or parsing
    #[error("invalid lock settings: {reason}")]
    InvalidSettings { reason: String },

    /// Resource key is unusable for any backend
    #[error("invalid lock key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Lock file could not be opened or created
    #[error("unable to create lock file at {}: {}", .path.display(), .source)]
    LockFileOpen {
        path: PathBuf,
        #[source]
        source: IoErrorKind,
    },

    /// File locking operation failed (other than ordinary contention)
    #[error("file locking failed for {}: {}", .path.display(), .source)]
    FileLockOperation {
        path: PathBuf,
        #[source]
        source: IoErrorKind,
    },

    /// Kernel semaphore could not be created or opened
    #[error("unable to create kernel semaphore with identifier {identifier}: {source}")]
    KernelSemaphoreCreate {
        identifier: i32,
        #[source]
        source: IoErrorKind,
    },

    /// Kernel semaphore operation failed (other than ordinary contention)
    #[error("kernel semaphore operation failed for identifier {identifier}: {source}")]
    KernelSemaphoreOp {
        identifier: i32,
        #[source]
        source: IoErrorKind,
    },

    /// Requested backend cannot be instantiated on this host
    #[error("backend \"{backend}\" is not available on this host: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    /// Shared in-process state was poisoned by a panicking holder
    #[error("native handle state poisoned: {0}")]
    HandlePoisoned(String),
}

// Convenience constructors using functional patterns
impl Error {
    /// Create an invalid-settings error.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            reason: reason.into(),
        }
    }

    /// Create an invalid-key error.
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a backend-unavailable error.
    pub fn backend_unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Create a poisoned-handle error.
    pub fn poisoned(what: impl Into<String>) -> Self {
        Self::HandlePoisoned(what.into())
    }

    /// `true` for errors caused by a bad argument from the caller.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidDurationAmount { .. }
                | Self::ZeroMaxAcquire
                | Self::InvalidSettings { .. }
        )
    }

    /// `true` for errors raised by the underlying native primitive.
    #[must_use]
    pub const fn is_concurrency(&self) -> bool {
        !self.is_invalid_argument()
    }
}

/// IO error kinds (cloneable, no source chain issues)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    NotFound,
    PermissionDenied,
    AlreadyExists,
    WouldBlock,
    InvalidInput,
    Interrupted,
    OutOfMemory,
    Other(String),
}

impl std::fmt::Display for IoErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::WouldBlock => write!(f, "would block"),
            Self::InvalidInput => write!(f, "invalid input"),
            Self::Interrupted => write!(f, "interrupted"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IoErrorKind {}

impl From<io::Error> for IoErrorKind {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::WouldBlock => Self::WouldBlock,
            io::ErrorKind::InvalidInput => Self::InvalidInput,
            io::ErrorKind::Interrupted => Self::Interrupted,
            io::ErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::Other(err.to_string()),
        }
    }
}
