//! Mutex backends: one capability interface, a closed set of variants.
//!
//! Each variant owns a distinct kind of native handle:
//!
//! - [`ThreadMutex`] - in-process mutex + condvar pair
//! - [`FileMutex`] - advisory exclusive file lock
//! - [`CounterMutex`] - create-if-absent entry in a shared counter table
//! - [`KernelMutex`] - System V semaphore (unix only)
//!
//! [`Mutex`] wraps them as tagged variants selected at construction time,
//! normally through [`LockSettings`](crate::settings::LockSettings) - never
//! by runtime type inspection.

mod counter;
mod file;
mod kernel;
mod thread;

pub use counter::CounterMutex;
pub use file::FileMutex;
pub use kernel::KernelMutex;
pub use thread::ThreadMutex;

use crate::{
    duration::Duration,
    error::Result,
    lock::Lock,
    settings::{BackendKind, LockSettings},
};

/// Exclusive lock over a named resource, backend chosen at construction.
#[derive(Debug)]
pub enum Mutex {
    /// In-process native mutex.
    Thread(ThreadMutex),
    /// Cross-process advisory file lock.
    File(FileMutex),
    /// Shared counter table entry.
    Counter(CounterMutex),
    /// System V kernel semaphore.
    Kernel(KernelMutex),
}

impl Mutex {
    /// Construct the backend selected by `settings` for `key`.
    pub fn with_settings(key: impl Into<String>, settings: &LockSettings) -> Result<Self> {
        settings.validate()?;
        let poll_interval = settings.poll_interval();
        match settings.backend {
            BackendKind::Thread => ThreadMutex::new(key)
                .map(|mutex| Self::Thread(mutex.with_poll_interval(poll_interval))),
            BackendKind::File => FileMutex::in_dir(key, settings.lock_dir_or_default())
                .map(|mutex| Self::File(mutex.with_poll_interval(poll_interval))),
            BackendKind::Counter => CounterMutex::new(key)
                .map(|mutex| Self::Counter(mutex.with_poll_interval(poll_interval))),
            BackendKind::Kernel => KernelMutex::new(key)
                .map(|mutex| Self::Kernel(mutex.with_poll_interval(poll_interval))),
        }
    }

    /// Thread-backend mutex with default tuning.
    pub fn thread(key: impl Into<String>) -> Result<Self> {
        ThreadMutex::new(key).map(Self::Thread)
    }

    /// File-backend mutex with lock files in the system temp directory.
    pub fn file(key: impl Into<String>) -> Result<Self> {
        FileMutex::new(key).map(Self::File)
    }

    /// Counter-backend mutex with default tuning.
    pub fn counter(key: impl Into<String>) -> Result<Self> {
        CounterMutex::new(key).map(Self::Counter)
    }

    /// Kernel-backend mutex (unix only).
    pub fn kernel(key: impl Into<String>) -> Result<Self> {
        KernelMutex::new(key).map(Self::Kernel)
    }

    /// The resource key this mutex guards.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Thread(mutex) => mutex.key(),
            Self::File(mutex) => mutex.key(),
            Self::Counter(mutex) => mutex.key(),
            Self::Kernel(mutex) => mutex.key(),
        }
    }

    /// Which backend variant this mutex was constructed with.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        match self {
            Self::Thread(_) => BackendKind::Thread,
            Self::File(_) => BackendKind::File,
            Self::Counter(_) => BackendKind::Counter,
            Self::Kernel(_) => BackendKind::Kernel,
        }
    }
}

impl Lock for Mutex {
    fn lock(&self) -> Result<()> {
        match self {
            Self::Thread(mutex) => mutex.lock(),
            Self::File(mutex) => mutex.lock(),
            Self::Counter(mutex) => mutex.lock(),
            Self::Kernel(mutex) => mutex.lock(),
        }
    }

    fn try_lock(&self) -> Result<bool> {
        match self {
            Self::Thread(mutex) => mutex.try_lock(),
            Self::File(mutex) => mutex.try_lock(),
            Self::Counter(mutex) => mutex.try_lock(),
            Self::Kernel(mutex) => mutex.try_lock(),
        }
    }

    fn try_lock_for(&self, duration: Duration) -> Result<bool> {
        match self {
            Self::Thread(mutex) => mutex.try_lock_for(duration),
            Self::File(mutex) => mutex.try_lock_for(duration),
            Self::Counter(mutex) => mutex.try_lock_for(duration),
            Self::Kernel(mutex) => mutex.try_lock_for(duration),
        }
    }

    fn unlock(&self) {
        match self {
            Self::Thread(mutex) => mutex.unlock(),
            Self::File(mutex) => mutex.unlock(),
            Self::Counter(mutex) => mutex.unlock(),
            Self::Kernel(mutex) => mutex.unlock(),
        }
    }
}
