//! Shared-counter mutex backend.
//!
//! The native handle is an entry in a process-wide create-if-absent table:
//! acquiring inserts the key, releasing removes it. There is no blocking
//! primitive underneath, so `lock()` falls back to the polling loop.
//!
//! Not recommended for high-contention paths: every waiter polls the table.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex as StdMutex, OnceLock,
    },
    time::Duration as StdDuration,
};

use crate::{
    error::{Error, Result},
    key::validate_key,
    lock::{RawLock, DEFAULT_POLL_INTERVAL},
};

static ENTRIES: OnceLock<StdMutex<HashSet<String>>> = OnceLock::new();

fn entries() -> &'static StdMutex<HashSet<String>> {
    ENTRIES.get_or_init(|| StdMutex::new(HashSet::new()))
}

/// Exclusive lock backed by a create-if-absent counter entry.
#[derive(Debug)]
pub struct CounterMutex {
    key: String,
    held: AtomicBool,
    poll_interval: StdDuration,
}

impl CounterMutex {
    /// Create an adapter for `key`.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            key,
            held: AtomicBool::new(false),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    /// The resource key this mutex guards.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Override the bounded-wait poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: StdDuration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl RawLock for CounterMutex {
    fn attempt_acquire(&self) -> Result<bool> {
        let mut table = entries()
            .lock()
            .map_err(|_| Error::poisoned("counter table"))?;
        if table.insert(self.key.clone()) {
            self.held.store(true, Ordering::Release);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn release(&self) -> Result<()> {
        if self.held.swap(false, Ordering::AcqRel) {
            entries()
                .lock()
                .map_err(|_| Error::poisoned("counter table"))?
                .remove(&self.key);
        }
        Ok(())
    }

    fn poll_interval(&self) -> StdDuration {
        self.poll_interval
    }
}

impl Drop for CounterMutex {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::debug!(key = %self.key, error = %err, "release on drop failed");
        }
    }
}
