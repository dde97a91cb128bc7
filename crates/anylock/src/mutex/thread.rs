//! Thread-level mutex backend.
//!
//! The native handle is a `Mutex<bool>` + `Condvar` pair, shared between all
//! adapter instances constructed with the same key through a process-wide
//! registry, so two instances for `"alpha"` contend for the same primitive.
//! The condvar gives this backend a native blocking acquire; bounded waits
//! still go through the shared polling loop.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex as StdMutex, OnceLock,
    },
    time::Duration as StdDuration,
};

use crate::{
    error::{Error, Result},
    key::validate_key,
    lock::{RawLock, DEFAULT_POLL_INTERVAL},
};

/// Shared native handle: one per key, process-wide.
#[derive(Debug, Default)]
struct ThreadCore {
    state: StdMutex<bool>,
    wake: Condvar,
}

type Registry = StdMutex<HashMap<String, Arc<ThreadCore>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| StdMutex::new(HashMap::new()))
}

/// Exclusive in-process lock bound to a string key.
#[derive(Debug)]
pub struct ThreadMutex {
    key: String,
    core: Arc<ThreadCore>,
    held: AtomicBool,
    poll_interval: StdDuration,
}

impl ThreadMutex {
    /// Create an adapter for `key`, sharing the underlying primitive with
    /// any other instance created for the same key in this process.
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;

        let core = {
            let mut entries = registry()
                .lock()
                .map_err(|_| Error::poisoned("thread mutex registry"))?;
            Arc::clone(entries.entry(key.clone()).or_default())
        };

        Ok(Self {
            key,
            core,
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

impl RawLock for ThreadMutex {
    fn attempt_acquire(&self) -> Result<bool> {
        let mut state = self
            .core
            .state
            .lock()
            .map_err(|_| Error::poisoned("thread mutex state"))?;
        if *state {
            Ok(false)
        } else {
            *state = true;
            self.held.store(true, Ordering::Release);
            Ok(true)
        }
    }

    fn blocking_acquire(&self) -> Result<()> {
        let mut state = self
            .core
            .state
            .lock()
            .map_err(|_| Error::poisoned("thread mutex state"))?;
        while *state {
            state = self
                .core
                .wake
                .wait(state)
                .map_err(|_| Error::poisoned("thread mutex state"))?;
        }
        *state = true;
        self.held.store(true, Ordering::Release);
        Ok(())
    }

    fn release(&self) -> Result<()> {
        // Only release what this instance acquired: a double unlock, or an
        // unlock racing another instance's acquisition, stays a no-op.
        if self.held.swap(false, Ordering::AcqRel) {
            let mut state = self
                .core
                .state
                .lock()
                .map_err(|_| Error::poisoned("thread mutex state"))?;
            *state = false;
            self.core.wake.notify_one();
        }
        Ok(())
    }

    fn poll_interval(&self) -> StdDuration {
        self.poll_interval
    }
}

impl Drop for ThreadMutex {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::debug!(key = %self.key, error = %err, "release on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{duration::Duration, lock::Lock};

    #[test]
    fn test_same_key_shares_the_primitive() -> Result<()> {
        let a = ThreadMutex::new("thread-shared")?;
        let b = ThreadMutex::new("thread-shared")?;

        assert!(a.try_lock()?);
        assert!(!b.try_lock()?);
        a.unlock();
        assert!(b.try_lock()?);
        b.unlock();
        Ok(())
    }

    #[test]
    fn test_different_keys_do_not_contend() -> Result<()> {
        let a = ThreadMutex::new("thread-a")?;
        let b = ThreadMutex::new("thread-b")?;

        assert!(a.try_lock()?);
        assert!(b.try_lock()?);
        a.unlock();
        b.unlock();
        Ok(())
    }

    #[test]
    fn test_unlock_when_not_held_is_a_no_op() -> Result<()> {
        let a = ThreadMutex::new("thread-noop")?;
        a.unlock();
        a.unlock();
        assert!(a.try_lock()?);
        a.unlock();
        Ok(())
    }

    #[test]
    fn test_double_unlock_grants_no_phantom_release() -> Result<()> {
        let a = ThreadMutex::new("thread-phantom")?;
        let b = ThreadMutex::new("thread-phantom")?;
        let c = ThreadMutex::new("thread-phantom")?;

        assert!(a.try_lock()?);
        a.unlock();
        assert!(b.try_lock()?);
        // A second unlock from `a` must not release `b`'s hold.
        a.unlock();
        assert!(!c.try_lock()?);
        b.unlock();
        Ok(())
    }

    #[test]
    fn test_drop_releases_a_held_lock() -> Result<()> {
        let b = ThreadMutex::new("thread-drop")?;
        {
            let a = ThreadMutex::new("thread-drop")?;
            assert!(a.try_lock()?);
            assert!(!b.try_lock()?);
        }
        assert!(b.try_lock()?);
        b.unlock();
        Ok(())
    }

    #[test]
    fn test_bounded_wait_observes_release() -> Result<()> {
        let a = ThreadMutex::new("thread-window")?;
        let b = ThreadMutex::new("thread-window")?;
        assert!(a.try_lock()?);

        std::thread::scope(|scope| -> Result<()> {
            scope.spawn(|| {
                std::thread::sleep(StdDuration::from_millis(10));
                a.unlock();
            });
            assert!(b.try_lock_for(Duration::from_millis(500.0)?)?);
            b.unlock();
            Ok(())
        })
    }
}
