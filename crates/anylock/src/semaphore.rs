//! Counting semaphore: bounded concurrent access to a named resource.
//!
//! Differs from a mutex only in admitting up to `max_acquire` holders at a
//! time. The native handle is a permit counter + condvar core shared between
//! all instances constructed for the same key in this process; the first
//! construction of a key fixes its capacity.
//!
//! The condvar offers a native timed wait, so bounded waits here bypass the
//! polling loop while keeping its external behavior: a zero-length duration
//! is a single attempt, an eternal one never gives up.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Condvar, Mutex as StdMutex, OnceLock,
    },
    time::Instant,
};

use crate::{
    duration::Duration,
    error::{Error, Result},
    key::validate_key,
    lock::Lock,
};

/// Shared native handle: available permits + capacity, one per key.
#[derive(Debug)]
struct SemaphoreCore {
    permits: StdMutex<u32>,
    wake: Condvar,
    max_acquire: u32,
}

type Registry = StdMutex<HashMap<String, Arc<SemaphoreCore>>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| StdMutex::new(HashMap::new()))
}

/// Lock admitting up to a fixed number of concurrent holders.
#[derive(Debug)]
pub struct Semaphore {
    key: String,
    core: Arc<SemaphoreCore>,
    held: AtomicU32,
}

impl Semaphore {
    /// Create an adapter for `key` admitting `max_acquire` holders.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroMaxAcquire`] when `max_acquire` is zero. When
    /// other instances already track `key`, their capacity wins and
    /// `max_acquire` is ignored.
    pub fn new(key: impl Into<String>, max_acquire: u32) -> Result<Self> {
        let key = key.into();
        validate_key(&key)?;
        if max_acquire == 0 {
            return Err(Error::ZeroMaxAcquire);
        }

        let core = {
            let mut cores = registry()
                .lock()
                .map_err(|_| Error::poisoned("semaphore registry"))?;
            Arc::clone(cores.entry(key.clone()).or_insert_with(|| {
                Arc::new(SemaphoreCore {
                    permits: StdMutex::new(max_acquire),
                    wake: Condvar::new(),
                    max_acquire,
                })
            }))
        };

        Ok(Self {
            key,
            core,
            held: AtomicU32::new(0),
        })
    }

    /// Mutex-shaped semaphore: exactly one holder.
    pub fn binary(key: impl Into<String>) -> Result<Self> {
        Self::new(key, 1)
    }

    /// The resource key this semaphore guards.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Number of concurrent holders this semaphore admits.
    #[must_use]
    pub fn max_acquire(&self) -> u32 {
        self.core.max_acquire
    }

    fn take_permit(&self, count: &mut u32) {
        *count -= 1;
        self.held.fetch_add(1, Ordering::AcqRel);
    }
}

impl Lock for Semaphore {
    fn lock(&self) -> Result<()> {
        let mut permits = self
            .core
            .permits
            .lock()
            .map_err(|_| Error::poisoned("semaphore permits"))?;
        while *permits == 0 {
            permits = self
                .core
                .wake
                .wait(permits)
                .map_err(|_| Error::poisoned("semaphore permits"))?;
        }
        self.take_permit(&mut permits);
        Ok(())
    }

    fn try_lock(&self) -> Result<bool> {
        let mut permits = self
            .core
            .permits
            .lock()
            .map_err(|_| Error::poisoned("semaphore permits"))?;
        if *permits == 0 {
            Ok(false)
        } else {
            self.take_permit(&mut permits);
            Ok(true)
        }
    }

    /// Native timed wait on the condvar; no polling loop involved.
    fn try_lock_for(&self, duration: Duration) -> Result<bool> {
        let deadline = duration.deadline_after(Instant::now());
        let mut permits = self
            .core
            .permits
            .lock()
            .map_err(|_| Error::poisoned("semaphore permits"))?;
        loop {
            if *permits > 0 {
                self.take_permit(&mut permits);
                return Ok(true);
            }
            match deadline.remaining(Instant::now()) {
                None => {
                    permits = self
                        .core
                        .wake
                        .wait(permits)
                        .map_err(|_| Error::poisoned("semaphore permits"))?;
                }
                Some(remaining) if remaining.is_zero() => return Ok(false),
                Some(remaining) => {
                    let (guard, _timed_out) = self
                        .core
                        .wake
                        .wait_timeout(permits, remaining)
                        .map_err(|_| Error::poisoned("semaphore permits"))?;
                    // Loop re-checks both permits and the deadline, which
                    // also covers spurious wakeups.
                    permits = guard;
                }
            }
        }
    }

    fn unlock(&self) {
        // Give back only permits this instance actually holds, and never
        // push the pool above its capacity.
        let took = self
            .held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                held.checked_sub(1)
            });
        if took.is_err() {
            return;
        }

        match self.core.permits.lock() {
            Ok(mut permits) => {
                if *permits < self.core.max_acquire {
                    *permits += 1;
                    self.core.wake.notify_one();
                }
            }
            Err(_) => {
                tracing::warn!(key = %self.key, "semaphore permits poisoned during unlock");
            }
        }
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        for _ in 0..self.held.load(Ordering::Acquire) {
            self.unlock();
        }
    }
}
