//! The lock capability contract.
//!
//! Two layers:
//!
//! - [`RawLock`] is what a backend adapter provides: a non-blocking
//!   `attempt_acquire`, an optional native `blocking_acquire` (backends
//!   without one inherit the polling loop), and `release`.
//! - [`Lock`] is what callers see: `lock` waits forever, `try_lock` attempts
//!   exactly once, `try_lock_for` waits up to a [`Duration`], and `unlock`
//!   is fire-and-forget. Every [`RawLock`] gets this surface through a
//!   blanket implementation of the canonical bounded-wait algorithm; a
//!   backend with a native timed wait (the counting semaphore) implements
//!   [`Lock`] directly with identical external behavior.
//!
//! `try_lock` and `lock` are deliberately two differently-named operations:
//! an absent duration means "try once", never "wait forever".
//!
//! # Guarantees
//!
//! - `try_lock_for` performs at least one attempt even when the deadline has
//!   already passed, and performs exactly one for a zero-length duration.
//! - `unlock` never fails: release errors are logged and swallowed so that
//!   scope-exit cleanup cannot mask an unwind in progress.
//! - [`LockGuard`] releases on every exit path, including panics.

mod poll;

use std::time::{Duration as StdDuration, Instant};

use crate::{duration::Duration, error::Result};

pub(crate) use poll::{acquire_until, DEFAULT_POLL_INTERVAL};

/// Capability interface a backend adapter implements on top of its native
/// synchronization handle.
///
/// One adapter instance owns exactly one native handle; dropping the adapter
/// returns the handle to the system.
pub trait RawLock {
    /// One non-blocking acquisition attempt. `Ok(true)` on success.
    fn attempt_acquire(&self) -> Result<bool>;

    /// Suspend the caller until acquired.
    ///
    /// The default implementation polls with no deadline; backends whose
    /// primitive can block natively override this.
    fn blocking_acquire(&self) -> Result<()> {
        acquire_until(
            || self.attempt_acquire(),
            crate::duration::Deadline::Never,
            self.poll_interval(),
        )
        .map(|_| ())
    }

    /// Release previously-acquired access. Safe to call when not held.
    fn release(&self) -> Result<()>;

    /// Interval between attempts when this backend falls back to polling.
    fn poll_interval(&self) -> StdDuration {
        DEFAULT_POLL_INTERVAL
    }
}

/// Caller-facing lock surface.
pub trait Lock {
    /// Acquire, blocking the calling thread until access is obtained.
    fn lock(&self) -> Result<()>;

    /// A single immediate attempt: `Ok(true)` if access was free.
    ///
    /// This is "try once", not "wait forever" - use [`Lock::lock`] to wait.
    fn try_lock(&self) -> Result<bool>;

    /// Attempt to acquire within `duration`.
    ///
    /// Returns `Ok(true)` as soon as access is obtained, `Ok(false)` once
    /// the deadline passes. A zero-length duration attempts exactly once
    /// without sleeping; [`Duration::ETERNAL`] never returns `Ok(false)`.
    fn try_lock_for(&self, duration: Duration) -> Result<bool>;

    /// Release access previously obtained by this instance.
    ///
    /// Fire-and-forget: failures are logged, never propagated, and calling
    /// it when not locked is a no-op.
    fn unlock(&self);

    /// Acquire and return a guard that releases on drop.
    fn lock_guard(&self) -> Result<LockGuard<'_, Self>>
    where
        Self: Sized,
    {
        self.lock()?;
        Ok(LockGuard { lock: self })
    }

    /// Bounded-wait variant of [`Lock::lock_guard`]; `Ok(None)` on timeout.
    fn try_lock_guard_for(&self, duration: Duration) -> Result<Option<LockGuard<'_, Self>>>
    where
        Self: Sized,
    {
        if self.try_lock_for(duration)? {
            Ok(Some(LockGuard { lock: self }))
        } else {
            Ok(None)
        }
    }
}

/// Every backend adapter gets the uniform caller surface: the bounded-wait
/// algorithm layered on its non-blocking attempt.
impl<T: RawLock> Lock for T {
    fn lock(&self) -> Result<()> {
        self.blocking_acquire()
    }

    fn try_lock(&self) -> Result<bool> {
        self.attempt_acquire()
    }

    fn try_lock_for(&self, duration: Duration) -> Result<bool> {
        let deadline = duration.deadline_after(Instant::now());
        acquire_until(|| self.attempt_acquire(), deadline, self.poll_interval())
    }

    fn unlock(&self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "failed to release lock during unlock");
        }
    }
}

/// Scoped acquisition: the lock is released when the guard is dropped,
/// on success paths and unwinds alike.
#[must_use = "the lock is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct LockGuard<'a, L: Lock> {
    lock: &'a L,
}

impl<L: Lock> Drop for LockGuard<'_, L> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}
