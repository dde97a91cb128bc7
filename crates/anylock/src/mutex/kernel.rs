//! Kernel semaphore mutex backend (System V, unix only).
//!
//! The native handle is a System V semaphore set with a single semaphore
//! initialized to 1. Keys hash into a capped identifier space - modulus 257,
//! offset into a private numeric range - which bounds the number of distinct
//! kernel objects this backend can track and keeps the identifiers away from
//! those used by unrelated processes.
//!
//! Operations use `SEM_UNDO`, so the kernel rolls back an acquisition if the
//! holding process dies without releasing.

#[cfg(unix)]
pub use sysv::KernelMutex;
#[cfg(not(unix))]
pub use unsupported::KernelMutex;

#[cfg(unix)]
mod sysv {
    #![allow(unsafe_code)]

    use std::{
        io,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration as StdDuration,
    };

    use crate::{
        error::{Error, Result},
        key::validate_key,
        lock::{RawLock, DEFAULT_POLL_INTERVAL},
    };

    /// Identifier space modulus: at most 257 distinct kernel semaphores.
    const IDENTIFIER_MODULUS: u64 = 257;

    /// Private offset keeping identifiers clear of unrelated users.
    const IDENTIFIER_OFFSET: i32 = 0x0BAD_BEEF;

    /// Access mode for newly created semaphore sets (rw for the owner).
    const SEM_MODE: libc::c_int = 0o600;

    /// Map a key into the capped identifier space (FNV-1a, stable across
    /// processes so independent holders agree on the identifier).
    fn key_identifier(key: &str) -> i32 {
        const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

        let hash = key
            .bytes()
            .fold(FNV_OFFSET, |acc, byte| (acc ^ u64::from(byte)).wrapping_mul(FNV_PRIME));
        #[allow(clippy::cast_possible_truncation)]
        let slot = (hash % IDENTIFIER_MODULUS) as i32;
        slot + IDENTIFIER_OFFSET
    }

    /// Open (or create and initialize) the semaphore set for `identifier`.
    fn open_semaphore(identifier: i32) -> Result<libc::c_int> {
        // Create exclusively first so the initial value is set exactly once.
        let sem_id =
            unsafe { libc::semget(identifier, 1, libc::IPC_CREAT | libc::IPC_EXCL | SEM_MODE) };
        if sem_id >= 0 {
            let rc = unsafe { libc::semctl(sem_id, 0, libc::SETVAL, 1) };
            if rc < 0 {
                return Err(Error::KernelSemaphoreCreate {
                    identifier,
                    source: io::Error::last_os_error().into(),
                });
            }
            return Ok(sem_id);
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EEXIST) {
            let sem_id = unsafe { libc::semget(identifier, 1, SEM_MODE) };
            if sem_id >= 0 {
                return Ok(sem_id);
            }
            return Err(Error::KernelSemaphoreCreate {
                identifier,
                source: io::Error::last_os_error().into(),
            });
        }
        Err(Error::KernelSemaphoreCreate {
            identifier,
            source: err.into(),
        })
    }

    /// One `semop` call on the set's single semaphore.
    fn semaphore_op(sem_id: libc::c_int, delta: i16, flags: libc::c_short) -> io::Result<()> {
        let mut op = libc::sembuf {
            sem_num: 0,
            sem_op: delta,
            sem_flg: flags,
        };
        let rc = unsafe { libc::semop(sem_id, &mut op, 1) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn undo_flag() -> libc::c_short {
        libc::SEM_UNDO as libc::c_short
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn undo_nowait_flag() -> libc::c_short {
        (libc::SEM_UNDO | libc::IPC_NOWAIT) as libc::c_short
    }

    /// Exclusive cross-process lock backed by a System V semaphore.
    #[derive(Debug)]
    pub struct KernelMutex {
        key: String,
        identifier: i32,
        sem_id: libc::c_int,
        held: AtomicBool,
        poll_interval: StdDuration,
    }

    impl KernelMutex {
        /// Create an adapter for `key`, opening (or creating) the kernel
        /// semaphore its identifier maps to.
        ///
        /// # Errors
        ///
        /// Returns [`Error::KernelSemaphoreCreate`] naming the identifier
        /// when the semaphore set cannot be allocated or opened.
        pub fn new(key: impl Into<String>) -> Result<Self> {
            let key = key.into();
            validate_key(&key)?;

            let identifier = key_identifier(&key);
            let sem_id = open_semaphore(identifier)?;
            tracing::debug!(identifier, sem_id, "opened kernel semaphore");

            Ok(Self {
                key,
                identifier,
                sem_id,
                held: AtomicBool::new(false),
                poll_interval: DEFAULT_POLL_INTERVAL,
            })
        }

        /// The resource key this mutex guards.
        #[must_use]
        pub fn key(&self) -> &str {
            &self.key
        }

        /// The kernel identifier the key mapped to.
        #[must_use]
        pub const fn identifier(&self) -> i32 {
            self.identifier
        }

        /// Override the bounded-wait poll interval.
        #[must_use]
        pub fn with_poll_interval(mut self, poll_interval: StdDuration) -> Self {
            self.poll_interval = poll_interval;
            self
        }
    }

    impl RawLock for KernelMutex {
        fn attempt_acquire(&self) -> Result<bool> {
            match semaphore_op(self.sem_id, -1, undo_nowait_flag()) {
                Ok(()) => {
                    self.held.store(true, Ordering::Release);
                    Ok(true)
                }
                Err(err) if err.raw_os_error() == Some(libc::EAGAIN) => Ok(false),
                Err(err) => Err(Error::KernelSemaphoreOp {
                    identifier: self.identifier,
                    source: err.into(),
                }),
            }
        }

        fn blocking_acquire(&self) -> Result<()> {
            loop {
                match semaphore_op(self.sem_id, -1, undo_flag()) {
                    Ok(()) => {
                        self.held.store(true, Ordering::Release);
                        return Ok(());
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(err) => {
                        return Err(Error::KernelSemaphoreOp {
                            identifier: self.identifier,
                            source: err.into(),
                        })
                    }
                }
            }
        }

        fn release(&self) -> Result<()> {
            // Only return what this instance took: a stray release would
            // push the semaphore value above 1 and admit two holders.
            if self.held.swap(false, Ordering::AcqRel) {
                semaphore_op(self.sem_id, 1, undo_flag()).map_err(|err| {
                    Error::KernelSemaphoreOp {
                        identifier: self.identifier,
                        source: err.into(),
                    }
                })?;
            }
            Ok(())
        }

        fn poll_interval(&self) -> StdDuration {
            self.poll_interval
        }
    }

    impl Drop for KernelMutex {
        fn drop(&mut self) {
            if let Err(err) = self.release() {
                tracing::debug!(key = %self.key, error = %err, "release on drop failed");
            }
        }
    }

}

#[cfg(not(unix))]
mod unsupported {
    use std::time::Duration as StdDuration;

    use crate::{
        error::{Error, Result},
        lock::RawLock,
    };

    fn unavailable() -> Error {
        Error::backend_unavailable("kernel", "System V semaphores require a unix host")
    }

    /// Stub: System V semaphores do not exist on this platform, so
    /// construction always fails.
    #[derive(Debug)]
    pub struct KernelMutex {
        key: String,
    }

    impl KernelMutex {
        pub fn new(key: impl Into<String>) -> Result<Self> {
            let _key = key.into();
            Err(unavailable())
        }

        #[must_use]
        pub fn key(&self) -> &str {
            &self.key
        }

        #[must_use]
        pub fn with_poll_interval(self, _poll_interval: StdDuration) -> Self {
            self
        }
    }

    impl RawLock for KernelMutex {
        fn attempt_acquire(&self) -> Result<bool> {
            Err(unavailable())
        }

        fn release(&self) -> Result<()> {
            Err(unavailable())
        }
    }
}
