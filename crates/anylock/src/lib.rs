//! # Anylock
//!
//! Keyed mutual exclusion over heterogeneous locking primitives.
//!
//! Application code acquires and releases exclusion through one contract -
//! [`Lock`] - without depending on which primitive is available on the
//! running host: an in-process mutex, a cross-process file lock, a shared
//! counter entry, a System V kernel semaphore, or a counting semaphore.
//! Backends provide two capabilities ([`RawLock`]: a non-blocking attempt
//! and an optional native blocking acquire) and the canonical bounded-wait
//! algorithm does the rest.
//!
//! ## Laws (Compiler Enforced)
//!
//! - No `unwrap()` - returns `Result` instead
//! - No `expect()` - returns `Result` instead
//! - No `panic!()` - returns `Result` instead
//! - No `todo!()` / `unimplemented!()` - complete implementations only
//!
//! ## Example
//!
//! ```
//! use anylock::{Duration, Lock, Mutex, TimeUnit};
//!
//! let mutex = Mutex::counter("orders/alpha")?;
//! if mutex.try_lock_for(Duration::new(TimeUnit::Millisecond, 50.0)?)? {
//!     // critical section
//!     mutex.unlock();
//! }
//! # Ok::<(), anylock::Error>(())
//! ```
//!
//! Or scoped, so release survives early returns and panics:
//!
//! ```
//! use anylock::{Lock, Mutex};
//!
//! let mutex = Mutex::thread("orders/alpha")?;
//! {
//!     let _guard = mutex.lock_guard()?;
//!     // critical section - released when the guard drops
//! }
//! # Ok::<(), anylock::Error>(())
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod duration;
pub mod error;
mod key;
pub mod lock;
pub mod mutex;
pub mod semaphore;
pub mod settings;

pub use duration::{Deadline, Duration, TimeUnit};
pub use error::{Error, IoErrorKind, Result};
pub use lock::{Lock, LockGuard, RawLock};
pub use mutex::{CounterMutex, FileMutex, KernelMutex, Mutex, ThreadMutex};
pub use semaphore::Semaphore;
pub use settings::{BackendKind, LockSettings, LockSettingsBuilder};
