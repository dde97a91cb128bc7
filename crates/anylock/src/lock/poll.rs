//! Canonical bounded-wait acquisition loop.
//!
//! Backends without a native timed wait all share this loop: attempt a
//! non-blocking acquisition, check the deadline, sleep one poll interval,
//! repeat. The ordering is load-bearing:
//!
//! - the first attempt happens before any deadline check, so a deadline that
//!   is already in the past still gets exactly one attempt;
//! - a zero-length duration therefore attempts once and returns without
//!   sleeping;
//! - an unbounded deadline never returns `false`.
//!
//! Spin-with-sleep is an intentional trade-off (portability over wake
//! latency): file locks, kernel semaphores, and counter tables expose no
//! common native blocking-with-timeout. The interval is tunable per adapter.

use std::{
    thread,
    time::{Duration as StdDuration, Instant},
};

use crate::{duration::Deadline, error::Result};

/// Reference poll interval between failed attempts.
pub(crate) const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_millis(1);

/// Repeatedly attempt a non-blocking acquisition until it succeeds or the
/// deadline passes.
///
/// Returns `Ok(true)` on acquisition, `Ok(false)` on deadline expiry, and
/// propagates the first attempt error.
pub(crate) fn acquire_until<F>(
    mut attempt: F,
    deadline: Deadline,
    poll_interval: StdDuration,
) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    loop {
        if attempt()? {
            return Ok(true);
        }
        if deadline.is_reached(Instant::now()) {
            return Ok(false);
        }
        thread::sleep(poll_interval);
    }
}
