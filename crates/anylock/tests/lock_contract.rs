//! Cross-backend contract tests: every backend must honor the same
//! acquisition, bounded-wait, and release semantics.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Once,
    time::{Duration as StdDuration, Instant},
};

use anylock::{
    BackendKind, CounterMutex, Duration, FileMutex, Lock, LockSettings, Mutex, Result, Semaphore,
    ThreadMutex, TimeUnit,
};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// The reference scenario: holder A locks, holder B times out against it,
/// A releases, B succeeds within the same window.
fn contention_scenario<L: Lock>(holder: &L, waiter: &L) -> Result<()> {
    holder.lock()?;
    assert!(!waiter.try_lock_for(Duration::new(TimeUnit::Millisecond, 10.0)?)?);
    holder.unlock();
    assert!(waiter.try_lock_for(Duration::new(TimeUnit::Millisecond, 10.0)?)?);
    waiter.unlock();
    Ok(())
}

#[test]
fn thread_backend_contention_scenario() -> Result<()> {
    init_tracing();
    let a = ThreadMutex::new("contract-thread-alpha")?;
    let b = ThreadMutex::new("contract-thread-alpha")?;
    contention_scenario(&a, &b)
}

#[test]
fn counter_backend_contention_scenario() -> Result<()> {
    init_tracing();
    let a = CounterMutex::new("contract-counter-alpha")?;
    let b = CounterMutex::new("contract-counter-alpha")?;
    contention_scenario(&a, &b)
}

#[test]
fn file_backend_contention_scenario() -> Result<()> {
    init_tracing();
    let dir = tempfile::tempdir().expect("temp dir");
    let a = FileMutex::in_dir("contract-file-alpha", dir.path())?;
    let b = FileMutex::in_dir("contract-file-alpha", dir.path())?;
    contention_scenario(&a, &b)
}

#[cfg(unix)]
#[test]
#[serial_test::serial]
fn kernel_backend_contention_scenario() -> Result<()> {
    init_tracing();
    let a = match anylock::KernelMutex::new("contract-kernel-alpha") {
        Ok(mutex) => mutex,
        Err(err) => {
            eprintln!("skipping: kernel semaphores unavailable: {err}");
            return Ok(());
        }
    };
    let b = anylock::KernelMutex::new("contract-kernel-alpha")?;
    contention_scenario(&a, &b)
}

#[test]
fn semaphore_binary_contention_scenario() -> Result<()> {
    init_tracing();
    let a = Semaphore::binary("contract-sem-alpha")?;
    let b = Semaphore::binary("contract-sem-alpha")?;
    contention_scenario(&a, &b)
}

#[test]
fn enum_mutex_contention_scenario() -> Result<()> {
    init_tracing();
    let settings = LockSettings::builder()
        .with_backend(BackendKind::Counter)
        .build()?;
    let a = Mutex::with_settings("contract-enum-alpha", &settings)?;
    let b = Mutex::with_settings("contract-enum-alpha", &settings)?;
    contention_scenario(&a, &b)
}

#[test]
fn zero_duration_try_returns_without_sleeping() -> Result<()> {
    init_tracing();
    let a = ThreadMutex::new("contract-zero")?;
    let b = ThreadMutex::new("contract-zero")?;
    a.lock()?;

    let start = Instant::now();
    assert!(!b.try_lock_for(Duration::ZERO)?);
    assert!(
        start.elapsed() < StdDuration::from_millis(20),
        "zero-duration try took {:?}",
        start.elapsed()
    );
    a.unlock();
    Ok(())
}

#[test]
fn bounded_wait_spans_at_least_the_window() -> Result<()> {
    init_tracing();
    let a = CounterMutex::new("contract-window")?;
    let b = CounterMutex::new("contract-window")?;
    a.lock()?;

    let start = Instant::now();
    assert!(!b.try_lock_for(Duration::new(TimeUnit::Millisecond, 50.0)?)?);
    assert!(
        start.elapsed() >= StdDuration::from_millis(50),
        "bounded wait gave up after {:?}",
        start.elapsed()
    );
    a.unlock();
    Ok(())
}

#[test]
fn bounded_wait_succeeds_once_holder_releases() -> Result<()> {
    init_tracing();
    let a = ThreadMutex::new("contract-release-window")?;
    let b = ThreadMutex::new("contract-release-window")?;
    a.lock()?;

    std::thread::scope(|scope| -> Result<()> {
        scope.spawn(|| {
            std::thread::sleep(StdDuration::from_millis(10));
            a.unlock();
        });
        let start = Instant::now();
        assert!(b.try_lock_for(Duration::new(TimeUnit::Second, 5.0)?)?);
        assert!(start.elapsed() < StdDuration::from_secs(1));
        b.unlock();
        Ok(())
    })
}

#[test]
fn double_unlock_does_not_over_release() -> Result<()> {
    init_tracing();
    let a = Semaphore::new("contract-over-release", 1)?;
    let b = Semaphore::new("contract-over-release", 1)?;
    let c = Semaphore::new("contract-over-release", 1)?;

    assert!(a.try_lock()?);
    a.unlock();
    a.unlock();
    assert!(b.try_lock()?);
    // The stray unlock must not have minted a second permit.
    assert!(!c.try_lock()?);
    b.unlock();
    Ok(())
}

#[test]
fn guard_releases_on_scope_exit() -> Result<()> {
    init_tracing();
    let a = ThreadMutex::new("contract-guard")?;
    let b = ThreadMutex::new("contract-guard")?;
    {
        let _guard = a.lock_guard()?;
        assert!(!b.try_lock()?);
    }
    assert!(b.try_lock()?);
    b.unlock();
    Ok(())
}

#[test]
fn guard_releases_on_panic() -> Result<()> {
    init_tracing();
    let a = ThreadMutex::new("contract-guard-panic")?;
    let b = ThreadMutex::new("contract-guard-panic")?;

    let result = catch_unwind(AssertUnwindSafe(|| -> Result<()> {
        let _guard = a.lock_guard()?;
        panic!("unwind out of the critical section");
    }));
    assert!(result.is_err());

    assert!(b.try_lock()?);
    b.unlock();
    Ok(())
}

#[test]
fn semaphore_admits_capacity_then_refuses() -> Result<()> {
    init_tracing();
    let holders: Vec<Semaphore> = (0..3)
        .map(|_| Semaphore::new("contract-sem-capacity", 3))
        .collect::<Result<_>>()?;
    let extra = Semaphore::new("contract-sem-capacity", 3)?;

    for holder in &holders {
        assert!(holder.try_lock()?);
    }
    assert!(!extra.try_lock()?);

    holders[0].unlock();
    assert!(extra.try_lock()?);
    extra.unlock();
    for holder in &holders[1..] {
        holder.unlock();
    }
    Ok(())
}

#[test]
fn relock_after_unlock_succeeds() -> Result<()> {
    init_tracing();
    let a = CounterMutex::new("contract-relock")?;
    let b = CounterMutex::new("contract-relock")?;

    a.lock()?;
    a.unlock();
    b.lock()?;
    b.unlock();
    a.lock()?;
    a.unlock();
    Ok(())
}
