//! Uncontended acquisition cost per backend.

use anylock::{CounterMutex, FileMutex, Lock, ThreadMutex};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_uncontended(c: &mut Criterion) {
    let thread = ThreadMutex::new("bench-thread").expect("thread mutex");
    c.bench_function("thread_try_lock", |b| {
        b.iter(|| {
            assert!(thread.try_lock().expect("attempt"));
            thread.unlock();
        });
    });

    let counter = CounterMutex::new("bench-counter").expect("counter mutex");
    c.bench_function("counter_try_lock", |b| {
        b.iter(|| {
            assert!(counter.try_lock().expect("attempt"));
            counter.unlock();
        });
    });

    let dir = tempfile::tempdir().expect("temp dir");
    let file = FileMutex::in_dir("bench-file", dir.path()).expect("file mutex");
    c.bench_function("file_try_lock", |b| {
        b.iter(|| {
            assert!(file.try_lock().expect("attempt"));
            file.unlock();
        });
    });
}

criterion_group!(benches, bench_uncontended);
criterion_main!(benches);
