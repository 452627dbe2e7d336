//! Criterion counterpart of the sweep binary: micro-benchmarks the lock variants the sweep
//! compares, at a finer grain -- per acquire/release round trip and per whole contended workload.
//!
//! The sweep remains the tool for the full contention-profile picture (it verifies correctness
//! along the way); these benchmarks are for quick A/B checks while tuning a policy.

use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use spin_or_block::{
    shared_state::SharedState,
    spin_lock::{SpinLock, SpinPolicy},
    types::TestParameters,
    workload::{run_workload, BenchmarkableLock},
};


/// Benchmarks a single thread's acquire+release round trip on each variant -- the floor every
/// variant pays even when nobody else wants the lock
fn bench_uncontended_round_trips(criterion: &mut Criterion) {

    let mut group = criterion.benchmark_group("Uncontended ACQUIRE+RELEASE");

    let noop        = SpinLock::new(SpinPolicy::NoOp);
    let pure_spin   = SpinLock::new(SpinPolicy::PureSpin);
    let yielding    = SpinLock::new(SpinPolicy::AlwaysYield);
    let bounded     = SpinLock::new(SpinPolicy::default());
    let std_mutex   = std::sync::Mutex::new(());
    let parking_lot = parking_lot::Mutex::new(());

    let bench_id = format!("no-op lock (harness floor)");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        noop.locked(|| ());
    })));

    let bench_id = format!("PureSpin lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        pure_spin.locked(|| ());
    })));

    let bench_id = format!("AlwaysYield lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        yielding.locked(|| ());
    })));

    let bench_id = format!("BoundedSpin(40) lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        bounded.locked(|| ());
    })));

    let bench_id = format!("std::sync::Mutex");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        std_mutex.locked(|| ());
    })));

    let bench_id = format!("parking_lot::Mutex");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        parking_lot.locked(|| ());
    })));

    group.finish();
}

/// Benchmarks the whole contended workload (threads spawned & joined per measurement) on each
/// variant -- the single-counter shape, at a size criterion can afford to repeat
fn bench_contended_workloads(criterion: &mut Criterion) {

    let mut group = criterion.benchmark_group("Contended workload -- 4 threads x 1000 iterations");
    // each measurement spawns & joins threads; a few samples tell the story
    group.sample_size(10);

    let params = TestParameters { thread_count: 4, iteration_count: 1000, non_contended_work: 0 };

    let bench_id = format!("no-op lock (harness floor)");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&SpinLock::new(SpinPolicy::NoOp), &SharedState::single_counter(), &params);
    })));

    let bench_id = format!("PureSpin lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&SpinLock::new(SpinPolicy::PureSpin), &SharedState::single_counter(), &params);
    })));

    let bench_id = format!("AlwaysYield lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&SpinLock::new(SpinPolicy::AlwaysYield), &SharedState::single_counter(), &params);
    })));

    let bench_id = format!("BoundedSpin(40) lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&SpinLock::default(), &SharedState::single_counter(), &params);
    })));

    let bench_id = format!("std::sync::Mutex");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&std::sync::Mutex::new(()), &SharedState::single_counter(), &params);
    })));

    let bench_id = format!("parking_lot::Mutex");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&parking_lot::Mutex::new(()), &SharedState::single_counter(), &params);
    })));

    group.finish();
}

/// Benchmarks the array-shaped [SharedState]: 2^20 counters with 4 sampled increments per critical
/// section, adding cache pressure to each one -- the shape that punishes locks holding the bus
fn bench_cache_pressured_workloads(criterion: &mut Criterion) {

    let mut group = criterion.benchmark_group("Cache-pressured workload -- 4 threads x 1000 iterations x 2^20 slots");
    group.sample_size(10);

    let params = TestParameters { thread_count: 4, iteration_count: 1000, non_contended_work: 0 };
    // built once: 8MiB of counters; totals keep growing across measurements, which is harmless here
    let shared_state = SharedState::new(1 << 20, 4);

    let bench_id = format!("BoundedSpin(40) lock");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&SpinLock::default(), &shared_state, &params);
    })));

    let bench_id = format!("std::sync::Mutex");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&std::sync::Mutex::new(()), &shared_state, &params);
    })));

    let bench_id = format!("parking_lot::Mutex");
    group.bench_function(bench_id, |bencher| bencher.iter(|| black_box({
        run_workload(&parking_lot::Mutex::new(()), &shared_state, &params);
    })));

    group.finish();
}

criterion_group!(benches, bench_uncontended_round_trips, bench_contended_workloads, bench_cache_pressured_workloads);
criterion_main!(benches);
