//! Resting place for [BenchmarkableLock] & [run_workload()] -- the measured contention loop.\
//! Wraps our [SpinLock] and the OS blocking mutexes in a single trait so the same measurement,
//! verification & reporting code exercises them all.

use crate::{
    shared_state::SharedState,
    spin_lock::{SpinLock, SpinPolicy},
    types::TestParameters,
};
use std::{
    hint::black_box,
    time::Duration,
};
use log::debug;


/// Common contract between our [SpinLock] and the OS blocking mutexes, for benchmarking purposes
pub trait BenchmarkableLock: Sync {
    /// runs `critical_section` while holding the lock\
    /// IMPLEMENTORS: #[inline(always)]
    fn locked(&self, critical_section: impl FnOnce());
    /// lock implementation name, for progress & diagnostic messages
    fn implementation_name(&self) -> &str;
}

impl BenchmarkableLock for SpinLock {
    #[inline(always)]
    fn locked(&self, critical_section: impl FnOnce()) {
        self.acquire();
        critical_section();
        self.release();
    }
    fn implementation_name(&self) -> &str {
        match self.policy() {
            SpinPolicy::NoOp           => "no-op spin lock",
            SpinPolicy::PureSpin       => "pure-spin lock",
            SpinPolicy::AlwaysYield    => "always-yield lock",
            SpinPolicy::BoundedSpin(_) => "bounded-spin lock",
        }
    }
}

impl BenchmarkableLock for std::sync::Mutex<()> {
    #[inline(always)]
    fn locked(&self, critical_section: impl FnOnce()) {
        let _guard = self.lock().expect("a thread panicked inside a critical section");
        critical_section();
    }
    fn implementation_name(&self) -> &str {
        "std::sync::Mutex"
    }
}

impl BenchmarkableLock for parking_lot::Mutex<()> {
    #[inline(always)]
    fn locked(&self, critical_section: impl FnOnce()) {
        let _guard = self.lock();
        critical_section();
    }
    fn implementation_name(&self) -> &str {
        "parking_lot::Mutex"
    }
}


/// Runs the whole measured workload for one (lock, scenario) pair, returning its wall-clock duration:\
/// `params.thread_count` workers are spawned; each one, `params.iteration_count` times, burns
/// `params.non_contended_work` units of lock-free busy work, then mutates `shared_state` inside
/// `lock`'s critical section.\
/// The timer starts before the first spawn and stops after the last join, so every variant pays
/// the same fixed costs.\
/// `shared_state` is left populated for [crate::verifier] to inspect -- reading it after this
/// function returns is race-free, as every worker has been joined.
pub fn run_workload(lock: &impl BenchmarkableLock, shared_state: &SharedState, params: &TestParameters) -> Duration {
    debug!("    unleashing {} workers x {} iterations (non-contended work: {}) on the {}...",
           params.thread_count, params.iteration_count, params.non_contended_work, lock.implementation_name());
    let start = minstant::Instant::now();
    crossbeam::scope(|scope| {
        let join_handlers: Vec<crossbeam::thread::ScopedJoinHandle<()>> = (0..params.thread_count)
            .map(|_| scope.spawn(|_| {
                for iteration in 0..params.iteration_count {
                    busy_work(params.non_contended_work);
                    lock.locked(|| shared_state.mutate(iteration));
                }
            }))
            .collect();
        for join_handler in join_handlers {
            join_handler.join().expect("a benchmark worker thread panicked");
        }
    }).expect("crossbeam scope failed");
    start.elapsed()
}

/// burns `units` of CPU without touching any shared data -- the "useful work" workers perform away
/// from the lock, diluting contention without changing thread or iteration counts.\
/// [black_box()] keeps the optimizer from collapsing the loop into thin air
#[inline(always)]
fn busy_work(units: u32) {
    for unit in 0..units {
        black_box(unit);
    }
}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [workload](super) module

    use super::*;

    /// with a single worker there is no contention, so every variant -- the no-op one included --
    /// must leave the exact expected total behind
    #[cfg_attr(not(doc), test)]
    fn single_worker_leaves_the_exact_total() {
        let params = TestParameters { thread_count: 1, iteration_count: 1000, non_contended_work: 0 };
        for policy in [SpinPolicy::NoOp, SpinPolicy::PureSpin, SpinPolicy::AlwaysYield, SpinPolicy::BoundedSpin(5)] {
            let shared_state = SharedState::single_counter();
            run_workload(&SpinLock::new(policy), &shared_state, &params);
            assert_eq!(shared_state.total(), 1000, "a single worker under policy {policy} lost updates with nobody to race against");
        }
        let shared_state = SharedState::single_counter();
        run_workload(&std::sync::Mutex::new(()), &shared_state, &params);
        assert_eq!(shared_state.total(), 1000, "a single worker under std::sync::Mutex lost updates with nobody to race against");
        let shared_state = SharedState::single_counter();
        run_workload(&parking_lot::Mutex::new(()), &shared_state, &params);
        assert_eq!(shared_state.total(), 1000, "a single worker under parking_lot::Mutex lost updates with nobody to race against");
    }

    /// contended workers under exclusion-providing locks must not lose a single update
    #[cfg_attr(not(doc), test)]
    fn contended_workers_lose_nothing_under_real_locks() {
        let params = TestParameters { thread_count: 4, iteration_count: 25_000, non_contended_work: 0 };
        for policy in [SpinPolicy::PureSpin, SpinPolicy::AlwaysYield, SpinPolicy::BoundedSpin(40)] {
            let shared_state = SharedState::single_counter();
            run_workload(&SpinLock::new(policy), &shared_state, &params);
            assert_eq!(shared_state.total(), 100_000, "contended workers under policy {policy} lost updates");
        }
        let shared_state = SharedState::single_counter();
        run_workload(&std::sync::Mutex::new(()), &shared_state, &params);
        assert_eq!(shared_state.total(), 100_000, "contended workers under std::sync::Mutex lost updates");
        let shared_state = SharedState::single_counter();
        run_workload(&parking_lot::Mutex::new(()), &shared_state, &params);
        assert_eq!(shared_state.total(), 100_000, "contended workers under parking_lot::Mutex lost updates");
    }

    /// racing mutations may only ever lose increments -- the total can never exceed the expectation
    #[cfg_attr(not(doc), test)]
    fn races_never_overcount() {
        let params = TestParameters { thread_count: 8, iteration_count: 10_000, non_contended_work: 0 };
        let shared_state = SharedState::single_counter();
        run_workload(&SpinLock::new(SpinPolicy::NoOp), &shared_state, &params);
        assert!(shared_state.total() <= 80_000, "split-increment races may drop updates, never mint them");
    }

    /// out-of-lock busy work must not disturb the counters
    #[cfg_attr(not(doc), test)]
    fn busy_work_has_no_observable_effect() {
        let params = TestParameters { thread_count: 2, iteration_count: 100, non_contended_work: 500 };
        let shared_state = SharedState::single_counter();
        run_workload(&SpinLock::default(), &shared_state, &params);
        assert_eq!(shared_state.total(), 200, "busy work must consume time and nothing else");
    }

    /// the array shape works through the same loop: the grand total follows the same algebra
    #[cfg_attr(not(doc), test)]
    fn array_shape_runs_through_the_same_loop() {
        let params = TestParameters { thread_count: 4, iteration_count: 2500, non_contended_work: 0 };
        let shared_state = SharedState::new(1 << 20, 4);
        run_workload(&SpinLock::default(), &shared_state, &params);
        assert_eq!(shared_state.total(), 40_000, "4 workers x 2500 iterations x 4 mutations each must total 40000");
    }

    /// progress & diagnostic messages need a name for each implementation
    #[cfg_attr(not(doc), test)]
    fn implementation_names_are_telling() {
        assert_eq!(SpinLock::new(SpinPolicy::NoOp).implementation_name(),     "no-op spin lock",    "wrong name");
        assert_eq!(SpinLock::new(SpinPolicy::PureSpin).implementation_name(), "pure-spin lock",     "wrong name");
        assert_eq!(SpinLock::default().implementation_name(),                 "bounded-spin lock",  "wrong name");
        assert_eq!(std::sync::Mutex::new(()).implementation_name(),           "std::sync::Mutex",   "wrong name");
        assert_eq!(parking_lot::Mutex::new(()).implementation_name(),         "parking_lot::Mutex", "wrong name");
    }
}
