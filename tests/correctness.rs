//! Exercises the whole benchmark harness from the outside, the way the binary does: workloads are
//! run for real (threads & all) and the totals each lock variant leaves behind are put against the
//! correctness oracle -- proving both that real locks never lose updates and that the oracle does
//! catch the locks that do.

use spin_or_block::{
    shared_state::SharedState,
    spin_lock::{SpinLock, SpinPolicy},
    sweep::{self, lock_variants},
    types::{BenchmarkMode, LockVariant, TestParameters},
    verifier,
    workload::run_workload,
};


#[ctor::ctor]
fn suite_setup() {
    simple_logger::SimpleLogger::new().with_utc_timestamps().init().unwrap_or_else(|_| eprintln!("--> LOGGER WAS ALREADY STARTED"));
}

/// runs `variant`'s workload the way the sweep does, returning the `(expected, observed)`
/// counter totals for the caller to judge
fn run_and_total(variant: LockVariant, params: &TestParameters) -> (u64, u64) {
    let shared_state = SharedState::single_counter();
    match variant {
        LockVariant::Spin(policy)    => run_workload(&SpinLock::new(policy), &shared_state, params),
        LockVariant::StdMutex        => run_workload(&std::sync::Mutex::new(()), &shared_state, params),
        LockVariant::ParkingLotMutex => run_workload(&parking_lot::Mutex::new(()), &shared_state, params),
    };
    (verifier::expected_total(params, shared_state.mutations_per_iteration()), shared_state.total())
}

/// scenario: a single worker means no contention and no races, so every variant -- even the
/// exclusion-less no-op lock -- must land the exact expected total of 1000
#[cfg_attr(not(doc), test)]
fn single_worker_is_exact_for_every_variant() {
    let params = TestParameters { thread_count: 1, iteration_count: 1000, non_contended_work: 0 };
    for variant in lock_variants(BenchmarkMode::FullComparison) {
        let (expected, observed) = run_and_total(variant, &params);
        assert_eq!(expected, 1000, "wrong expectation algebra");
        assert_eq!(observed, expected, "variant '{variant}' lost updates with nobody to race against");
    }
}

/// scenario: contended workers under every exclusion-providing variant must land the exact
/// expected total, first at the matrix's lightest shape (4 x 250), then at a heavier one
#[cfg_attr(not(doc), test)]
fn contended_workers_are_exact_for_every_real_variant() {
    for (iteration_count, expected) in [(250, 1000), (25_000, 100_000)] {
        let params = TestParameters { thread_count: 4, iteration_count, non_contended_work: 0 };
        for variant in lock_variants(BenchmarkMode::FullComparison).into_iter()
                                                                   .filter(|variant| variant.provides_exclusion()) {
            let (expected_total, observed_total) = run_and_total(variant, &params);
            assert_eq!(expected_total, expected,       "wrong expectation algebra");
            assert_eq!(observed_total, expected_total, "variant '{variant}' lost updates under contention");
            verifier::verify(variant, &params, expected_total, observed_total)
                .unwrap_or_else(|failure| panic!("verification should have passed, but: {failure}"));
        }
    }
}

/// scenario: the no-op lock, hammered by 8 workers, is likely to lose updates on every run -- the
/// oracle must catch the loss and report every detail of it.\
/// A lossless run is theoretically possible (the race window is 2 instructions wide), so up to 20
/// runs are attempted before concluding the mutation isn't racy enough; losses may only ever
/// subtract, never add.
#[cfg_attr(not(doc), test)]
fn the_oracle_catches_what_the_noop_lock_loses() {
    let params = TestParameters { thread_count: 8, iteration_count: 100_000, non_contended_work: 0 };
    let variant = LockVariant::Spin(SpinPolicy::NoOp);
    let mut lost_updates = 0;
    for _attempt in 0..20 {
        let (expected, observed) = run_and_total(variant, &params);
        assert!(observed <= expected, "split-increment races may drop updates, never mint them");
        lost_updates = expected - observed;
        if lost_updates > 0 {
            let failure = verifier::verify(variant, &params, expected, observed)
                .expect_err("the oracle let a lossy run pass");
            assert_eq!(failure.variant,        variant,  "the failure must name the offending variant");
            assert_eq!(failure.params,         params,   "the failure must carry the offending scenario");
            assert_eq!(failure.expected_total, expected, "the failure must carry the expected total");
            assert_eq!(failure.observed_total, observed, "the failure must carry the observed total");
            break
        }
    }
    assert!(lost_updates > 0,
            "after 20 highly contended runs, the no-op lock never lost a single update -- the split-increment mutation isn't racing");
}

/// scenario: a spin budget of 1 yields after every failed attempt, making it the bounded-spin
/// rendition of the always-yield policy -- both must be equally correct under contention
#[cfg_attr(not(doc), test)]
fn unit_budget_bounded_spin_is_as_correct_as_always_yield() {
    let params = TestParameters { thread_count: 4, iteration_count: 25_000, non_contended_work: 0 };
    for policy in [SpinPolicy::BoundedSpin(1), SpinPolicy::AlwaysYield] {
        let lock = SpinLock::new(policy);
        let shared_state = SharedState::single_counter();
        run_workload(&lock, &shared_state, &params);
        assert_eq!(shared_state.total(), 100_000, "policy {policy} lost updates under contention");
        assert!(!lock.is_locked(),                "policy {policy} left the lock owned after every worker joined");
    }
}

/// spreading a constant work total over more and more threads changes timings, never correctness
#[cfg_attr(not(doc), test)]
fn growing_thread_counts_never_break_exclusion() {
    const TOTAL_ITERATIONS: u32 = 32_000;
    for thread_count in [1, 2, 4, 8, 16] {
        let params = TestParameters { thread_count, iteration_count: TOTAL_ITERATIONS / thread_count, non_contended_work: 0 };
        for variant in [LockVariant::Spin(SpinPolicy::default()), LockVariant::StdMutex, LockVariant::ParkingLotMutex] {
            let (expected, observed) = run_and_total(variant, &params);
            assert_eq!(expected, TOTAL_ITERATIONS as u64, "wrong expectation algebra");
            assert_eq!(observed, expected, "variant '{variant}' lost updates at {thread_count} threads");
        }
    }
}

/// a miniature full-comparison sweep runs end to end: every variant measured for every scenario,
/// every verification passing, one fully populated report per scenario
#[cfg_attr(not(doc), test)]
fn a_full_comparison_mini_sweep_completes() {
    let scenarios = [TestParameters { thread_count: 2, iteration_count: 1000, non_contended_work: 0 },
                     TestParameters { thread_count: 4, iteration_count:  500, non_contended_work: 5 }];
    let variants = lock_variants(BenchmarkMode::FullComparison);
    let reports = sweep::run_sweep(&scenarios, &variants, BenchmarkMode::FullComparison)
        .expect("a mini sweep with well-behaved locks must complete");
    assert_eq!(reports.len(), scenarios.len(), "one report per scenario");
    for (report, scenario) in reports.iter().zip(scenarios.iter()) {
        assert_eq!(&report.params, scenario,                   "reports must echo their scenario");
        assert_eq!(report.timings.len(), variants.len(),       "one timing per variant");
        assert_eq!(report.relative_slowdowns.len(), variants.len(), "one slowdown per variant");
        assert!(report.relative_slowdowns.iter().all(|slowdown| slowdown.is_finite()),
                "slowdowns must be finite, but got {:?}", report.relative_slowdowns);
    }
}

/// dry runs measure the no-op lock alone and verify nothing -- racing away updates at 8 threads
/// must not fail the sweep
#[cfg_attr(not(doc), test)]
fn a_dry_run_sweep_never_verifies() {
    let scenarios = [TestParameters { thread_count: 8, iteration_count: 50_000, non_contended_work: 0 }];
    let variants = lock_variants(BenchmarkMode::DryRun);
    let reports = sweep::run_sweep(&scenarios, &variants, BenchmarkMode::DryRun)
        .expect("dry runs have nothing to fail on");
    assert_eq!(reports.len(), 1,            "one report per scenario");
    assert_eq!(reports[0].timings.len(), 1, "dry runs measure the no-op lock alone");
}
