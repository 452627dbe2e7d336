//! Resting place for the contention sweep: the default scenario matrix, the per-mode lock variant
//! sets & [run_sweep()] -- which measures every (scenario x variant) cell, verifies the counter
//! totals and streams the report table as results come out.

use crate::{
    report,
    shared_state::SharedState,
    spin_lock::{SpinLock, SpinPolicy, DEFAULT_SPIN_COUNT},
    types::{BenchmarkMode, LockVariant, TestParameters, TimingMillis},
    verifier,
    workload::run_workload,
};
use std::io::Write;
use once_cell::sync::Lazy;
use log::{debug, error, info};


/// how many worker threads the widest scenarios use
pub const MAX_THREADS: u32 = 16;

/// The `(total contended iterations, non-contended work)` shape of each scenario group.\
/// Within a group, the iteration total is split across 1..=[MAX_THREADS] threads, so every row
/// performs the same amount of contended work and rows differ only in how it is spread; across
/// groups, lighter totals compensate for the heavier out-of-lock work.
#[cfg(not(debug_assertions))]
pub const WORK_SHAPE_GROUPS: [(u32, u32); 7] = [
    (10_000_000,   0),
    (10_000_000,   5),
    ( 9_800_000,  20),
    ( 9_500_000,  40),
    ( 9_000_000,  80),
    ( 8_500_000, 120),
    ( 8_000_000, 200),
];
/// debug builds are an order of magnitude slower on atomics-heavy loops: the sweep is scaled
/// down 16x so it remains usable while developing -- measure with `--release` only
#[cfg(debug_assertions)]
pub const WORK_SHAPE_GROUPS: [(u32, u32); 7] = [
    (10_000_000 / 16,   0),
    (10_000_000 / 16,   5),
    ( 9_800_000 / 16,  20),
    ( 9_500_000 / 16,  40),
    ( 9_000_000 / 16,  80),
    ( 8_500_000 / 16, 120),
    ( 8_000_000 / 16, 200),
];

/// the full default scenario matrix: every [WORK_SHAPE_GROUPS] group x every thread count
/// in 1..=[MAX_THREADS], in that nesting order
pub static DEFAULT_SCENARIOS: Lazy<Vec<TestParameters>> = Lazy::new(||
    WORK_SHAPE_GROUPS.iter()
        .flat_map(|&(iterations_total, non_contended_work)|
            (1..=MAX_THREADS)
                .map(move |thread_count| TestParameters {
                    thread_count,
                    iteration_count: iterations_total / thread_count,
                    non_contended_work,
                }))
        .collect());

/// The lock variants a `mode` run measures, in report column order:\
/// [BenchmarkMode::DryRun] runs the no-op lock alone (harness overhead, nothing to verify), while
/// [BenchmarkMode::FullComparison] runs every spin policy plus both blocking-mutex baselines
pub fn lock_variants(mode: BenchmarkMode) -> Vec<LockVariant> {
    match mode {
        BenchmarkMode::DryRun =>
            vec![LockVariant::Spin(SpinPolicy::NoOp)],
        BenchmarkMode::FullComparison =>
            vec![LockVariant::Spin(SpinPolicy::NoOp),
                 LockVariant::Spin(SpinPolicy::PureSpin),
                 LockVariant::Spin(SpinPolicy::AlwaysYield),
                 LockVariant::Spin(SpinPolicy::BoundedSpin(DEFAULT_SPIN_COUNT)),
                 LockVariant::StdMutex,
                 LockVariant::ParkingLotMutex],
    }
}


/// all the measurements taken for one scenario row, in [lock_variants()] order
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub params:             TestParameters,
    /// wall-clock milliseconds per variant
    pub timings:            Vec<TimingMillis>,
    /// per-variant slowdown relative to the row's fastest variant
    pub relative_slowdowns: Vec<f64>,
}


/// Runs the whole benchmark: every `variants` column is measured for every `scenarios` row, with
/// the report table streamed to stdout as results come out -- each row's scenario half is printed
/// (and flushed) before its measurements start.\
/// In [BenchmarkMode::FullComparison], every exclusion-providing variant has its counter total
/// verified after each run; the first violation aborts the sweep, as timings taken under a lock
/// that doesn't lock are garbage.
pub fn run_sweep(scenarios: &[TestParameters],
                 variants:  &[LockVariant],
                 mode:      BenchmarkMode)
                -> Result<Vec<ScenarioReport>, Box<dyn std::error::Error>> {

    info!("starting a '{mode}' sweep: {} scenarios x {} lock variants", scenarios.len(), variants.len());

    println!("{}", report::header_line(variants));

    let mut reports = Vec::with_capacity(scenarios.len());
    for params in scenarios {
        print!("{}", report::scenario_prefix(params));
        std::io::stdout().flush()
            .map_err(|err| format!("couldn't flush the report to stdout: {err}"))?;

        let mut timings = Vec::with_capacity(variants.len());
        for variant in variants {
            timings.push(timed_run(*variant, params, mode)?);
        }

        let relative_slowdowns = relative_slowdowns(&timings);
        println!("{}", report::timings_suffix(&timings, &relative_slowdowns));

        reports.push(ScenarioReport { params: *params, timings, relative_slowdowns });
    }

    info!("sweep completed: {} scenarios measured", reports.len());
    Ok(reports)
}

/// Per-variant slowdowns relative to the fastest variant of a row: `timing / min(positive timings)`.\
/// Zero-millisecond timings are below the clock's resolution and would make every other ratio
/// infinite, so they don't run for fastest; if every timing is zero, ratios fall back to 1ms.
pub fn relative_slowdowns(timings: &[TimingMillis]) -> Vec<f64> {
    let fastest = timings.iter()
        .filter(|&&timing| timing > 0)
        .min()
        .copied()
        .unwrap_or(1) as f64;
    timings.iter()
        .map(|&timing| timing as f64 / fastest)
        .collect()
}

/// Measures one (variant, scenario) cell: builds the fresh lock & [SharedState], runs the
/// workload and -- when `mode` and the variant call for it -- verifies the counter total
fn timed_run(variant: LockVariant, params: &TestParameters, mode: BenchmarkMode)
            -> Result<TimingMillis, Box<dyn std::error::Error>> {

    let shared_state = SharedState::single_counter();
    let elapsed = match variant {
        LockVariant::Spin(policy)    => run_workload(&SpinLock::new(policy), &shared_state, params),
        LockVariant::StdMutex        => run_workload(&std::sync::Mutex::new(()), &shared_state, params),
        LockVariant::ParkingLotMutex => run_workload(&parking_lot::Mutex::new(()), &shared_state, params),
    };
    let timing = elapsed.as_millis() as TimingMillis;
    debug!("    ... '{variant}' took {timing}ms");

    if mode == BenchmarkMode::FullComparison && variant.provides_exclusion() {
        let expected_total = verifier::expected_total(params, shared_state.mutations_per_iteration());
        verifier::verify(variant, params, expected_total, shared_state.total())
            .map_err(|failure| {
                error!("{failure}");
                failure
            })?;
    }
    Ok(timing)
}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [sweep](super) module

    use super::*;

    /// the default matrix is every work-shape group crossed with every thread count, in order
    #[cfg_attr(not(doc), test)]
    fn default_matrix_covers_every_group_and_thread_count() {
        assert_eq!(DEFAULT_SCENARIOS.len(), WORK_SHAPE_GROUPS.len() * MAX_THREADS as usize,
                   "the matrix must have one row per (group x thread count)");
        for (group, &(iterations_total, non_contended_work)) in WORK_SHAPE_GROUPS.iter().enumerate() {
            for thread_count in 1..=MAX_THREADS {
                let row = group * MAX_THREADS as usize + (thread_count - 1) as usize;
                let scenario = &DEFAULT_SCENARIOS[row];
                assert_eq!(scenario.thread_count,       thread_count,                     "wrong thread count at row {row}");
                assert_eq!(scenario.non_contended_work, non_contended_work,               "wrong non-contended work at row {row}");
                assert_eq!(scenario.iteration_count,    iterations_total / thread_count,  "wrong iteration count at row {row}");
            }
        }
    }

    /// within a group, `threads x iterations` stays put (up to integer division), so rows compare
    /// how the same contended work is spread -- not how much of it there is
    #[cfg_attr(not(doc), test)]
    fn each_group_spreads_a_constant_work_total() {
        for scenario in DEFAULT_SCENARIOS.iter() {
            let (iterations_total, _) = WORK_SHAPE_GROUPS.iter()
                .find(|(_, non_contended_work)| *non_contended_work == scenario.non_contended_work)
                .copied()
                .expect("scenario doesn't belong to any work-shape group");
            let spread_total = scenario.thread_count as u64 * scenario.iteration_count as u64;
            assert!(spread_total <= iterations_total as u64,
                    "a row may never exceed its group's work total");
            assert!(iterations_total as u64 - spread_total < scenario.thread_count as u64,
                    "integer division may only shave off less than one iteration per thread");
        }
    }

    /// ratios are taken against the fastest variant of the row, which reads exactly 1.0
    #[cfg_attr(not(doc), test)]
    fn slowdowns_normalize_to_the_fastest() {
        let slowdowns = relative_slowdowns(&[12, 3, 6]);
        assert_eq!(slowdowns, vec![4.0, 1.0, 2.0], "wrong normalization");
        assert_eq!(slowdowns.iter().filter(|&&slowdown| slowdown == 1.0).count(), 1,
                   "exactly one variant -- the fastest -- must read 1.0");
    }

    /// timings below the clock's resolution never run for fastest & never divide anything by zero
    #[cfg_attr(not(doc), test)]
    fn zero_timings_never_normalize() {
        assert_eq!(relative_slowdowns(&[0, 5, 10]), vec![0.0, 1.0, 2.0],
                   "zero timings must be skipped when electing the fastest");
        let all_zeros = relative_slowdowns(&[0, 0, 0]);
        assert!(all_zeros.iter().all(|slowdown| slowdown.is_finite()),
                "an all-zeros row must still produce finite ratios, but got {all_zeros:?}");
        assert_eq!(relative_slowdowns(&[]), Vec::<f64>::new(),
                   "no timings, no ratios");
    }

    /// dry runs measure the harness alone; full runs measure every policy plus both blocking baselines
    #[cfg_attr(not(doc), test)]
    fn variant_sets_per_mode() {
        assert_eq!(lock_variants(BenchmarkMode::DryRun), vec![LockVariant::Spin(SpinPolicy::NoOp)],
                   "dry runs must run the no-op lock alone");
        let full = lock_variants(BenchmarkMode::FullComparison);
        assert_eq!(full.len(), 6,                                 "full runs must measure all 6 variants");
        assert_eq!(full[0], LockVariant::Spin(SpinPolicy::NoOp),  "the overhead baseline must come first");
        assert!(full.contains(&LockVariant::Spin(SpinPolicy::default())), "the tuned bounded spinner must be measured");
        assert!(full.contains(&LockVariant::StdMutex),            "the std blocking baseline must be measured");
        assert!(full.contains(&LockVariant::ParkingLotMutex),     "the parking_lot blocking baseline must be measured");
    }
}
