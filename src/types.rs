//! Common types across this crate: the scenario parameters, the lock variant tags
//! & the execution modes

use crate::spin_lock::SpinPolicy;
use std::fmt;
use strum_macros::Display;


/// One cell of the scenario matrix: how many threads compete, how hard each one hammers the lock
/// and how much time it spends away from it.\
/// Immutable once a scenario begins -- see [crate::sweep] for how the default matrix is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestParameters {
    /// how many worker threads compete for the lock
    pub thread_count:       u32,
    /// how many acquire/mutate/release rounds each worker performs
    pub iteration_count:    u32,
    /// units of lock-free busy work each worker burns before every acquisition
    /// -- zero maximizes contention; large values dilute it
    pub non_contended_work: u32,
}

/// Wall-clock duration of one measured workload run, in milliseconds
pub type TimingMillis = u64;


/// The lock implementations the benchmark is able to measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockVariant {
    /// our hand-rolled atomic-flag lock, behaving as per the given policy
    Spin(SpinPolicy),
    /// the standard library's blocking mutex
    StdMutex,
    /// the `parking_lot` blocking mutex
    ParkingLotMutex,
}

impl LockVariant {
    /// `false` for variants that don't even attempt to exclude concurrent critical sections,
    /// telling [crate::verifier] their counter totals are expected to be garbage
    pub fn provides_exclusion(&self) -> bool {
        !matches!(self, LockVariant::Spin(SpinPolicy::NoOp))
    }
}

impl fmt::Display for LockVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockVariant::Spin(policy)    => write!(f, "{policy}"),
            LockVariant::StdMutex        => write!(f, "std::sync::Mutex"),
            LockVariant::ParkingLotMutex => write!(f, "parking_lot::Mutex"),
        }
    }
}


/// What a benchmark execution is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BenchmarkMode {
    /// runs a no-op-lock-only pass, measuring the harness' own overhead without any
    /// correctness verification -- also handy for warming the machine up
    #[strum(serialize = "dry-run")]
    DryRun,
    /// measures every lock variant & verifies, after each run, that exclusion-providing
    /// variants lost no counter updates
    #[strum(serialize = "full-comparison")]
    FullComparison,
}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [types](super) module

    use super::*;

    /// assures the report column labels & log messages name each variant unambiguously
    #[cfg_attr(not(doc), test)]
    fn variant_labels() {
        assert_eq!(LockVariant::Spin(SpinPolicy::NoOp).to_string(),            "NoOp",               "wrong label");
        assert_eq!(LockVariant::Spin(SpinPolicy::PureSpin).to_string(),        "PureSpin",           "wrong label");
        assert_eq!(LockVariant::Spin(SpinPolicy::AlwaysYield).to_string(),     "AlwaysYield",        "wrong label");
        assert_eq!(LockVariant::Spin(SpinPolicy::BoundedSpin(40)).to_string(), "BoundedSpin(40)",    "wrong label");
        assert_eq!(LockVariant::StdMutex.to_string(),                          "std::sync::Mutex",   "wrong label");
        assert_eq!(LockVariant::ParkingLotMutex.to_string(),                   "parking_lot::Mutex", "wrong label");
        assert_eq!(BenchmarkMode::DryRun.to_string(),                          "dry-run",            "wrong label");
        assert_eq!(BenchmarkMode::FullComparison.to_string(),                  "full-comparison",    "wrong label");
    }

    /// only the no-op policy opts out of verification -- every other variant must stand behind its counts
    #[cfg_attr(not(doc), test)]
    fn exclusion_expectations() {
        assert!(!LockVariant::Spin(SpinPolicy::NoOp).provides_exclusion(),       "the no-op lock provides no exclusion to be verified");
        assert!( LockVariant::Spin(SpinPolicy::PureSpin).provides_exclusion(),   "spinning locks must claim exclusion");
        assert!( LockVariant::Spin(SpinPolicy::AlwaysYield).provides_exclusion(),"yielding locks must claim exclusion");
        assert!( LockVariant::Spin(SpinPolicy::BoundedSpin(1)).provides_exclusion(), "bounded-spin locks must claim exclusion");
        assert!( LockVariant::StdMutex.provides_exclusion(),                     "blocking mutexes must claim exclusion");
        assert!( LockVariant::ParkingLotMutex.provides_exclusion(),              "blocking mutexes must claim exclusion");
    }
}
