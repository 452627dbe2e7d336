//! Resting place for [SpinLock] & [SpinPolicy] -- our hand-rolled alternative to the OS blocking mutexes,
//! built on a single atomic ownership flag.\
//! Unlocked: false; locked: true.\
//! Successful acquisitions are `Acquire` barriers and releases are `Release` barriers, so every write made
//! inside a critical section is visible to the next owner -- the same contract the blocking mutexes honor.

use std::{
    fmt,
    hint::spin_loop,
    sync::atomic::{
        AtomicBool,
        Ordering::{Acquire, Relaxed, Release},
    },
    thread,
};


/// spin budget [SpinPolicy::default()] allows per round before surrendering the time slice --
/// big enough to amortize a scheduler trip under light contention, small enough not to melt
/// the CPUs under heavy contention
pub const DEFAULT_SPIN_COUNT: u32 = 40;

/// What [SpinLock::acquire()] does when an attempt finds the lock already owned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPolicy {
    /// no synchronization at all: acquisitions & releases are empty operations and **no exclusion
    /// is provided** -- measures the overhead of everything around the lock
    NoOp,
    /// retries forever, relaxing the CPU between attempts but never telling the scheduler a thing
    PureSpin,
    /// surrenders the time slice after every failed attempt
    AlwaysYield,
    /// retries up to the given number of times, yields once, then starts a fresh round
    /// with the full budget
    BoundedSpin(u32),
}

impl Default for SpinPolicy {
    fn default() -> Self {
        SpinPolicy::BoundedSpin(DEFAULT_SPIN_COUNT)
    }
}

impl fmt::Display for SpinPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpinPolicy::NoOp                    => write!(f, "NoOp"),
            SpinPolicy::PureSpin                => write!(f, "PureSpin"),
            SpinPolicy::AlwaysYield             => write!(f, "AlwaysYield"),
            SpinPolicy::BoundedSpin(spin_count) => write!(f, "BoundedSpin({spin_count})"),
        }
    }
}


/// A mutual-exclusion primitive over a single [AtomicBool], waiting as per the [SpinPolicy] given
/// at construction.\
/// States are `{Unlocked, Locked}` and there is no poisoning: a thread that dies while owning the
/// lock leaves it locked forever.\
/// Misuse -- releasing without a matching successful acquisition, or acquiring twice from the same
/// thread -- is not checked: the first is a contract violation letting two owners in; the second
/// self-deadlocks.
pub struct SpinLock {
    /// `true` while some thread owns the lock -- touched exclusively through atomic operations
    owned:  AtomicBool,
    policy: SpinPolicy,
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new(SpinPolicy::default())
    }
}

impl SpinLock {

    pub fn new(policy: SpinPolicy) -> Self {
        // a zero budget would never spin, making it just a pure spinner paying for a useless counter
        let policy = match policy {
            SpinPolicy::BoundedSpin(0) => SpinPolicy::PureSpin,
            other                      => other,
        };
        Self {
            owned: AtomicBool::new(false),
            policy,
        }
    }

    /// Returns when the lock was acquired (immediately, under [SpinPolicy::NoOp]) -- waiting,
    /// when needed, the policy's way
    #[inline(always)]
    pub fn acquire(&self) {
        match self.policy {
            SpinPolicy::NoOp =>
                (),
            SpinPolicy::PureSpin =>
                while self.owned.compare_exchange_weak(false, true, Acquire, Relaxed).is_err() {
                    spin_loop();
                },
            SpinPolicy::AlwaysYield =>
                while self.owned.compare_exchange_weak(false, true, Acquire, Relaxed).is_err() {
                    thread::yield_now();
                },
            SpinPolicy::BoundedSpin(spin_count) => {
                let mut budget = spin_count;
                while self.owned.compare_exchange_weak(false, true, Acquire, Relaxed).is_err() {
                    budget -= 1;
                    if budget == 0 {
                        thread::yield_now();
                        // the budget resets after each yield: one scheduler trip per exhausted round
                        budget = spin_count;
                    } else {
                        spin_loop();
                    }
                }
            },
        }
    }

    /// A single acquisition attempt, never waiting: `true` if the caller now owns the lock --
    /// which is always the case under [SpinPolicy::NoOp]
    #[inline(always)]
    pub fn try_acquire(&self) -> bool {
        match self.policy {
            SpinPolicy::NoOp => true,
            _                => self.owned.compare_exchange(false, true, Acquire, Relaxed).is_ok(),
        }
    }

    /// Hands the lock back, returning immediately.\
    /// To be called only by the current owner -- see the misuse notes on [SpinLock]
    #[inline(always)]
    pub fn release(&self) {
        match self.policy {
            SpinPolicy::NoOp => (),
            _                => self.owned.store(false, Release),
        }
    }

    /// Tells if some thread owns the lock at this instant -- a reporting/diagnosis helper:
    /// the answer may be stale by the time the caller inspects it
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        self.owned.load(Relaxed)
    }

    /// The policy this lock operates under -- normalized at construction
    /// (a zero-budget [SpinPolicy::BoundedSpin] is promoted to [SpinPolicy::PureSpin])
    pub fn policy(&self) -> SpinPolicy {
        self.policy
    }

}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [spin_lock](super) module

    use super::*;
    use std::time::Duration;

    /// walks a lock through its two states, checking every operation's answer along the way
    #[cfg_attr(not(doc), test)]
    fn state_machine_walks_there_and_back() {
        let lock = SpinLock::new(SpinPolicy::PureSpin);
        assert!(!lock.is_locked(),   "freshly built locks must start unlocked");
        assert!(lock.try_acquire(),  "acquisition attempts on an unlocked lock must succeed");
        assert!(lock.is_locked(),    "a successful acquisition must flip the lock to locked");
        assert!(!lock.try_acquire(), "acquisition attempts on a locked lock must fail");
        lock.release();
        assert!(!lock.is_locked(),   "releasing must flip the lock back to unlocked");
        lock.acquire();
        assert!(lock.is_locked(),    "`acquire()` on an unlocked lock must return owning it");
        lock.release();
        assert!(!lock.is_locked(),   "releasing must flip the lock back to unlocked");
    }

    /// the no-op policy must not even touch the ownership flag -- it measures the harness, not a lock
    #[cfg_attr(not(doc), test)]
    fn noop_policy_performs_no_synchronization() {
        let lock = SpinLock::new(SpinPolicy::NoOp);
        lock.acquire();
        assert!(!lock.is_locked(),  "no-op acquisitions must leave the ownership flag untouched");
        assert!(lock.try_acquire(), "no-op acquisition attempts must always succeed");
        assert!(!lock.is_locked(),  "no-op acquisition attempts must leave the ownership flag untouched");
        lock.release();
        assert!(!lock.is_locked(),  "no-op releases must leave the ownership flag untouched");
    }

    /// a spin budget of zero degenerates to never yielding -- construction normalizes it away
    #[cfg_attr(not(doc), test)]
    fn zero_spin_budget_is_promoted_to_pure_spin() {
        let lock = SpinLock::new(SpinPolicy::BoundedSpin(0));
        assert_eq!(lock.policy(), SpinPolicy::PureSpin, "a zero spin budget must be promoted at construction");
        let lock = SpinLock::new(SpinPolicy::BoundedSpin(1));
        assert_eq!(lock.policy(), SpinPolicy::BoundedSpin(1), "non-zero budgets must be preserved");
    }

    /// every waiting policy must eventually hand a contended lock over once the owner lets go
    #[cfg_attr(not(doc), test)]
    fn contended_acquisitions_eventually_succeed() {
        for policy in [SpinPolicy::PureSpin, SpinPolicy::AlwaysYield, SpinPolicy::BoundedSpin(3)] {
            let lock = SpinLock::new(policy);
            lock.acquire();
            crossbeam::scope(|scope| {
                let contender = scope.spawn(|_| {
                    lock.acquire();
                    lock.release();
                });
                // give the contender time to reach its waiting loop before letting the lock go
                thread::sleep(Duration::from_millis(10));
                lock.release();
                contender.join().expect("contender thread panicked");
            }).expect("crossbeam scope failed");
            assert!(!lock.is_locked(), "lock must end unlocked after the contention dance, under policy {policy}");
        }
    }

    /// the default policy is the bounded spinner with the tuned budget
    #[cfg_attr(not(doc), test)]
    fn default_policy() {
        assert_eq!(SpinPolicy::default(), SpinPolicy::BoundedSpin(DEFAULT_SPIN_COUNT), "unexpected default policy");
        assert_eq!(SpinLock::default().policy(), SpinPolicy::default(),                "default locks must run the default policy");
        assert_eq!(SpinPolicy::default().to_string(), "BoundedSpin(40)",               "unexpected default policy label");
    }
}
