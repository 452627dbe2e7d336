//! Resting place for the correctness oracle: compares the counter total a workload run left behind
//! against the algebraically expected one, catching locks that let racing critical sections through.\
//! Lock benchmarks are notorious for measuring broken locks really fast -- a mismatch here voids
//! the timing that came with it.

use crate::types::{LockVariant, TestParameters};
use std::fmt;


/// The total [crate::SharedState] must reach if the lock excluded every concurrent critical section:
/// `threads x iterations x mutations-per-iteration` -- deterministic, computable before the run
pub fn expected_total(params: &TestParameters, mutations_per_iteration: u32) -> u64 {
    params.thread_count as u64 * params.iteration_count as u64 * mutations_per_iteration as u64
}

/// Judges a finished run: equal totals prove every critical section executed exclusively;
/// anything else means updates were lost to races and the measurement is garbage
pub fn verify(variant:        LockVariant,
              params:         &TestParameters,
              expected_total: u64,
              observed_total: u64)
             -> Result<(), VerificationFailure> {
    if observed_total == expected_total {
        Ok(())
    } else {
        Err(VerificationFailure {
            variant,
            params: *params,
            expected_total,
            observed_total,
        })
    }
}


/// Proof that a lock variant failed to exclude concurrent critical sections, carrying everything
/// needed to reproduce: the variant, the scenario & both totals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationFailure {
    pub variant:        LockVariant,
    pub params:         TestParameters,
    pub expected_total: u64,
    pub observed_total: u64,
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mutual exclusion violated by '{}' at {} threads x {} iterations (non-contended work: {}): \
                   expected {} counter updates, observed {} -- {} updates were lost to races",
               self.variant,
               self.params.thread_count, self.params.iteration_count, self.params.non_contended_work,
               self.expected_total, self.observed_total,
               self.expected_total.abs_diff(self.observed_total))
    }
}

impl std::error::Error for VerificationFailure {}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [verifier](super) module

    use super::*;
    use crate::spin_lock::SpinPolicy;

    /// the expected total follows the scenario knobs, whatever the counter shape
    #[cfg_attr(not(doc), test)]
    fn expected_totals_follow_the_scenario_knobs() {
        let single_mutation = 1;
        assert_eq!(expected_total(&TestParameters { thread_count: 1, iteration_count: 1000, non_contended_work: 0 }, single_mutation),
                   1000,
                   "1 thread x 1000 iterations x 1 mutation must expect 1000");
        assert_eq!(expected_total(&TestParameters { thread_count: 4, iteration_count: 250, non_contended_work: 0 }, single_mutation),
                   1000,
                   "4 threads x 250 iterations x 1 mutation must expect 1000");
        assert_eq!(expected_total(&TestParameters { thread_count: 4, iteration_count: 250, non_contended_work: 0 }, 3),
                   3000,
                   "4 threads x 250 iterations x 3 mutations must expect 3000");
        // totals routinely overflow 32 bits on the widest scenarios
        assert_eq!(expected_total(&TestParameters { thread_count: 16, iteration_count: 1_000_000_000, non_contended_work: 0 }, 1),
                   16_000_000_000,
                   "wide scenarios must not overflow the expected total");
    }

    /// matching totals pass, silently
    #[cfg_attr(not(doc), test)]
    fn matching_totals_verify_ok() {
        let params = TestParameters { thread_count: 4, iteration_count: 250, non_contended_work: 0 };
        let result = verify(LockVariant::StdMutex, &params, 1000, 1000);
        assert!(result.is_ok(), "equal totals must verify Ok, but got {result:?}");
    }

    /// a mismatch must name the variant, the full scenario & both totals -- enough to reproduce
    #[cfg_attr(not(doc), test)]
    fn mismatches_tell_the_whole_story() {
        let params = TestParameters { thread_count: 4, iteration_count: 250, non_contended_work: 7 };
        let variant = LockVariant::Spin(SpinPolicy::PureSpin);
        let failure = verify(variant, &params, 1000, 997)
            .expect_err("unequal totals must fail verification");
        assert_eq!(failure.variant,        variant, "wrong variant reported");
        assert_eq!(failure.params,         params,  "wrong scenario reported");
        assert_eq!(failure.expected_total, 1000,    "wrong expected total reported");
        assert_eq!(failure.observed_total, 997,     "wrong observed total reported");
        let message = failure.to_string();
        for needle in ["PureSpin", "4 threads", "250 iterations", "non-contended work: 7", "1000", "997", "3 updates"] {
            assert!(message.contains(needle), "the failure message lacks '{needle}': {message}");
        }
    }
}
