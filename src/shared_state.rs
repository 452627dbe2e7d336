//! Resting place for [SharedState] -- the data the locks under measurement are protecting

use std::sync::atomic::{AtomicU64, Ordering::Relaxed};


/// The lock-protected data mutated inside every critical section: either a single counter
/// (all contention lands on one cache line) or an array of them (the mutation wanders through
/// memory, adding cache pressure to each critical section).\
/// Counters are atomics solely so racing mutations stay defined behavior; loads & stores are
/// split on purpose -- two threads inside the critical section at once will overwrite each
/// other's increments, turning a failed lock into an observable, not undefined, outcome.
pub struct SharedState {
    /// the counters -- `slots[0]` alone, for the single-counter shape
    slots:                   Box<[AtomicU64]>,
    /// how many increments [Self::mutate()] applies per call
    mutations_per_iteration: u32,
}

impl SharedState {

    /// A zeroed [SharedState] of `slot_count` counters (clamped to at least 1), whose [Self::mutate()]
    /// increments `mutations_per_iteration` of them per call
    pub fn new(slot_count: usize, mutations_per_iteration: u32) -> Self {
        let slots = (0..slot_count.max(1))
            .map(|_| AtomicU64::new(0))
            .collect::<Box<[AtomicU64]>>();
        Self {
            slots,
            mutations_per_iteration,
        }
    }

    /// The shape the contention sweep uses: one counter, incremented once per critical section
    pub fn single_counter() -> Self {
        Self::new(1, 1)
    }

    /// Applies the critical-section mutation for the given iteration number:
    /// `mutations_per_iteration` increments over deterministically sampled slots.\
    /// Increments are split load/add/store on purpose (see [SharedState]): callers failing to
    /// hold a real lock will lose updates here
    #[inline(always)]
    pub fn mutate(&self, iteration: u32) {
        for mutation in 0..self.mutations_per_iteration {
            let slot = &self.slots[self.sampled_slot(iteration, mutation)];
            slot.store(slot.load(Relaxed) + 1, Relaxed);
        }
    }

    /// The grand total over every counter -- the observable [crate::verifier] compares against
    /// the algebraically expected number of increments
    pub fn total(&self) -> u64 {
        self.slots.iter()
            .map(|slot| slot.load(Relaxed))
            .sum()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn mutations_per_iteration(&self) -> u32 {
        self.mutations_per_iteration
    }

    /// deterministic sampling of the slot the `mutation`-th increment of `iteration` lands on --
    /// a multiplicative Fibonacci-style stride scatters accesses over the whole array
    #[inline(always)]
    fn sampled_slot(&self, iteration: u32, mutation: u32) -> usize {
        const STRIDE: u64 = 0x9E3779B97F4A7C15;    // 2^64 / φ
        let scattered = (iteration as u64 + 1).wrapping_mul(STRIDE)
                                              .wrapping_add(mutation as u64)
                                              .wrapping_mul(STRIDE);
        (scattered % self.slots.len() as u64) as usize
    }

}


// unit tests
/////////////

#[cfg(any(test, doc))]
mod tests {
    //! Unit tests for the [shared_state](super) module

    use super::*;

    /// the single-counter shape accumulates exactly one increment per mutation call
    #[cfg_attr(not(doc), test)]
    fn single_counter_accumulates_one_increment_per_call() {
        let state = SharedState::single_counter();
        assert_eq!(state.slot_count(), 1,              "the single-counter shape must have a single slot");
        assert_eq!(state.mutations_per_iteration(), 1, "the single-counter shape must mutate once per call");
        for iteration in 0..1000 {
            state.mutate(iteration);
        }
        assert_eq!(state.total(), 1000, "1000 calls x 1 mutation each must total 1000");
    }

    /// the array shape splits its increments over sampled slots, but the grand total is still
    /// `calls x mutations_per_iteration` -- slot collisions don't lose anything
    #[cfg_attr(not(doc), test)]
    fn array_shape_totals_follow_the_same_algebra() {
        let state = SharedState::new(1 << 10, 3);
        assert_eq!(state.slot_count(), 1 << 10, "wrong slot count");
        for iteration in 0..100 {
            state.mutate(iteration);
        }
        assert_eq!(state.total(), 300, "100 calls x 3 mutations each must total 300");
    }

    /// sampling is a pure function of the iteration & mutation numbers, so concurrent runs of the
    /// same scenario hit the same slots in the same order
    #[cfg_attr(not(doc), test)]
    fn sampling_is_deterministic() {
        let state = SharedState::new(64, 4);
        let baseline: Vec<usize> = (0..32)
            .flat_map(|iteration| (0..4).map(move |mutation| (iteration, mutation)))
            .map(|(iteration, mutation)| state.sampled_slot(iteration, mutation))
            .collect();
        let repeated: Vec<usize> = (0..32)
            .flat_map(|iteration| (0..4).map(move |mutation| (iteration, mutation)))
            .map(|(iteration, mutation)| state.sampled_slot(iteration, mutation))
            .collect();
        assert_eq!(repeated, baseline,                          "slot sampling must be deterministic");
        assert!(baseline.iter().all(|&slot| slot < 64),         "sampled slots must stay in bounds");
        assert!(baseline.iter().collect::<std::collections::HashSet<_>>().len() > 1,
                "sampling must scatter over more than one slot");
    }

    /// degenerate constructions must not blow up the sampling arithmetic
    #[cfg_attr(not(doc), test)]
    fn degenerate_shapes_are_harmless() {
        let state = SharedState::new(0, 1);
        assert_eq!(state.slot_count(), 1, "a zero slot count must be clamped to 1");
        state.mutate(42);
        assert_eq!(state.total(), 1, "the clamped single slot must take the increments");

        let state = SharedState::new(8, 0);
        state.mutate(42);
        assert_eq!(state.total(), 0, "zero mutations per iteration must leave the counters untouched");
    }
}
