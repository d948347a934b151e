//! LIFO saved-state pool for the haplotype walk (C7, spec.md §4.5).
//!
//! A saved state is the information needed to resume a walk at a branch
//! point: which alternative base to try, and the depth/cycle bookkeeping
//! that went with it. The alignment layers themselves are not duplicated
//! here. `TraceNode`s are immutable and the aligner retains every column
//! it has ever computed, so restoring a state only has to ask the aligner
//! to forget the columns built after the split (see `KmerAligner::truncate`).

use std::cmp::Reverse;
use std::rc::Rc;
use std::collections::HashSet;

use crate::kmer::{Base, Kmer};

/// One branch point not yet explored.
#[derive(Debug, Clone)]
pub struct SavedState {
    pub kmer: Kmer,
    pub next_base: Base,
    pub consensus_size: usize,
    pub min_depth: u32,
    pub cycle_hash: Rc<HashSet<u64>>,
    pub repeat_count: u32,
}

/// Bounded LIFO pool. When full, the least-likely-to-pay-off state is
/// evicted: spec.md ranks by `(consensusSize desc, savedMinDepth desc)`,
/// i.e. the state that had gone deepest with the least support is the one
/// least worth coming back to.
#[derive(Debug, Clone)]
pub struct StateStack {
    states: Vec<SavedState>,
    max_states: usize,
}

impl StateStack {
    pub fn new(max_states: usize) -> StateStack {
        StateStack {
            states: Vec::new(),
            max_states,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Push a new saved state, evicting the least-likely one first if the
    /// pool is already at capacity.
    pub fn save(&mut self, state: SavedState) {
        if self.states.len() >= self.max_states {
            self.evict_least_likely();
        }
        self.states.push(state);
    }

    /// Pop the most recently saved state (LIFO).
    pub fn restore(&mut self) -> Option<SavedState> {
        self.states.pop()
    }

    fn evict_least_likely(&mut self) {
        if self.states.is_empty() {
            return;
        }
        let (worst, _) = self
            .states
            .iter()
            .enumerate()
            .max_by_key(|(_, s)| (s.consensus_size, Reverse(s.min_depth)))
            .expect("non-empty");
        self.states.remove(worst);
    }
}
