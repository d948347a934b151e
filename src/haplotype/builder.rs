//! Guided haplotype graph walk (C8, spec.md §4.6).

use std::collections::HashSet;
use std::rc::Rc;

use crate::active_region::ActiveRegion;
use crate::align::{AlignmentWeights, Direction, KmerAligner, SavedState, StateStack};
use crate::kmer::{Base, Kmer, KmerCounter};
use crate::reference::ReferenceRegion;

use super::{Haplotype, HaplotypeContainer, HaplotypeStats};

#[derive(Debug, Clone, Copy)]
pub struct BuilderConfig {
    pub max_state: usize,
    pub max_haplotypes: usize,
    pub max_repeat_count: u32,
    pub count_reverse: bool,
}

impl Default for BuilderConfig {
    fn default() -> BuilderConfig {
        BuilderConfig {
            max_state: 15,
            max_haplotypes: 15,
            max_repeat_count: 0,
            count_reverse: true,
        }
    }
}

enum StepResult {
    Continue,
    Stopped,
}

/// Walk `active` within `region`, producing every haplotype the container
/// keeps. One call covers exactly one active region.
pub fn build_haplotypes(
    region: &ReferenceRegion,
    active: &ActiveRegion,
    counter: &dyn KmerCounter,
    weights: &AlignmentWeights,
    cfg: &BuilderConfig,
) -> HaplotypeContainer {
    let k = region.k;
    let reverse = active.left_end && !active.right_end;
    let gap_len = crate::active_region::max_gap_len(weights, k);
    let termination_window = 2 * k + gap_len;

    let (ref_window, anchor, opposite_open) = if reverse {
        let end = active.r_idx; // anchor sits at [r_idx, r_idx+k)
        let mut w = region.sequence[0..end].to_vec();
        w.reverse();
        (w, active.right_anchor, active.left_end)
    } else {
        let start = active.l_idx + k;
        let end = if active.right_end {
            region.sequence.len()
        } else {
            active.r_idx + k
        };
        let w = region.sequence[start..end].to_vec();
        (w, active.left_anchor, active.right_end)
    };

    let direction = if reverse { Direction::Reverse } else { Direction::Forward };
    let mut aligner = KmerAligner::new(&ref_window, *weights, k, direction, termination_window);
    let mut container = HaplotypeContainer::new(cfg.max_haplotypes);
    let mut stack = StateStack::new(cfg.max_state);

    let mut kmer = anchor;
    let mut consensus: Vec<u8> = Vec::new();
    let mut min_depth: u32 = 0;
    let mut repeat_count: u32 = 0;
    let mut cycle_hash: Rc<HashSet<u64>> = Rc::new(HashSet::new());
    Rc::make_mut(&mut cycle_hash).insert(kmer.canonical().packed());

    'walk: loop {
        let step = extend_best(
            counter,
            cfg,
            &mut aligner,
            &mut kmer,
            &mut consensus,
            &mut min_depth,
            &mut cycle_hash,
            &mut repeat_count,
            &mut stack,
            reverse,
        );
        if let StepResult::Continue = step {
            continue 'walk;
        }

        yield_if_valid(&aligner, &consensus, anchor, opposite_open, reverse, min_depth, active, &mut container);

        loop {
            match stack.restore() {
                None => break 'walk,
                Some(state) => {
                    let resumed = resume(
                        state,
                        &mut aligner,
                        &mut kmer,
                        &mut consensus,
                        &mut min_depth,
                        &mut cycle_hash,
                        &mut repeat_count,
                        cfg,
                    );
                    match resumed {
                        StepResult::Continue => continue 'walk,
                        StepResult::Stopped => {
                            yield_if_valid(
                                &aligner, &consensus, anchor, opposite_open, reverse, min_depth, active,
                                &mut container,
                            );
                            continue;
                        }
                    }
                }
            }
        }
    }

    container
}

fn candidate_scores(
    counter: &dyn KmerCounter,
    kmer: &Kmer,
    reverse: bool,
    count_reverse: bool,
) -> [u32; 4] {
    let mut scores = [0u32; 4];
    for (i, &b) in Base::ALL.iter().enumerate() {
        let cand = if reverse { kmer.shift_left(b) } else { kmer.shift(b) };
        let fwd = counter.get(&cand);
        let rev = if count_reverse { counter.get_reverse(&cand) } else { 0 };
        scores[i] = fwd.saturating_add(rev);
    }
    scores
}

fn argmax(scores: &[u32; 4]) -> usize {
    let mut best = 0;
    for i in 1..4 {
        if scores[i] > scores[best] {
            best = i;
        }
    }
    best
}

fn combine_min_depth(min_depth: u32, score: u32) -> u32 {
    if min_depth == 0 {
        score.max(1)
    } else {
        min_depth.min(score)
    }
}

#[allow(clippy::too_many_arguments)]
fn extend_best(
    counter: &dyn KmerCounter,
    cfg: &BuilderConfig,
    aligner: &mut KmerAligner,
    kmer: &mut Kmer,
    consensus: &mut Vec<u8>,
    min_depth: &mut u32,
    cycle_hash: &mut Rc<HashSet<u64>>,
    repeat_count: &mut u32,
    stack: &mut StateStack,
    reverse: bool,
) -> StepResult {
    let scores = candidate_scores(counter, kmer, reverse, cfg.count_reverse);
    let bmax = argmax(&scores);
    if scores[bmax] == 0 {
        return StepResult::Stopped;
    }

    for (i, &b) in Base::ALL.iter().enumerate() {
        if i == bmax || scores[i] == 0 {
            continue;
        }
        let cand_kmer = if reverse { kmer.shift_left(b) } else { kmer.shift(b) };
        stack.save(SavedState {
            kmer: cand_kmer,
            next_base: b,
            consensus_size: consensus.len(),
            min_depth: combine_min_depth(*min_depth, scores[i]),
            cycle_hash: Rc::clone(cycle_hash),
            repeat_count: *repeat_count,
        });
    }

    let base = Base::ALL[bmax];
    *kmer = if reverse { kmer.shift_left(base) } else { kmer.shift(base) };
    consensus.push(base.to_u8());
    *min_depth = combine_min_depth(*min_depth, scores[bmax]);

    let aligner_continues = aligner.add_base(base.to_u8());
    let is_repeat = !Rc::make_mut(cycle_hash).insert(kmer.canonical().packed());
    if is_repeat {
        *repeat_count += 1;
    }

    if !aligner_continues || *repeat_count > cfg.max_repeat_count {
        StepResult::Stopped
    } else {
        StepResult::Continue
    }
}

#[allow(clippy::too_many_arguments)]
fn resume(
    state: SavedState,
    aligner: &mut KmerAligner,
    kmer: &mut Kmer,
    consensus: &mut Vec<u8>,
    min_depth: &mut u32,
    cycle_hash: &mut Rc<HashSet<u64>>,
    repeat_count: &mut u32,
    cfg: &BuilderConfig,
) -> StepResult {
    aligner.truncate(state.consensus_size);
    consensus.truncate(state.consensus_size);
    *kmer = state.kmer;
    *min_depth = state.min_depth;
    *cycle_hash = state.cycle_hash;
    *repeat_count = state.repeat_count;

    consensus.push(state.next_base.to_u8());
    let aligner_continues = aligner.add_base(state.next_base.to_u8());
    let is_repeat = !Rc::make_mut(cycle_hash).insert(kmer.canonical().packed());
    if is_repeat {
        *repeat_count += 1;
    }

    if !aligner_continues || *repeat_count > cfg.max_repeat_count {
        StepResult::Stopped
    } else {
        StepResult::Continue
    }
}

#[allow(clippy::too_many_arguments)]
fn yield_if_valid(
    aligner: &KmerAligner,
    consensus: &[u8],
    anchor: Kmer,
    opposite_open: bool,
    reverse: bool,
    min_depth: u32,
    active: &ActiveRegion,
    container: &mut HaplotypeContainer,
) {
    let Some(mut event) = aligner.finish(opposite_open) else {
        return;
    };
    if event.elements.is_empty() && consensus.is_empty() {
        return;
    }
    if reverse {
        event.elements.reverse();
    }

    let anchor_bases = anchor.to_bases();
    let sequence = if reverse {
        let mut rev_consensus = consensus.to_vec();
        rev_consensus.reverse();
        let mut seq = rev_consensus;
        seq.extend_from_slice(&anchor_bases);
        seq
    } else {
        let mut seq = anchor_bases;
        seq.extend_from_slice(consensus);
        seq
    };

    let haplotype = Haplotype {
        sequence,
        cigar: event,
        stats: HaplotypeStats { min: min_depth.max(1) },
        left_end: active.left_end,
        right_end: active.right_end,
    };
    container.add(haplotype);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::active_region::detect;
    use crate::active_region::ActiveRegionConfig;
    use crate::kmer::InMemoryCounter;

    fn simple_region(core: &[u8], k: usize) -> (ReferenceRegion, InMemoryCounter) {
        let mut counter = InMemoryCounter::new(k);
        counter.add_sequence(core);
        let region = ReferenceRegion::build("r", core, 0, core.len(), k, 0, &counter, true);
        (region, counter)
    }

    #[test]
    fn perfectly_supported_reference_yields_a_matching_haplotype() {
        let k = 4;
        let core = b"ACGTACGTACGTACGTACGT";
        let (region, counter) = simple_region(core, k);
        let weights = AlignmentWeights::default();
        let active = ActiveRegion {
            l_idx: 0,
            r_idx: region.freq.len() - 1,
            left_anchor: Kmer::from_bases(&core[0..k]).unwrap(),
            right_anchor: Kmer::from_bases(&core[core.len() - k..]).unwrap(),
            left_end: false,
            right_end: false,
        };
        let cfg = BuilderConfig::default();
        let container = build_haplotypes(&region, &active, &counter, &weights, &cfg);
        assert!(!container.is_empty());
        for h in container.iter() {
            assert!(h.stats.min >= 1);
        }
    }

    #[test]
    fn active_region_detection_runs_on_a_dipped_counter() {
        let k = 4;
        let core = b"AAAATGCAAAATGCAAAATGCAAAATGCAAAATGC";
        let (region, _counter) = simple_region(core, k);
        let cfg = ActiveRegionConfig::default();
        let weights = AlignmentWeights::default();
        let _ = detect(&region, &cfg, &weights);
    }
}
