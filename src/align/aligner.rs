//! Incremental affine-gap k-mer aligner (C6, spec.md §4.5).

use super::trace::{AlignmentEvent, NodeId, TraceArena, TraceNode, TraceType};
use super::weights::AlignmentWeights;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Align consensus rightward from the left anchor.
    Forward,
    /// Align consensus leftward from the right anchor; the reference
    /// window passed to `KmerAligner::new` is already reversed by the
    /// caller so the recurrences are identical either way.
    Reverse,
}

/// One computed column: the non-zero cell of each of the three score
/// layers for every reference row, or `NodeId::ZERO` where the layer is
/// empty at that row.
#[derive(Debug, Clone)]
struct Column {
    align: Vec<NodeId>,
    gap_ref: Vec<NodeId>,
    gap_con: Vec<NodeId>,
}

impl Column {
    fn empty(len: usize) -> Column {
        Column {
            align: vec![NodeId::ZERO; len],
            gap_ref: vec![NodeId::ZERO; len],
            gap_con: vec![NodeId::ZERO; len],
        }
    }
}

fn score_of(arena: &TraceArena, id: NodeId) -> f32 {
    arena.get(id).score
}

/// Pick the best-scoring of several predecessor candidates, breaking ties
/// by the canonical `TraceType` order (spec.md §4.4): a candidate whose
/// own node represents a mismatch outranks one representing a gap, which
/// outranks a match, when their scores are otherwise equal.
fn best_of(arena: &TraceArena, candidates: &[NodeId]) -> NodeId {
    let mut best = candidates[0];
    let mut best_score = score_of(arena, best);
    let mut best_type = node_type_of(arena, best);
    for &cand in &candidates[1..] {
        let cand_score = score_of(arena, cand);
        let cand_type = node_type_of(arena, cand);
        if cand_score > best_score || (cand_score == best_score && cand_type < best_type) {
            best = cand;
            best_score = cand_score;
            best_type = cand_type;
        }
    }
    best
}

fn node_type_of(arena: &TraceArena, id: NodeId) -> TraceType {
    if id.is_zero() {
        TraceType::None
    } else {
        arena.get(id).node_type
    }
}

/// Insert a new node unless its score is non-positive, in which case the
/// cell stays `ZERO` (spec.md §4.5, "any negative cell is clamped to
/// ZERO_NODE").
fn maybe_push(arena: &mut TraceArena, score: f32, node_type: TraceType, next: NodeId) -> NodeId {
    if score <= 0.0 {
        NodeId::ZERO
    } else {
        arena.push(TraceNode {
            score,
            node_type,
            next,
            branch: NodeId::ZERO,
        })
    }
}

pub struct KmerAligner {
    weights: AlignmentWeights,
    ref_window: Vec<u8>,
    direction: Direction,
    arena: TraceArena,
    columns: Vec<Column>,
    consensus: Vec<u8>,
    max_score: f32,
    max_score_node: NodeId,
    columns_since_improved: usize,
    termination_window: usize,
}

impl KmerAligner {
    /// `ref_window` is the reference slice from the seeding anchor to the
    /// far end of the active region (already reversed by the caller for a
    /// reverse build). `k` is the anchor length; `termination_window` is
    /// `2*k + maxGapLen` (spec.md §4.5).
    pub fn new(
        ref_window: &[u8],
        weights: AlignmentWeights,
        k: usize,
        direction: Direction,
        termination_window: usize,
    ) -> KmerAligner {
        let mut arena = TraceArena::new();
        let ref_window = ref_window.to_vec();
        let len = ref_window.len() + 1;
        let mut seed = Column::empty(len);
        let mut max_score = 0.0;
        let mut max_score_node = NodeId::ZERO;
        if k < len {
            // The anchor k-mer matches the reference by construction: seed
            // the diagonal with k individual MATCH nodes (not one node
            // worth k*m) so CIGAR extraction reports `k=` like any other
            // run of matches.
            let mut node = NodeId::ZERO;
            let mut score = 0.0f32;
            for _ in 0..k {
                score += weights.match_score;
                node = arena.push(TraceNode {
                    score,
                    node_type: TraceType::Match,
                    next: node,
                    branch: NodeId::ZERO,
                });
            }
            seed.align[k] = node;
            max_score = score;
            max_score_node = node;
        }
        KmerAligner {
            weights,
            ref_window,
            direction,
            arena,
            columns: vec![seed],
            consensus: Vec::new(),
            max_score,
            max_score_node,
            columns_since_improved: 0,
            termination_window,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn consensus_len(&self) -> usize {
        self.consensus.len()
    }

    pub fn max_score(&self) -> f32 {
        self.max_score
    }

    /// Compute the next column for `base`. Returns `false` when early
    /// termination has fired (the caller should stop appending).
    pub fn add_base(&mut self, base: u8) -> bool {
        let ref_len = self.ref_window.len();
        let go = self.weights.gap_open;
        let ge = self.weights.gap_extend;

        let prev = self.columns.last().expect("seed column always present");
        let prev_align = prev.align.clone();
        let prev_gap_ref = prev.gap_ref.clone();
        let prev_gap_con = prev.gap_con.clone();

        let mut col = Column::empty(ref_len + 1);

        for j in 1..=ref_len {
            let diag = [prev_align[j - 1], prev_gap_ref[j - 1], prev_gap_con[j - 1]];
            let diag_best = best_of(&self.arena, &diag);
            let s = self.weights.substitution_score(base, self.ref_window[j - 1]);
            let matched = base.to_ascii_uppercase() == self.ref_window[j - 1].to_ascii_uppercase();
            let align_type = if matched { TraceType::Match } else { TraceType::Mismatch };
            let align_score = score_of(&self.arena, diag_best) + s;
            col.align[j] = maybe_push(&mut self.arena, align_score, align_type, diag_best);

            let open = [prev_align[j]];
            let extend = [prev_gap_ref[j]];
            let open_score = score_of(&self.arena, open[0]) + go + ge;
            let extend_score = score_of(&self.arena, extend[0]) + ge;
            let (gap_ref_score, gap_ref_from) = if open_score >= extend_score {
                (open_score, open[0])
            } else {
                (extend_score, extend[0])
            };
            col.gap_ref[j] = maybe_push(&mut self.arena, gap_ref_score, TraceType::GapRef, gap_ref_from);

            let open_con = col.align[j - 1];
            let extend_con = col.gap_con[j - 1];
            let open_con_score = score_of(&self.arena, open_con) + go + ge;
            let extend_con_score = score_of(&self.arena, extend_con) + ge;
            let (gap_con_score, gap_con_from) = if open_con_score >= extend_con_score {
                (open_con_score, open_con)
            } else {
                (extend_con_score, extend_con)
            };
            col.gap_con[j] = maybe_push(&mut self.arena, gap_con_score, TraceType::GapCon, gap_con_from);
        }

        let column_best = best_of(
            &self.arena,
            &[
                *col.align.last().unwrap(),
                col.gap_ref.last().copied().unwrap(),
                col.gap_con.last().copied().unwrap(),
            ],
        );
        let column_best_score = score_of(&self.arena, column_best);

        self.consensus.push(base);
        self.columns.push(col);

        if column_best_score > self.max_score {
            self.max_score = column_best_score;
            self.max_score_node = column_best;
            self.columns_since_improved = 0;
        } else {
            self.columns_since_improved += 1;
        }

        self.columns_since_improved < self.termination_window
    }

    /// Drop every column built after `consensus_size` bases were appended,
    /// reverting the aligner to that point (the saved-state restore path;
    /// spec.md §4.5).
    pub fn truncate(&mut self, consensus_size: usize) {
        self.consensus.truncate(consensus_size);
        self.columns.truncate(consensus_size + 1);
        self.recompute_max_score();
    }

    fn recompute_max_score(&mut self) {
        let mut max_score = 0.0;
        let mut max_node = NodeId::ZERO;
        for col in &self.columns {
            let best = best_of(
                &self.arena,
                &[
                    *col.align.last().unwrap(),
                    col.gap_ref.last().copied().unwrap(),
                    col.gap_con.last().copied().unwrap(),
                ],
            );
            let score = score_of(&self.arena, best);
            if score > max_score {
                max_score = score;
                max_node = best;
            }
        }
        self.max_score = max_score;
        self.max_score_node = max_node;
        self.columns_since_improved = 0;
    }

    /// Reconstruct the canonical maximum-score alignment if (and only if)
    /// it reaches the far end of the reference window, i.e. lands on the
    /// opposite anchor k-mer. `opposite_end_open` allows a short alignment
    /// when the region itself is end-called on that side.
    pub fn finish(&self, opposite_end_open: bool) -> Option<AlignmentEvent> {
        let ref_len = self.ref_window.len();
        let last_col = self.columns.last()?;
        let end_node = best_of(
            &self.arena,
            &[
                last_col.align[ref_len],
                last_col.gap_ref[ref_len],
                last_col.gap_con[ref_len],
            ],
        );
        if end_node.is_zero() && !opposite_end_open {
            return None;
        }
        if end_node.is_zero() {
            return Some(AlignmentEvent::default());
        }
        Some(AlignmentEvent::from_trace(&self.arena, end_node))
    }

    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_match_scores_full_length() {
        let reference = b"ACGTACGTAC";
        let weights = AlignmentWeights::default();
        let mut aligner = KmerAligner::new(reference, weights, 3, Direction::Forward, 100);
        for &b in &reference[..] {
            aligner.add_base(b);
        }
        // 3 anchor bases + 10 appended, all matching
        assert_eq!(aligner.max_score(), 13.0 * weights.match_score);
        let event = aligner.finish(false).unwrap();
        assert!(event.elements.iter().all(|e| e.op == super::super::trace::CigarOp::Match));
    }

    #[test]
    fn single_mismatch_breaks_the_match_run() {
        let reference = b"ACGTACGTAC";
        let weights = AlignmentWeights::default();
        let mut aligner = KmerAligner::new(reference, weights, 3, Direction::Forward, 100);
        let consensus = b"ACGTTCGTAC";
        for &b in consensus {
            aligner.add_base(b);
        }
        let event = aligner.finish(false).unwrap();
        let mismatches = event
            .elements
            .iter()
            .filter(|e| e.op == super::super::trace::CigarOp::Mismatch)
            .count();
        assert_eq!(mismatches, 1);
    }

    #[test]
    fn early_termination_stops_non_improving_extension() {
        let reference = b"ACG";
        let weights = AlignmentWeights::default();
        let mut aligner = KmerAligner::new(reference, weights, 3, Direction::Forward, 4);
        let mut kept_going = true;
        for _ in 0..20 {
            kept_going = aligner.add_base(b'T');
            if !kept_going {
                break;
            }
        }
        assert!(!kept_going);
    }

    #[test]
    fn truncate_reverts_consensus_and_score() {
        let reference = b"ACGTACGTAC";
        let weights = AlignmentWeights::default();
        let mut aligner = KmerAligner::new(reference, weights, 3, Direction::Forward, 100);
        for &b in &reference[..5] {
            aligner.add_base(b);
        }
        let score_at_5 = aligner.max_score();
        for &b in &reference[5..] {
            aligner.add_base(b);
        }
        assert!(aligner.max_score() >= score_at_5);
        aligner.truncate(5);
        assert_eq!(aligner.consensus_len(), 5);
        assert_eq!(aligner.max_score(), score_at_5);
    }
}
