//! Sparse linked trace DAG and canonical CIGAR extraction (C5, spec.md §4.4).
//!
//! Trace nodes are immutable and arena-allocated, one arena per active
//! region (REDESIGN FLAGS, spec.md §9): `next`/`branch` are indices into the
//! arena rather than pointers, so the whole trace is dropped in one step
//! when the region is done with it.

use std::cmp::Ordering;

/// Index of a node within a [`TraceArena`]. `ZERO` is the shared sentinel
/// that stands in for an empty cell and is never produced by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub const ZERO: NodeId = NodeId(0);

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// The kind of step a trace node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceType {
    None,
    Match,
    Mismatch,
    GapRef,
    GapCon,
}

impl TraceType {
    /// Canonical alternative ordering (spec.md §4.4): at the first position
    /// where two alternatives differ, `Mismatch < GapRef < GapCon < Match`
    /// (the leftmost, most-disruptive alignment wins in homopolymers).
    fn rank(self) -> u8 {
        match self {
            TraceType::Mismatch => 0,
            TraceType::GapRef => 1,
            TraceType::GapCon => 2,
            TraceType::Match => 3,
            TraceType::None => 4,
        }
    }
}

impl PartialOrd for TraceType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TraceType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

/// Immutable record of one alignment-matrix cell (spec.md §3, "Trace node").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceNode {
    pub score: f32,
    pub node_type: TraceType,
    pub next: NodeId,
    pub branch: NodeId,
}

impl TraceNode {
    const ZERO_NODE: TraceNode = TraceNode {
        score: 0.0,
        node_type: TraceType::None,
        next: NodeId::ZERO,
        branch: NodeId::ZERO,
    };
}

/// Arena owning every trace node produced while aligning one active region.
#[derive(Debug, Clone)]
pub struct TraceArena {
    nodes: Vec<TraceNode>,
}

impl Default for TraceArena {
    fn default() -> Self {
        TraceArena {
            nodes: vec![TraceNode::ZERO_NODE],
        }
    }
}

impl TraceArena {
    pub fn new() -> TraceArena {
        TraceArena::default()
    }

    pub fn get(&self, id: NodeId) -> TraceNode {
        self.nodes[id.0 as usize]
    }

    /// Insert a new node, never producing `ZERO_NODE` (a transition that
    /// would score non-positive is clamped to `ZERO` by the caller instead
    /// of being inserted here).
    pub fn push(&mut self, node: TraceNode) -> NodeId {
        debug_assert!(node.score > 0.0 || node.node_type != TraceType::None);
        self.nodes.push(node);
        NodeId((self.nodes.len() - 1) as u32)
    }

    /// Append `candidate` as an alternative to the chain already rooted at
    /// `head`, keeping the chain ordered by descending score and, within a
    /// tie, by canonical `TraceType` order.
    pub fn insert_branch(&mut self, head: NodeId, mut candidate: TraceNode) -> NodeId {
        if head.is_zero() {
            return self.push(candidate);
        }
        let head_node = self.get(head);
        if candidate.score > head_node.score
            || (candidate.score == head_node.score && candidate.node_type < head_node.node_type)
        {
            candidate.branch = head;
            return self.push(candidate);
        }
        let new_branch = self.insert_branch(head_node.branch, candidate);
        let mut updated = head_node;
        updated.branch = new_branch;
        self.push(updated)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// A single run of the alignment, e.g. 10 matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarElement {
    pub op: CigarOp,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOp {
    Match,
    Mismatch,
    Ins,
    Del,
}

impl CigarOp {
    pub fn symbol(self) -> char {
        match self {
            CigarOp::Match => '=',
            CigarOp::Mismatch => 'X',
            CigarOp::Ins => 'I',
            CigarOp::Del => 'D',
        }
    }
}

/// Canonical form of a trace: runs of identical step type collapsed into
/// `CigarElement`s (spec.md §3, "Alignment event").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentEvent {
    pub elements: Vec<CigarElement>,
}

impl AlignmentEvent {
    /// Walk the node chain rooted at `head` back to `ZERO`, collapsing runs
    /// of identical type. The chain is walked tail-to-head (from the
    /// highest-scoring endpoint back towards the anchor) so the result is
    /// reversed into left-to-right (reference-forward) order at the end.
    pub fn from_trace(arena: &TraceArena, mut head: NodeId) -> AlignmentEvent {
        let mut steps: Vec<TraceType> = Vec::new();
        while !head.is_zero() {
            let node = arena.get(head);
            steps.push(node.node_type);
            head = node.next;
        }
        steps.reverse();

        let mut elements: Vec<CigarElement> = Vec::new();
        for step in steps {
            let op = match step {
                TraceType::Match => CigarOp::Match,
                TraceType::Mismatch => CigarOp::Mismatch,
                TraceType::GapRef => CigarOp::Ins,
                TraceType::GapCon => CigarOp::Del,
                TraceType::None => continue,
            };
            match elements.last_mut() {
                Some(last) if last.op == op => last.count += 1,
                _ => elements.push(CigarElement { op, count: 1 }),
            }
        }
        AlignmentEvent { elements }
    }

    pub fn to_cigar_string(&self) -> String {
        self.elements
            .iter()
            .map(|e| format!("{}{}", e.count, e.op.symbol()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_node_is_never_pushed_as_a_regular_node() {
        let arena = TraceArena::new();
        assert_eq!(arena.get(NodeId::ZERO).node_type, TraceType::None);
        assert_eq!(arena.get(NodeId::ZERO).score, 0.0);
    }

    #[test]
    fn canonical_order_prefers_mismatch_over_match_on_tie() {
        assert!(TraceType::Mismatch < TraceType::GapRef);
        assert!(TraceType::GapRef < TraceType::GapCon);
        assert!(TraceType::GapCon < TraceType::Match);
    }

    #[test]
    fn cigar_collapses_runs_and_uses_legal_symbols() {
        let mut arena = TraceArena::new();
        let n1 = arena.push(TraceNode {
            score: 10.0,
            node_type: TraceType::Match,
            next: NodeId::ZERO,
            branch: NodeId::ZERO,
        });
        let n2 = arena.push(TraceNode {
            score: 20.0,
            node_type: TraceType::Match,
            next: n1,
            branch: NodeId::ZERO,
        });
        let n3 = arena.push(TraceNode {
            score: 10.0,
            node_type: TraceType::Mismatch,
            next: n2,
            branch: NodeId::ZERO,
        });
        let event = AlignmentEvent::from_trace(&arena, n3);
        assert_eq!(event.to_cigar_string(), "2=1X");
        // no two consecutive runs share a type
        for w in event.elements.windows(2) {
            assert_ne!(w[0].op, w[1].op);
        }
        for e in &event.elements {
            assert!(e.count > 0);
        }
    }
}
