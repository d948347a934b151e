//! Affine-gap alignment: weights (C4), trace graph/CIGAR (C5), the
//! incremental k-mer aligner (C6), and its saved-state stack (C7).

pub mod aligner;
pub mod state_stack;
pub mod trace;
pub mod weights;

pub use aligner::{Direction, KmerAligner};
pub use state_stack::{SavedState, StateStack};
pub use trace::{AlignmentEvent, CigarElement, CigarOp, NodeId, TraceArena, TraceNode, TraceType};
pub use weights::AlignmentWeights;
