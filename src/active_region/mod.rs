//! Active-region detection (C3, spec.md §4.2).
//!
//! Scans a [`ReferenceRegion`]'s per-base k-mer frequency vector for
//! intervals where the sample's k-mer support drops sharply away from the
//! reference and does not recover until much later. That is the signature
//! of a local sequence difference when there is no read mapping to lean on.

mod config;
mod detector;

pub use config::ActiveRegionConfig;
pub use detector::{detect, max_gap_len, ActiveRegion};
