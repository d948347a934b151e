//! Reference-region model (C2, spec.md §4.1).

use crate::kmer::{Kmer, KmerCounter};

/// Default flank length for a given k, `floor(k * 1.5)` (spec.md §3).
pub fn default_flank_len(k: usize) -> usize {
    (k * 3) / 2
}

/// A sub-range of a reference sequence, padded on both sides by flanks of
/// up to `flank_len` bases, together with the per-base k-mer frequency
/// vector the active-region detector scans.
///
/// Region coordinates are 1-based over the *full* region sequence
/// (including flanks): position 1 is the first base of the left flank (or
/// of the core, if there is no left flank because the core starts at the
/// reference boundary).
#[derive(Debug, Clone)]
pub struct ReferenceRegion {
    pub reference_name: String,
    /// Region sequence including both flanks.
    pub sequence: Vec<u8>,
    /// 0-based offset of `sequence[0]` within the full reference sequence.
    pub ref_start: usize,
    pub flank_len_left: usize,
    pub flank_len_right: usize,
    /// Length, in bases, of the non-flank core interval.
    pub core_len: usize,
    pub k: usize,
    /// Per-base k-mer frequency, `sequence.len() - k + 1` entries, where
    /// entry `i` is the frequency of the k-mer starting at region offset
    /// `i` (0-based).
    pub freq: Vec<u32>,
}

impl ReferenceRegion {
    /// Build a region covering `[core_start, core_start + core_len)` (0-based,
    /// half-open) of `reference_bases`, padded by flanks up to `flank_len`
    /// bases (capped at the reference boundary), and compute its per-base
    /// frequency vector against `counter`.
    pub fn build(
        reference_name: impl Into<String>,
        reference_bases: &[u8],
        core_start: usize,
        core_len: usize,
        k: usize,
        flank_len: usize,
        counter: &dyn KmerCounter,
        count_reverse: bool,
    ) -> ReferenceRegion {
        let ref_len = reference_bases.len();
        let core_end = core_start + core_len; // exclusive
        let flank_len_left = flank_len.min(core_start);
        let flank_len_right = flank_len.min(ref_len.saturating_sub(core_end));

        let region_start = core_start - flank_len_left;
        let region_end = (core_end + flank_len_right).min(ref_len);
        let sequence = reference_bases[region_start..region_end].to_vec();

        let freq = Self::compute_frequency_vector(&sequence, k, counter, count_reverse);

        ReferenceRegion {
            reference_name: reference_name.into(),
            sequence,
            ref_start: region_start,
            flank_len_left,
            flank_len_right,
            core_len,
            k,
            freq,
        }
    }

    fn compute_frequency_vector(
        sequence: &[u8],
        k: usize,
        counter: &dyn KmerCounter,
        count_reverse: bool,
    ) -> Vec<u32> {
        if sequence.len() < k {
            return Vec::new();
        }
        sequence
            .windows(k)
            .map(|window| {
                // Ambiguous bases inside the window are treated as A for the
                // lookup (spec.md §4.1); the counter typically returns 0 for
                // k-mers it never observed, which is the desired behavior.
                let kmer = Kmer::from_bases(window).expect("window has exactly k bases");
                let fwd = counter.get(&kmer);
                let rev = if count_reverse {
                    counter.get_reverse(&kmer)
                } else {
                    0
                };
                fwd.saturating_add(rev)
            })
            .collect()
    }

    /// Number of bases in the full region (including flanks).
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Map a 0-based region offset to a 0-based reference offset.
    pub fn region_offset_to_reference_offset(&self, region_offset: usize) -> usize {
        self.ref_start + region_offset
    }

    /// Map a 0-based reference offset back to a 0-based region offset, if it
    /// falls within this region.
    pub fn reference_offset_to_region_offset(&self, reference_offset: usize) -> Option<usize> {
        reference_offset
            .checked_sub(self.ref_start)
            .filter(|&o| o < self.sequence.len())
    }

    /// True only when the inclusive, 1-based region-coordinate span
    /// `[start, end]` lies *entirely* within a flank (spec.md §4.1, §4.8).
    pub fn is_flank(&self, start: usize, end: usize) -> bool {
        let core_start = self.flank_len_left + 1; // 1-based
        let core_end = self.flank_len_left + self.core_len; // 1-based inclusive
        end < core_start || start > core_end
    }

    pub fn is_ambiguous_at_region_offset(&self, region_offset: usize) -> bool {
        self.sequence
            .get(region_offset)
            .map(|&b| !crate::kmer::is_unambiguous(b))
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::InMemoryCounter;

    #[test]
    fn flank_len_defaults_to_floor_1_5k() {
        assert_eq!(default_flank_len(5), 7);
        assert_eq!(default_flank_len(4), 6);
    }

    #[test]
    fn frequency_vector_has_expected_length() {
        let counter = InMemoryCounter::new(4);
        let reference = b"AAAATGCAAAATGCAAAATGC".to_vec();
        let region = ReferenceRegion::build("r", &reference, 4, 10, 4, 0, &counter, true);
        assert_eq!(region.freq.len(), region.sequence.len() - 4 + 1);
    }

    #[test]
    fn flank_is_capped_at_reference_boundary() {
        let counter = InMemoryCounter::new(4);
        let reference = b"ACGTACGT".to_vec();
        let region = ReferenceRegion::build("r", &reference, 0, 4, 4, 10, &counter, true);
        assert_eq!(region.flank_len_left, 0);
        assert_eq!(region.ref_start, 0);
    }

    #[test]
    fn is_flank_true_only_when_fully_outside_core() {
        let counter = InMemoryCounter::new(4);
        let reference = b"AAAATGCAAAATGCAAAATGC".to_vec();
        let region = ReferenceRegion::build("r", &reference, 6, 4, 4, 4, &counter, true);
        // region covers [2,16), flank_len_left=4, core_len=4 -> core positions 5..=8 (1-based)
        assert!(region.is_flank(1, 4));
        assert!(!region.is_flank(1, 5));
        assert!(region.is_flank(9, 14));
    }
}
