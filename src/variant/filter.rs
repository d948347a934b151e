//! Variant filter pipeline (C11, spec.md §4.9).

use super::caller::{VariantCall, VariantType};

/// Each filter maps a call to a (possibly rewritten) call, or drops it.
/// `None` short-circuits the remaining pipeline.
pub trait VariantFilter {
    fn filter(&self, call: VariantCall) -> Option<VariantCall>;
}

/// Run `call` through every filter in order, stopping at the first drop.
pub fn run_pipeline(filters: &[Box<dyn VariantFilter>], mut call: VariantCall) -> Option<VariantCall> {
    for f in filters {
        call = f.filter(call)?;
    }
    Some(call)
}

/// Keep only calls whose type is in `allowed`.
pub struct TypeFilter {
    pub allowed: Vec<VariantType>,
}

impl VariantFilter for TypeFilter {
    fn filter(&self, call: VariantCall) -> Option<VariantCall> {
        if self.allowed.contains(&call.var_type()) {
            Some(call)
        } else {
            None
        }
    }
}

/// Keep only calls meeting both an absolute and a fractional depth bar:
/// `variantDepth >= min_depth` and `variantDepth / locusDepth >= min_fraction`.
pub struct CoverageFilter {
    pub min_fraction: f64,
    pub min_depth: u64,
}

impl VariantFilter for CoverageFilter {
    fn filter(&self, call: VariantCall) -> Option<VariantCall> {
        if call.variant_depth < self.min_depth {
            return None;
        }
        if call.locus_depth == 0 {
            return None;
        }
        let fraction = call.variant_depth as f64 / call.locus_depth as f64;
        if fraction < self.min_fraction {
            return None;
        }
        Some(call)
    }
}

/// Drop calls whose reference-coordinate `start` falls within `min_distance`
/// bases of either end of `[sequence_start, sequence_end]`.
pub struct DistanceFromEndsFilter {
    pub sequence_start: u64,
    pub sequence_end: u64,
    pub min_distance: u64,
}

impl VariantFilter for DistanceFromEndsFilter {
    fn filter(&self, call: VariantCall) -> Option<VariantCall> {
        let start = call.start();
        if start < self.sequence_start + self.min_distance {
            return None;
        }
        if start + self.min_distance > self.sequence_end {
            return None;
        }
        Some(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::caller::VariantKey;

    fn call(var_type: VariantType, start: u64, variant_depth: u64, locus_depth: u64) -> VariantCall {
        VariantCall {
            key: VariantKey {
                ref_seq_name: "chr1".to_string(),
                start,
                var_type,
                reference: b"A".to_vec(),
                alt: b"T".to_vec(),
            },
            haplotype_depths: vec![variant_depth as u32],
            variant_depth,
            locus_depth,
            is_ambiguous: false,
        }
    }

    #[test]
    fn type_filter_drops_unlisted_types() {
        let f = TypeFilter { allowed: vec![VariantType::Snp] };
        assert!(f.filter(call(VariantType::Snp, 10, 5, 10)).is_some());
        assert!(f.filter(call(VariantType::Insertion, 10, 5, 10)).is_none());
    }

    #[test]
    fn coverage_filter_enforces_both_bars() {
        let f = CoverageFilter { min_fraction: 0.5, min_depth: 3 };
        assert!(f.filter(call(VariantType::Snp, 10, 5, 10)).is_some());
        assert!(f.filter(call(VariantType::Snp, 10, 2, 10)).is_none()); // below min_depth
        assert!(f.filter(call(VariantType::Snp, 10, 4, 100)).is_none()); // below fraction
    }

    #[test]
    fn distance_from_ends_filter_drops_near_boundary() {
        let f = DistanceFromEndsFilter {
            sequence_start: 1,
            sequence_end: 100,
            min_distance: 5,
        };
        assert!(f.filter(call(VariantType::Snp, 50, 5, 10)).is_some());
        assert!(f.filter(call(VariantType::Snp, 2, 5, 10)).is_none());
        assert!(f.filter(call(VariantType::Snp, 99, 5, 10)).is_none());
    }

    #[test]
    fn pipeline_short_circuits_on_first_drop() {
        let filters: Vec<Box<dyn VariantFilter>> = vec![
            Box::new(TypeFilter { allowed: vec![VariantType::Snp] }),
            Box::new(CoverageFilter { min_fraction: 0.9, min_depth: 1 }),
        ];
        assert!(run_pipeline(&filters, call(VariantType::Insertion, 10, 5, 10)).is_none());
    }

    #[test]
    fn pipeline_is_idempotent() {
        let filters: Vec<Box<dyn VariantFilter>> = vec![Box::new(CoverageFilter { min_fraction: 0.1, min_depth: 1 })];
        let c = call(VariantType::Snp, 10, 5, 10);
        let once = run_pipeline(&filters, c.clone()).unwrap();
        let twice = run_pipeline(&filters, once.clone()).unwrap();
        assert_eq!(once.variant_depth, twice.variant_depth);
        assert_eq!(once.start(), twice.start());
    }
}
