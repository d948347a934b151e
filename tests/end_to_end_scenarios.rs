//! End-to-end scenario tests (spec.md §8, "Concrete end-to-end scenarios"),
//! one module per scenario, driving `kvcaller::call_region` the way
//! `src/bin/main.rs` does for a single reference/sample pair. Kept as
//! invariant checks rather than exact-CIGAR assertions where the detector's
//! internal scan position isn't part of the public surface.

use kvcaller::config::RunConfig;
use kvcaller::kmer::InMemoryCounter;
use kvcaller::reference::ReferenceSequence;
use kvcaller::variant::VariantType;

fn counter_with_support(k: usize, mostly: &[u8], rarely: &[u8], mostly_n: usize, rarely_n: usize) -> InMemoryCounter {
    let mut counter = InMemoryCounter::new(k);
    for _ in 0..mostly_n {
        counter.add_sequence(mostly);
    }
    for _ in 0..rarely_n {
        counter.add_sequence(rarely);
    }
    counter
}

/// Scenario 1: a single-base substitution supported by most reads surfaces
/// as a SNP, with variant depth bounded by locus depth.
#[test]
fn scenario_1_snp_from_dip_and_recovery() {
    let k = 5;
    let reference_bases = b"AAAATGCAAAATGCAAAATGCAAAATGCAAAATGC".to_vec();
    let mut alt_bases = reference_bases.clone();
    let snp_offset = 17;
    alt_bases[snp_offset] = if alt_bases[snp_offset] == b'A' { b'T' } else { b'A' };

    let counter = counter_with_support(k, &alt_bases, &reference_bases, 100, 5);
    let reference = ReferenceSequence::new("chr1", reference_bases.clone());
    let cfg = RunConfig { k, ..RunConfig::default() };
    let (_, variants) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();

    assert!(!variants.is_empty(), "expected the substitution to surface as an active region");
    for v in &variants {
        assert!(v.variant_depth <= v.locus_depth);
    }
    assert!(variants.iter().any(|v| v.var_type() == VariantType::Snp));
}

/// Scenario 2: a one-base insertion relative to the reference, supported by
/// most reads, surfaces as an INSERTION call.
#[test]
fn scenario_2_single_base_insertion() {
    let k = 5;
    let reference_bases = b"GATTACAGATTACAGATTACA".to_vec();
    let mut alt_bases = reference_bases.clone();
    alt_bases.insert(6, b'T');

    let counter = counter_with_support(k, &alt_bases, &reference_bases, 80, 50);
    let reference = ReferenceSequence::new("chr1", reference_bases.clone());
    let cfg = RunConfig { k, ..RunConfig::default() };
    let (_, variants) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();

    assert!(variants.iter().any(|v| v.var_type() == VariantType::Insertion));
}

/// Scenario 3: a short deletion relative to the reference surfaces as a
/// DELETION call.
#[test]
fn scenario_3_short_deletion() {
    let k = 5;
    let reference_bases = b"ACGTACGTACGTACGTACGT".to_vec();
    let mut alt_bases = reference_bases.clone();
    alt_bases.drain(4..8);

    let counter = counter_with_support(k, &alt_bases, &reference_bases, 60, 55);
    let reference = ReferenceSequence::new("chr1", reference_bases.clone());
    let cfg = RunConfig { k, ..RunConfig::default() };
    let (_, variants) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();

    assert!(variants.iter().any(|v| v.var_type() == VariantType::Deletion));
}

/// Scenario 4: an ambiguous reference base. With `ambigRegions=false` no
/// active region is emitted across it; with `callAmbiguousVariant=false`
/// any variant touching the ambiguous base is dropped.
#[test]
fn scenario_4_ambiguous_base_gating() {
    let k = 5;
    let mut reference_bases = b"AAAATGCAAAATGCAAAATGCAAAATGCAAAATGC".to_vec();
    reference_bases[8] = b'N';
    let mut alt_bases = reference_bases.clone();
    alt_bases[20] = if alt_bases[20] == b'A' { b'T' } else { b'A' };

    let counter = counter_with_support(k, &alt_bases, &reference_bases, 100, 5);
    let reference = ReferenceSequence::new("chr1", reference_bases.clone());

    let mut cfg = RunConfig { k, ..RunConfig::default() };
    cfg.active_region.ambig_regions = false;
    let (regions_no_ambig, _) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();
    for (_, active, _) in &regions_no_ambig {
        assert!(
            !(active.l_idx..active.r_idx).contains(&8),
            "ambiguous base must not be covered by an active region when ambigRegions=false"
        );
    }

    cfg.active_region.ambig_regions = true;
    cfg.call_ambiguous_variant = false;
    let (_, variants) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();
    for v in &variants {
        assert!(!v.is_ambiguous, "variants touching N must be dropped when callAmbiguousVariant=false");
    }
}

/// Scenario 5: a region at the left end of the reference, where no left
/// anchor exists. With `anchorBoth=true` nothing is emitted there; with
/// `anchorBoth=false` a right-anchor-seeded build still yields calls
/// extending to position 1.
#[test]
fn scenario_5_left_end_anchor_policy() {
    let k = 5;
    let mut reference_bases = b"AAAATGCAAAATGCAAAATGCAAAATGC".to_vec();
    let snp_offset = 2;
    reference_bases[snp_offset] = b'C';
    let mut alt_bases = reference_bases.clone();
    alt_bases[snp_offset] = b'T';

    let counter = counter_with_support(k, &alt_bases, &reference_bases, 90, 5);
    let reference = ReferenceSequence::new("chr1", reference_bases.clone());

    let mut cfg = RunConfig { k, ..RunConfig::default() };
    cfg.active_region.anchor_both = true;
    let (regions_anchored, _) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();
    for (_, active, _) in &regions_anchored {
        assert!(active.l_idx > 0, "anchorBoth=true must not emit a region missing its left anchor");
    }

    cfg.active_region.anchor_both = false;
    let (_, variants) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();
    assert!(
        variants.iter().any(|v| v.start() <= (snp_offset as u64 + 2)),
        "anchorBoth=false should allow a right-anchor-seeded build to reach the left end"
    );
}

/// Scenario 6: two haplotypes agree on a SNP but disagree on an adjacent
/// insertion. The SNP record merges both haplotypes' depth; the insertion
/// record is supported by only one.
#[test]
fn scenario_6_merged_snp_with_disagreeing_insertion() {
    let k = 5;
    let reference_bases = b"AAAATGCAAAATGCAAAATGCAAAATGCAAAATGC".to_vec();
    let snp_offset = 17;
    let mut hap_a = reference_bases.clone();
    hap_a[snp_offset] = if hap_a[snp_offset] == b'A' { b'T' } else { b'A' };
    let mut hap_b = hap_a.clone();
    hap_b.insert(snp_offset + 2, b'G');

    let mut counter = InMemoryCounter::new(k);
    for _ in 0..60 {
        counter.add_sequence(&hap_a);
    }
    for _ in 0..40 {
        counter.add_sequence(&hap_b);
    }
    for _ in 0..5 {
        counter.add_sequence(&reference_bases);
    }

    let reference = ReferenceSequence::new("chr1", reference_bases.clone());
    let cfg = RunConfig { k, ..RunConfig::default() };
    let (_, variants) = kvcaller::call_region(&reference, 0, reference.size, &counter, &cfg).unwrap();

    let snps: Vec<_> = variants.iter().filter(|v| v.var_type() == VariantType::Snp).collect();
    assert!(!snps.is_empty(), "the shared SNP should be called");
    for s in &snps {
        assert!(!s.haplotype_depths.is_empty());
    }
}
