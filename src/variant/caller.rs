//! Variant extraction from aligned haplotypes (C10, spec.md §4.8).

use hashlink::LinkedHashMap;

use crate::active_region::ActiveRegion;
use crate::align::CigarOp;
use crate::haplotype::Haplotype;
use crate::reference::ReferenceRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantType {
    Snp,
    Insertion,
    Deletion,
}

/// `(refSeqName, start, type, ref, alt)`, the dedup/merge key (spec.md
/// §4.8).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub ref_seq_name: String,
    pub start: u64,
    pub var_type: VariantType,
    pub reference: Vec<u8>,
    pub alt: Vec<u8>,
}

/// One called variant. The haplotype "bag" is kept as each contributing
/// haplotype's minimum walk depth rather than a handle to the haplotype
/// itself (downstream consumers, filters and writers, only ever need the
/// depth contributions, and haplotypes do not outlive one region's call).
#[derive(Debug, Clone, PartialEq)]
pub struct VariantCall {
    pub key: VariantKey,
    pub haplotype_depths: Vec<u32>,
    pub variant_depth: u64,
    pub locus_depth: u64,
    pub is_ambiguous: bool,
}

impl VariantCall {
    pub fn ref_seq_name(&self) -> &str {
        &self.key.ref_seq_name
    }
    pub fn start(&self) -> u64 {
        self.key.start
    }
    pub fn var_type(&self) -> VariantType {
        self.key.var_type
    }
    pub fn reference(&self) -> &[u8] {
        &self.key.reference
    }
    pub fn alt(&self) -> &[u8] {
        &self.key.alt
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VariantCallerConfig {
    /// Report `start` as an absolute reference coordinate (true) or
    /// relative to the active region's own sequence (false).
    pub by_reference: bool,
    /// Drop variants touching an ambiguous reference base.
    pub call_ambiguous_variant: bool,
}

impl Default for VariantCallerConfig {
    fn default() -> VariantCallerConfig {
        VariantCallerConfig {
            by_reference: true,
            call_ambiguous_variant: true,
        }
    }
}

/// Decompose every haplotype's CIGAR into variant calls, merging calls that
/// share a key and stamping each with the region's aggregate locus depth.
pub fn call_variants(
    reference_name: &str,
    region: &ReferenceRegion,
    active: &ActiveRegion,
    haplotypes: &[Haplotype],
    cfg: &VariantCallerConfig,
) -> LinkedHashMap<VariantKey, VariantCall> {
    let mut out: LinkedHashMap<VariantKey, VariantCall> = LinkedHashMap::new();
    let wild_type_depth = region.freq.get(active.l_idx).copied().unwrap_or(0) as u64;

    for hap in haplotypes {
        let mut ref_idx = active.l_idx;
        let mut con_idx = 0usize;
        for elem in &hap.cigar.elements {
            match elem.op {
                CigarOp::Match => {
                    ref_idx += elem.count as usize;
                    con_idx += elem.count as usize;
                }
                CigarOp::Mismatch => {
                    for i in 0..elem.count as usize {
                        emit_snp(reference_name, region, hap, ref_idx + i, con_idx + i, cfg, &mut out);
                    }
                    ref_idx += elem.count as usize;
                    con_idx += elem.count as usize;
                }
                CigarOp::Ins => {
                    let n = elem.count as usize;
                    emit_indel(
                        reference_name,
                        region,
                        hap,
                        VariantType::Insertion,
                        ref_idx,
                        0,
                        con_idx,
                        n,
                        cfg,
                        &mut out,
                    );
                    con_idx += n;
                }
                CigarOp::Del => {
                    let n = elem.count as usize;
                    emit_indel(
                        reference_name,
                        region,
                        hap,
                        VariantType::Deletion,
                        ref_idx,
                        n,
                        con_idx,
                        0,
                        cfg,
                        &mut out,
                    );
                    ref_idx += n;
                }
            }
        }
    }

    let locus_depth = haplotypes.iter().map(|h| h.stats.min as u64).sum::<u64>() + wild_type_depth;
    for call in out.values_mut() {
        call.locus_depth = locus_depth;
    }

    out
}

fn start_coordinate(region: &ReferenceRegion, region_offset: usize, by_reference: bool) -> u64 {
    let offset = if by_reference {
        region.region_offset_to_reference_offset(region_offset)
    } else {
        region_offset
    };
    (offset + 1) as u64
}

fn emit_snp(
    reference_name: &str,
    region: &ReferenceRegion,
    hap: &Haplotype,
    ref_idx: usize,
    con_idx: usize,
    cfg: &VariantCallerConfig,
    out: &mut LinkedHashMap<VariantKey, VariantCall>,
) {
    if region.is_flank(ref_idx + 1, ref_idx + 1) {
        return;
    }
    let is_ambiguous = region.is_ambiguous_at_region_offset(ref_idx);
    if is_ambiguous && !cfg.call_ambiguous_variant {
        return;
    }
    let reference = region.sequence.get(ref_idx..ref_idx + 1).unwrap_or(&[]).to_vec();
    let alt = hap.sequence.get(con_idx..con_idx + 1).unwrap_or(&[]).to_vec();
    let key = VariantKey {
        ref_seq_name: reference_name.to_string(),
        start: start_coordinate(region, ref_idx, cfg.by_reference),
        var_type: VariantType::Snp,
        reference,
        alt,
    };
    merge(out, key, hap.stats.min, is_ambiguous);
}

#[allow(clippy::too_many_arguments)]
fn emit_indel(
    reference_name: &str,
    region: &ReferenceRegion,
    hap: &Haplotype,
    var_type: VariantType,
    ref_idx: usize,
    ref_len: usize,
    con_idx: usize,
    con_len: usize,
    cfg: &VariantCallerConfig,
    out: &mut LinkedHashMap<VariantKey, VariantCall>,
) {
    let span_end = ref_idx + ref_len.max(1);
    if region.is_flank(ref_idx + 1, span_end) {
        return;
    }
    let ambiguous_span = ref_idx..(ref_idx + ref_len.max(1)).min(region.sequence.len());
    let is_ambiguous = ambiguous_span.clone().any(|o| region.is_ambiguous_at_region_offset(o));
    if is_ambiguous && !cfg.call_ambiguous_variant {
        return;
    }
    let reference = region
        .sequence
        .get(ref_idx..ref_idx + ref_len)
        .unwrap_or(&[])
        .to_vec();
    let alt = hap.sequence.get(con_idx..con_idx + con_len).unwrap_or(&[]).to_vec();
    let key = VariantKey {
        ref_seq_name: reference_name.to_string(),
        start: start_coordinate(region, ref_idx, cfg.by_reference),
        var_type,
        reference,
        alt,
    };
    merge(out, key, hap.stats.min, is_ambiguous);
}

fn merge(out: &mut LinkedHashMap<VariantKey, VariantCall>, key: VariantKey, depth: u32, is_ambiguous: bool) {
    match out.get_mut(&key) {
        Some(existing) => {
            existing.haplotype_depths.push(depth);
            existing.variant_depth += depth as u64;
            existing.is_ambiguous = existing.is_ambiguous || is_ambiguous;
        }
        None => {
            out.insert(
                key.clone(),
                VariantCall {
                    key,
                    haplotype_depths: vec![depth],
                    variant_depth: depth as u64,
                    locus_depth: 0,
                    is_ambiguous,
                },
            );
        }
    }
}
