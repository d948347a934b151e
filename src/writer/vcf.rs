//! VCF 4.2 variant writer (spec.md §6, first bullet).
//!
//! htslib's own VCF writer (`rust_htslib::bcf`) targets the canonical
//! `##fileformat=VCFv4.x` header and typed missing values; spec.md asks for
//! a literal `##fileformat=VCF4.2` line and a `0:.:.` textual convention for
//! samples that don't support a record, neither of which maps cleanly onto
//! htslib's typed API. This writer formats the file directly with
//! `std::io::Write`, the same manual-text-formatting style the teacher uses
//! for its tabular outputs; `rust_htslib` remains the SAM haplotype writer's
//! backend (`writer::sam`), where its record API is a direct fit.

use std::io::Write;

use crate::errors::CoreResult;
use crate::reference::ReferenceSequence;
use crate::variant::{VariantCall, VariantType};

/// One sample's variant calls for one reference, ready to write.
#[derive(Debug, Clone)]
pub struct SampleVariants {
    pub sample_name: String,
    pub calls: Vec<VariantCall>,
}

fn variant_type_symbol(t: VariantType) -> &'static str {
    match t {
        VariantType::Snp => "SNP",
        VariantType::Insertion => "INS",
        VariantType::Deletion => "DEL",
    }
}

/// VCF anchor-base convention for indels (spec.md §4.8): prepend the base
/// at `start - 1` unless `start == 1`, in which case append the base at
/// `start`. SNPs are reported as-is.
fn anchor_ref_alt(
    reference_bases: &[u8],
    call: &VariantCall,
) -> (u64, Vec<u8>, Vec<u8>) {
    match call.var_type() {
        VariantType::Snp => (call.start(), call.reference().to_vec(), call.alt().to_vec()),
        VariantType::Insertion | VariantType::Deletion => {
            let start = call.start();
            if start == 1 {
                let after = reference_bases.get(start as usize - 1).copied();
                let mut reference = call.reference().to_vec();
                let mut alt = call.alt().to_vec();
                if let Some(b) = after {
                    reference.push(b);
                    alt.push(b);
                }
                (start, reference, alt)
            } else {
                let anchor = reference_bases.get(start as usize - 2).copied().unwrap_or(b'N');
                let mut reference = vec![anchor];
                reference.extend_from_slice(call.reference());
                let mut alt = vec![anchor];
                alt.extend_from_slice(call.alt());
                (start - 1, reference, alt)
            }
        }
    }
}

/// Write a VCF 4.2 file for `samples` against `references`, one row per
/// distinct `(sequenceName, start, type, ref, alt)` across all samples,
/// sorted per spec.md §4.8.
pub fn write_vcf<W: Write>(
    mut out: W,
    program_name: &str,
    program_version: &str,
    references: &[ReferenceSequence],
    samples: &[SampleVariants],
) -> CoreResult<()> {
    writeln!(out, "##fileformat=VCF4.2")?;
    writeln!(out, "##source={program_name}{program_version}")?;
    for r in references {
        writeln!(out, "##contig=<ID={},length={},md5={}>", r.name, r.size, r.digest)?;
    }
    writeln!(out, r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#)?;
    writeln!(
        out,
        r#"##FORMAT=<ID=GDP,Number=A,Type=Integer,Description="Variant depth per alternate allele">"#
    )?;
    writeln!(out, r#"##FORMAT=<ID=DP,Number=1,Type=Integer,Description="Locus depth">"#)?;
    write!(out, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT")?;
    for s in samples {
        write!(out, "\t{}", s.sample_name)?;
    }
    writeln!(out)?;

    let mut rows: std::collections::BTreeMap<(String, u64, &'static str, Vec<u8>, Vec<u8>), Vec<Option<(u64, u64)>>> =
        std::collections::BTreeMap::new();

    for (sample_idx, sample) in samples.iter().enumerate() {
        for call in &sample.calls {
            let reference_bases = references
                .iter()
                .find(|r| r.name == call.ref_seq_name())
                .map(|r| r.bases.as_slice())
                .unwrap_or(&[]);
            let (pos, reference, alt) = anchor_ref_alt(reference_bases, call);
            let key = (
                call.ref_seq_name().to_string(),
                pos,
                variant_type_symbol(call.var_type()),
                reference,
                alt,
            );
            let row = rows
                .entry(key)
                .or_insert_with(|| vec![None; samples.len()]);
            row[sample_idx] = Some((call.variant_depth, call.locus_depth));
        }
    }

    for ((chrom, pos, _type_sym, reference, alt), sample_values) in rows {
        write!(
            out,
            "{}\t{}\t.\t{}\t{}\t.\t.\t.\tGT:GDP:DP",
            chrom,
            pos,
            String::from_utf8_lossy(&reference),
            String::from_utf8_lossy(&alt)
        )?;
        for value in sample_values {
            match value {
                Some((variant_depth, locus_depth)) => {
                    write!(out, "\t1:{variant_depth}:{locus_depth}")?;
                }
                None => write!(out, "\t0:.:.")?,
            }
        }
        writeln!(out)?;
    }

    Ok(())
}
