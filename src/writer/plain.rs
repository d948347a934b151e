//! Plain-text variant writer (spec.md §6, third bullet): one HGVS-style
//! record per line, grouped by sample and by region.

use std::io::Write;

use crate::errors::CoreResult;
use crate::variant::{VariantCall, VariantType};

#[derive(Debug, Clone)]
pub struct PlainGroup<'a> {
    pub sample: &'a str,
    pub region: &'a str,
    pub calls: &'a [VariantCall],
}

/// Render one call as a minimal genomic HGVS expression, e.g.
/// `chr1:g.11C>T`, `chr1:g.5_6insG`, `chr1:g.5_8del`.
fn hgvs(call: &VariantCall) -> String {
    let chrom = call.ref_seq_name();
    let start = call.start();
    match call.var_type() {
        VariantType::Snp => format!(
            "{chrom}:g.{start}{}>{}",
            String::from_utf8_lossy(call.reference()),
            String::from_utf8_lossy(call.alt())
        ),
        VariantType::Insertion => {
            format!("{chrom}:g.{start}_{}ins{}", start + 1, String::from_utf8_lossy(call.alt()))
        }
        VariantType::Deletion => {
            let end = start + call.reference().len() as u64 - 1;
            if end == start {
                format!("{chrom}:g.{start}del")
            } else {
                format!("{chrom}:g.{start}_{end}del")
            }
        }
    }
}

pub fn write_plain<W: Write>(mut out: W, groups: &[PlainGroup<'_>]) -> CoreResult<()> {
    for group in groups {
        writeln!(out, "# sample={} region={}", group.sample, group.region)?;
        for call in group.calls {
            writeln!(
                out,
                "{}  ({}/{})",
                hgvs(call),
                call.variant_depth,
                call.locus_depth
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantKey;

    fn call(var_type: VariantType, start: u64, reference: &[u8], alt: &[u8]) -> VariantCall {
        VariantCall {
            key: VariantKey {
                ref_seq_name: "chr1".to_string(),
                start,
                var_type,
                reference: reference.to_vec(),
                alt: alt.to_vec(),
            },
            haplotype_depths: vec![5],
            variant_depth: 5,
            locus_depth: 100,
            is_ambiguous: false,
        }
    }

    #[test]
    fn formats_snp_as_hgvs_substitution() {
        let c = call(VariantType::Snp, 11, b"C", b"T");
        assert_eq!(hgvs(&c), "chr1:g.11C>T");
    }

    #[test]
    fn formats_single_base_deletion_without_range() {
        let c = call(VariantType::Deletion, 5, b"A", b"");
        assert_eq!(hgvs(&c), "chr1:g.5del");
    }

    #[test]
    fn groups_are_separated_by_a_header_line() {
        let calls = vec![call(VariantType::Snp, 11, b"C", b"T")];
        let groups = vec![PlainGroup { sample: "s1", region: "region_1", calls: &calls }];
        let mut buf = Vec::new();
        write_plain(&mut buf, &groups).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("# sample=s1 region=region_1\n"));
        assert!(text.contains("chr1:g.11C>T  (5/100)"));
    }
}
