//! Tab-table variant writer (spec.md §6, second bullet).

use std::io::Write;

use crate::errors::CoreResult;
use crate::variant::VariantCall;

/// One row's worth of context the caller doesn't have from `VariantCall`
/// alone: which sample and active region it came from.
#[derive(Debug, Clone)]
pub struct TableRow<'a> {
    pub sample: &'a str,
    pub region: &'a str,
    pub call: &'a VariantCall,
}

/// Write `sample, reference, region, locus, ref, alt, var_depth, region_depth`
/// as TSV with one header line, using the teacher's `csv` crate.
pub fn write_table<W: Write>(out: W, rows: &[TableRow<'_>]) -> CoreResult<()> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(out);
    writer.write_record([
        "sample",
        "reference",
        "region",
        "locus",
        "ref",
        "alt",
        "var_depth",
        "region_depth",
    ])?;
    for row in rows {
        writer.write_record([
            row.sample,
            row.call.ref_seq_name(),
            row.region,
            &row.call.start().to_string(),
            &String::from_utf8_lossy(row.call.reference()),
            &String::from_utf8_lossy(row.call.alt()),
            &row.call.variant_depth.to_string(),
            &row.call.locus_depth.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

impl From<csv::Error> for crate::errors::CoreError {
    fn from(e: csv::Error) -> Self {
        crate::errors::CoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{VariantKey, VariantType};

    #[test]
    fn writes_header_and_row() {
        let call = VariantCall {
            key: VariantKey {
                ref_seq_name: "chr1".to_string(),
                start: 11,
                var_type: VariantType::Snp,
                reference: b"C".to_vec(),
                alt: b"T".to_vec(),
            },
            haplotype_depths: vec![5],
            variant_depth: 5,
            locus_depth: 100,
            is_ambiguous: false,
        };
        let rows = vec![TableRow { sample: "s1", region: "region_1", call: &call }];
        let mut buf = Vec::new();
        write_table(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "sample\treference\tregion\tlocus\tref\talt\tvar_depth\tregion_depth");
        assert_eq!(lines.next().unwrap(), "s1\tchr1\tregion_1\t11\tC\tT\t5\t100");
    }
}
