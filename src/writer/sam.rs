//! SAM haplotype writer (spec.md §6, "Haplotype writer"), built on
//! `rust_htslib::bam`, matching the teacher's `rust-htslib` dependency.

use rust_htslib::bam::{self, header::HeaderRecord, record::Aux, record::Cigar, record::CigarString};

use crate::align::CigarOp;
use crate::errors::CoreResult;
use crate::haplotype::Haplotype;
use crate::reference::ReferenceSequence;

fn to_htslib_cigar(event: &crate::align::AlignmentEvent) -> CigarString {
    let elements = event
        .elements
        .iter()
        .map(|e| match e.op {
            CigarOp::Match => Cigar::Equal(e.count),
            CigarOp::Mismatch => Cigar::Diff(e.count),
            CigarOp::Ins => Cigar::Ins(e.count),
            CigarOp::Del => Cigar::Del(e.count),
        })
        .collect();
    CigarString(elements)
}

/// One haplotype plus the region metadata the SAM record's custom tags
/// need (spec.md §6).
#[derive(Debug, Clone)]
pub struct HaplotypeRecord<'a> {
    pub haplotype: &'a Haplotype,
    pub region_name: String,
    pub reference_name: String,
    pub reference_start: i64,
}

/// Write a SAM 1.5 file: `@HD VN:1.5 SO:coordinate`, one `@SQ` per
/// reference, `@PG ID=<program>`, then one record per haplotype.
pub fn write_sam<P: AsRef<std::path::Path>>(
    path: P,
    program_name: &str,
    program_version: &str,
    references: &[ReferenceSequence],
    records: &[HaplotypeRecord<'_>],
) -> CoreResult<()> {
    let mut header = bam::Header::new();

    let mut hd = HeaderRecord::new(b"HD");
    hd.push_tag(b"VN", &"1.5");
    hd.push_tag(b"SO", &"coordinate");
    header.push_record(&hd);

    for r in references {
        let mut sq = HeaderRecord::new(b"SQ");
        sq.push_tag(b"SN", &r.name.as_str());
        sq.push_tag(b"LN", &(r.size as i64));
        header.push_record(&sq);
    }

    let mut pg = HeaderRecord::new(b"PG");
    pg.push_tag(b"ID", &program_name);
    pg.push_tag(b"VN", &program_version);
    header.push_record(&pg);

    let mut writer = bam::Writer::from_path(path, &header, bam::Format::Sam)
        .map_err(|e| crate::errors::CoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    for rec in records {
        let mut record = bam::Record::new();
        let cigar = to_htslib_cigar(&rec.haplotype.cigar);
        let qname = format!("{}:{}", rec.reference_name, rec.region_name);
        let quals = vec![255u8; rec.haplotype.sequence.len()];
        record.set(qname.as_bytes(), Some(&cigar), &rec.haplotype.sequence, &quals);
        record.set_pos(rec.reference_start);
        record.set_mapq(255);

        record
            .push_aux(b"XD", Aux::I32(rec.haplotype.stats.min as i32))
            .map_err(htslib_err)?;
        record
            .push_aux(b"XN", Aux::String(&rec.region_name))
            .map_err(htslib_err)?;
        record
            .push_aux(b"XL", Aux::I32(if rec.haplotype.left_end { 1 } else { 0 }))
            .map_err(htslib_err)?;
        record
            .push_aux(b"XR", Aux::I32(if rec.haplotype.right_end { 1 } else { 0 }))
            .map_err(htslib_err)?;

        writer.write(&record).map_err(htslib_err)?;
    }

    Ok(())
}

fn htslib_err(e: rust_htslib::errors::Error) -> crate::errors::CoreError {
    crate::errors::CoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
}
