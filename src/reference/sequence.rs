//! A single named reference sequence (spec.md §3, "Reference sequence").

use crate::errors::{CoreError, CoreResult};

/// A reference sequence: a stable name, its bases, byte length and a
/// content digest used as the VCF `##contig` identifier (spec.md §6).
#[derive(Debug, Clone)]
pub struct ReferenceSequence {
    pub name: String,
    pub bases: Vec<u8>,
    pub size: usize,
    pub digest: String,
}

impl ReferenceSequence {
    pub fn new(name: impl Into<String>, bases: Vec<u8>) -> ReferenceSequence {
        let name = name.into().trim().to_string();
        let digest = format!("{:x}", md5::compute(&bases));
        let size = bases.len();
        ReferenceSequence {
            name,
            bases,
            size,
            digest,
        }
    }

    pub fn is_ambiguous_at(&self, offset: usize) -> bool {
        self.bases
            .get(offset)
            .map(|&b| !crate::kmer::is_unambiguous(b))
            .unwrap_or(true)
    }
}

/// Load one or more named sequences from a FASTA file, trimming whitespace
/// from names and rejecting duplicates (spec.md §3 uniqueness is "enforced
/// by the caller": this is that caller).
pub fn load_fasta(path: &std::path::Path) -> CoreResult<Vec<ReferenceSequence>> {
    let mut reader = needletail::parse_fastx_file(path).map_err(|e| {
        if !path.exists() {
            CoreError::FileNotFound(path.display().to_string())
        } else {
            CoreError::DataFormat(format!("failed to open reference {}: {e}", path.display()))
        }
    })?;

    let mut sequences = Vec::new();
    let mut seen_names = std::collections::HashSet::new();
    while let Some(record) = reader.next() {
        let record = record
            .map_err(|e| CoreError::DataFormat(format!("malformed FASTA record: {e}")))?;
        let name = String::from_utf8_lossy(record.id()).trim().to_string();
        if !seen_names.insert(name.clone()) {
            return Err(CoreError::DataFormat(format!(
                "duplicate reference sequence name: {name}"
            )));
        }
        let bases = record.seq().to_vec();
        sequences.push(ReferenceSequence::new(name, bases));
    }
    Ok(sequences)
}
