//! The reference oracle: in-memory FASTA sequences with 0-based span fetch.
//!
//! All contigs are loaded at construction so that the per-read slice fetch in
//! the walk loop is an O(1) map lookup plus a borrow. Failing to open or
//! parse the FASTA is fatal; the run should not start without a reference.
//!
//! Spans are half-open 0-based `[start, end)` in clipped-inclusive
//! coordinates, so a fetch for a read includes the flanks covering its soft
//! clips.

use crate::errors::{NonrefError, Result};
use anyhow::Context;
use log::debug;
use noodles::fasta;
use std::collections::HashMap;
use std::path::Path;

/// A reference genome with all sequences preloaded into memory.
pub struct ReferenceReader {
    /// Contig sequences keyed by name, raw bytes with case preserved.
    sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceReader {
    /// Loads every contig of a FASTA file into memory.
    ///
    /// # Errors
    /// Returns an error if the file does not exist or cannot be parsed as
    /// FASTA. Callers treat this as fatal.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(NonrefError::InvalidFileFormat {
                file_type: "Reference FASTA".to_string(),
                path: path.display().to_string(),
                reason: "File does not exist".to_string(),
            }
            .into());
        }

        debug!("Reading reference FASTA into memory: {}", path.display());

        let mut reader = fasta::io::reader::Builder
            .build_from_path(path)
            .with_context(|| format!("Failed to open reference FASTA: {}", path.display()))?;

        let mut sequences = HashMap::new();
        for result in reader.records() {
            let record = result
                .with_context(|| format!("Failed to parse reference FASTA: {}", path.display()))?;
            let name = std::str::from_utf8(record.name())?.to_string();
            sequences.insert(name, record.sequence().as_ref().to_vec());
        }

        debug!("Loaded {} contigs into memory", sequences.len());
        Ok(Self { sequences })
    }

    /// Fetches the bases covering exactly `[start, end)` of a contig,
    /// 0-based.
    ///
    /// # Errors
    /// Returns an error if the contig is unknown or the span does not fit
    /// inside it.
    pub fn fetch_span(&self, name: &str, start: u64, end: u64) -> Result<&[u8]> {
        let sequence = self
            .sequences
            .get(name)
            .ok_or_else(|| NonrefError::ReferenceNotFound { ref_name: name.to_string() })?;

        let len = sequence.len() as u64;
        if start > end || end > len {
            return Err(NonrefError::SpanOutOfBounds {
                ref_name: name.to_string(),
                start,
                end,
                len,
            });
        }

        Ok(&sequence[start as usize..end as usize])
    }

    /// Length of a contig, if present.
    #[must_use]
    pub fn sequence_length(&self, name: &str) -> Option<u64> {
        self.sequences.get(name).map(|seq| seq.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sam::builder::create_test_fasta;

    #[test]
    fn test_fetch_span() -> anyhow::Result<()> {
        let fasta = create_test_fasta(&[("chr1", "ACGTACGT"), ("chr2", "GGGGCCCC")])?;
        let reader = ReferenceReader::new(fasta.path())?;

        assert_eq!(reader.fetch_span("chr1", 0, 4)?, b"ACGT");
        assert_eq!(reader.fetch_span("chr1", 3, 8)?, b"TACGT");
        assert_eq!(reader.fetch_span("chr2", 4, 8)?, b"CCCC");
        // Empty span at the very end is legal.
        assert_eq!(reader.fetch_span("chr1", 8, 8)?, b"");
        Ok(())
    }

    #[test]
    fn test_case_preserved() -> anyhow::Result<()> {
        let fasta = create_test_fasta(&[("chr1", "AcGtNn")])?;
        let reader = ReferenceReader::new(fasta.path())?;
        assert_eq!(reader.fetch_span("chr1", 0, 6)?, b"AcGtNn");
        Ok(())
    }

    #[test]
    fn test_unknown_contig() -> anyhow::Result<()> {
        let fasta = create_test_fasta(&[("chr1", "ACGT")])?;
        let reader = ReferenceReader::new(fasta.path())?;
        let err = reader.fetch_span("chr99", 0, 1).unwrap_err();
        assert!(err.to_string().contains("chr99"));
        Ok(())
    }

    #[test]
    fn test_span_out_of_bounds() -> anyhow::Result<()> {
        let fasta = create_test_fasta(&[("chr1", "ACGT")])?;
        let reader = ReferenceReader::new(fasta.path())?;
        assert!(reader.fetch_span("chr1", 0, 5).is_err());
        assert!(reader.fetch_span("chr1", 3, 2).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = ReferenceReader::new("/nonexistent/ref.fa");
        let msg = result.err().expect("should fail").to_string();
        assert!(msg.contains("Reference FASTA"));
    }

    #[test]
    fn test_sequence_length() -> anyhow::Result<()> {
        let fasta = create_test_fasta(&[("chr1", "ACGTACGT")])?;
        let reader = ReferenceReader::new(fasta.path())?;
        assert_eq!(reader.sequence_length("chr1"), Some(8));
        assert_eq!(reader.sequence_length("chr2"), None);
        Ok(())
    }
}
