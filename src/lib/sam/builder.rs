//! Test utilities for building SAM records and reference fixtures.
//!
//! These helpers keep unit and integration tests terse: a builder for
//! `RecordBuf` with sensible mapped-read defaults, a CIGAR string parser, and
//! an on-disk FASTA fixture writer.

use anyhow::Result;
use bstr::BString;
use noodles::core::Position;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::cigar::op::{Kind, Op};
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{Cigar, QualityScores, Sequence};
use std::io::Write;
use tempfile::NamedTempFile;

/// Parses a CIGAR string (e.g. `"3S4M2D3M"`) into a buffered CIGAR.
///
/// # Panics
/// Panics on malformed input; this is a test helper.
#[must_use]
pub fn parse_cigar(cigar: &str) -> Cigar {
    let mut ops = Vec::new();
    let mut len: usize = 0;

    for c in cigar.chars() {
        if let Some(digit) = c.to_digit(10) {
            len = len * 10 + digit as usize;
            continue;
        }
        let kind = match c {
            'M' => Kind::Match,
            'I' => Kind::Insertion,
            'D' => Kind::Deletion,
            'N' => Kind::Skip,
            'S' => Kind::SoftClip,
            'H' => Kind::HardClip,
            'P' => Kind::Pad,
            '=' => Kind::SequenceMatch,
            'X' => Kind::SequenceMismatch,
            _ => panic!("invalid CIGAR operation: {c}"),
        };
        assert!(len > 0, "CIGAR operation {c} has no length");
        ops.push(Op::new(kind, len));
        len = 0;
    }
    assert_eq!(len, 0, "trailing length with no CIGAR operation");

    Cigar::from(ops)
}

/// Builder for `RecordBuf` test records.
///
/// Defaults describe a plain mapped primary read: empty flags, MAPQ 60, no
/// coordinates until `reference_sequence_id`/`alignment_start` are set.
///
/// # Example
///
/// ```
/// use nonref_lib::sam::builder::RecordBuilder;
///
/// let record = RecordBuilder::new()
///     .name("read1")
///     .sequence("ACGAA")
///     .cigar("5M")
///     .reference_sequence_id(0)
///     .alignment_start(101)
///     .build();
/// assert_eq!(record.sequence().as_ref(), b"ACGAA");
/// ```
pub struct RecordBuilder {
    name: String,
    sequence: Vec<u8>,
    qualities: Option<Vec<u8>>,
    cigar: Option<Cigar>,
    flags: Flags,
    mapping_quality: Option<u8>,
    reference_sequence_id: Option<usize>,
    alignment_start: Option<usize>,
    tags: Vec<(Tag, Value)>,
}

impl RecordBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: "read".to_string(),
            sequence: Vec::new(),
            qualities: None,
            cigar: None,
            flags: Flags::empty(),
            mapping_quality: Some(60),
            reference_sequence_id: None,
            alignment_start: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn sequence(mut self, sequence: &str) -> Self {
        self.sequence = sequence.as_bytes().to_vec();
        self
    }

    #[must_use]
    pub fn qualities(mut self, qualities: &[u8]) -> Self {
        self.qualities = Some(qualities.to_vec());
        self
    }

    /// Sets the CIGAR from a string such as `"3S4M2D3M"`.
    #[must_use]
    pub fn cigar(mut self, cigar: &str) -> Self {
        self.cigar = Some(parse_cigar(cigar));
        self
    }

    #[must_use]
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the mapping quality; 255 means missing.
    #[must_use]
    pub fn mapping_quality(mut self, mapq: u8) -> Self {
        self.mapping_quality = Some(mapq);
        self
    }

    #[must_use]
    pub fn reference_sequence_id(mut self, id: usize) -> Self {
        self.reference_sequence_id = Some(id);
        self
    }

    /// Sets the 1-based alignment start.
    #[must_use]
    pub fn alignment_start(mut self, start: usize) -> Self {
        self.alignment_start = Some(start);
        self
    }

    /// Attaches a data field, e.g. `.tag("NM", 2i32)`.
    #[must_use]
    pub fn tag(mut self, tag: &str, value: impl Into<Value>) -> Self {
        let bytes = tag.as_bytes();
        assert_eq!(bytes.len(), 2, "tags are two characters");
        self.tags.push((Tag::from([bytes[0], bytes[1]]), value.into()));
        self
    }

    /// Builds the record.
    ///
    /// # Panics
    /// Panics if the alignment start is zero; this is a test helper.
    #[must_use]
    pub fn build(self) -> RecordBuf {
        let mut builder = RecordBuf::builder()
            .set_name(BString::from(self.name.as_str()))
            .set_flags(self.flags);

        if !self.sequence.is_empty() {
            builder = builder.set_sequence(Sequence::from(self.sequence.clone()));
        }
        let qualities = self.qualities.unwrap_or_else(|| vec![30; self.sequence.len()]);
        if !qualities.is_empty() {
            builder = builder.set_quality_scores(QualityScores::from(qualities));
        }
        if let Some(cigar) = self.cigar {
            builder = builder.set_cigar(cigar);
        }
        if let Some(id) = self.reference_sequence_id {
            builder = builder.set_reference_sequence_id(id);
        }
        if let Some(start) = self.alignment_start {
            let position = Position::try_from(start).expect("alignment start must be >= 1");
            builder = builder.set_alignment_start(position);
        }
        if let Some(mapq) = self.mapping_quality {
            if let Some(mapq) = MappingQuality::new(mapq) {
                builder = builder.set_mapping_quality(mapq);
            }
        }

        let mut record = builder.build();
        for (tag, value) in self.tags {
            record.data_mut().insert(tag, value);
        }
        record
    }
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a FASTA file with the given (name, sequence) pairs to a temp file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn create_test_fasta(sequences: &[(&str, &str)]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    for (name, sequence) in sequences {
        writeln!(file, ">{name}")?;
        writeln!(file, "{sequence}")?;
    }
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam::alignment::record::cigar::Cigar as CigarTrait;

    #[test]
    fn test_parse_cigar() {
        let cigar = parse_cigar("3S4M2D3M");
        let ops: Vec<_> = cigar.iter().filter_map(Result::ok).collect();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0], Op::new(Kind::SoftClip, 3));
        assert_eq!(ops[1], Op::new(Kind::Match, 4));
        assert_eq!(ops[2], Op::new(Kind::Deletion, 2));
        assert_eq!(ops[3], Op::new(Kind::Match, 3));
    }

    #[test]
    fn test_parse_cigar_multi_digit() {
        let cigar = parse_cigar("150M");
        let ops: Vec<_> = cigar.iter().filter_map(Result::ok).collect();
        assert_eq!(ops, vec![Op::new(Kind::Match, 150)]);
    }

    #[test]
    #[should_panic(expected = "invalid CIGAR operation")]
    fn test_parse_cigar_rejects_garbage() {
        let _cigar = parse_cigar("4Q");
    }

    #[test]
    fn test_builder_defaults() {
        let record = RecordBuilder::new().sequence("ACGT").build();
        assert_eq!(record.sequence().as_ref(), b"ACGT");
        assert_eq!(record.quality_scores().as_ref(), &[30, 30, 30, 30]);
        assert!(record.flags().is_empty());
        assert_eq!(record.mapping_quality().map(u8::from), Some(60));
        assert!(record.alignment_start().is_none());
    }

    #[test]
    fn test_builder_coordinates_and_tags() {
        let record = RecordBuilder::new()
            .name("r1")
            .sequence("ACGT")
            .cigar("4M")
            .reference_sequence_id(1)
            .alignment_start(101)
            .tag("NM", 2i32)
            .build();
        assert_eq!(record.reference_sequence_id(), Some(1));
        assert_eq!(record.alignment_start().map(usize::from), Some(101));
        let nm = Tag::from([b'N', b'M']);
        assert_eq!(record.data().get(&nm), Some(&Value::from(2i32)));
    }

    #[test]
    fn test_builder_missing_mapq() {
        let record = RecordBuilder::new().sequence("ACGT").mapping_quality(255).build();
        assert!(record.mapping_quality().is_none());
    }

    #[test]
    fn test_create_test_fasta() -> Result<()> {
        let file = create_test_fasta(&[("chr1", "ACGTACGT"), ("chr2", "GGGG")])?;
        let contents = std::fs::read_to_string(file.path())?;
        assert_eq!(contents, ">chr1\nACGTACGT\n>chr2\nGGGG\n");
        Ok(())
    }
}
