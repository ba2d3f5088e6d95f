//! Read inclusion policy for the walker.
//!
//! [`ReadFilter`] excludes the records that carry no usable alignment
//! evidence: unmapped reads, vendor QC failures, duplicates, non-primary
//! (secondary or supplementary) alignments, and reads with mapping quality
//! exactly zero. Any one condition is sufficient to exclude; these are
//! expected, high-frequency policy skips, not errors.

use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;

/// The default exclusion predicate applied to every read the walker pulls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadFilter;

impl ReadFilter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Whether `record` should be excluded from processing.
    ///
    /// A record is excluded if it is unmapped, failed vendor QC, is marked
    /// duplicate, is not a primary alignment, or has mapping quality exactly
    /// zero. A *missing* mapping quality (0xFF) is not zero and does not
    /// exclude.
    #[must_use]
    pub fn is_excluded(&self, record: &RecordBuf) -> bool {
        let flags = record.flags();

        if flags.is_unmapped() {
            return true;
        }
        if flags.is_qc_fail() {
            return true;
        }
        if flags.is_duplicate() {
            return true;
        }
        if flags.is_secondary() || flags.is_supplementary() {
            return true;
        }
        if record.mapping_quality().is_some_and(|mapq| u8::from(mapq) == 0) {
            return true;
        }

        false
    }
}

/// Whether a record's edit distance (`NM` tag) is zero.
///
/// Returns `true` when the tag is absent, conservatively treating untagged
/// reads as reference-identical so callers using this as a skip condition do
/// not scan reads with no evidence of disagreement.
#[must_use]
pub fn has_zero_edit_distance(record: &RecordBuf) -> bool {
    let nm = Tag::from([b'N', b'M']);
    match record.data().get(&nm) {
        Some(Value::Int8(v)) => *v == 0,
        Some(Value::UInt8(v)) => *v == 0,
        Some(Value::Int16(v)) => *v == 0,
        Some(Value::UInt16(v)) => *v == 0,
        Some(Value::Int32(v)) => *v == 0,
        Some(Value::UInt32(v)) => *v == 0,
        Some(_) => true,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sam::builder::RecordBuilder;
    use noodles::sam::alignment::record::Flags;

    fn mapped_read(flags: Flags, mapq: u8) -> RecordBuf {
        RecordBuilder::new()
            .sequence("ACGT")
            .cigar("4M")
            .reference_sequence_id(0)
            .alignment_start(100)
            .flags(flags)
            .mapping_quality(mapq)
            .build()
    }

    #[test]
    fn test_clean_read_included() {
        let filter = ReadFilter::new();
        assert!(!filter.is_excluded(&mapped_read(Flags::empty(), 60)));
    }

    #[test]
    fn test_each_condition_alone_excludes() {
        let filter = ReadFilter::new();
        for flags in [
            Flags::UNMAPPED,
            Flags::QC_FAIL,
            Flags::DUPLICATE,
            Flags::SECONDARY,
            Flags::SUPPLEMENTARY,
        ] {
            assert!(filter.is_excluded(&mapped_read(flags, 60)), "{flags:?} alone must exclude");
        }
        assert!(filter.is_excluded(&mapped_read(Flags::empty(), 0)), "MAPQ 0 alone must exclude");
    }

    #[test]
    fn test_missing_mapq_is_not_zero() {
        let filter = ReadFilter::new();
        assert!(!filter.is_excluded(&mapped_read(Flags::empty(), 255)));
    }

    #[test]
    fn test_combined_conditions_exclude() {
        let filter = ReadFilter::new();
        let record = mapped_read(Flags::UNMAPPED | Flags::DUPLICATE, 0);
        assert!(filter.is_excluded(&record));
    }

    #[test]
    fn test_zero_edit_distance() {
        let zero = RecordBuilder::new().sequence("ACGT").tag("NM", 0i32).build();
        assert!(has_zero_edit_distance(&zero));

        let nonzero = RecordBuilder::new().sequence("ACGT").tag("NM", 3i32).build();
        assert!(!has_zero_edit_distance(&nonzero));

        // Absent tag is conservatively treated as zero.
        let untagged = RecordBuilder::new().sequence("ACGT").build();
        assert!(has_zero_edit_distance(&untagged));
    }
}
