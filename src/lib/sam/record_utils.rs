//! Clipped-inclusive coordinate math for SAM/BAM records.
//!
//! The scanner works in "clipped-inclusive" coordinates: the alignment start
//! counting soft-clipped bases as part of the read's footprint on the
//! reference. A read whose leading soft clip extends past the start of its
//! contig has a *negative* clipped-inclusive start; that is legitimate input
//! (contigs without N padding, e.g. chrM) and callers are expected to skip
//! such reads rather than fail.

use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::cigar::Cigar as CigarTrait;
use noodles::sam::alignment::record::cigar::op::Kind;

/// Number of soft-clipped bases before the first aligned base.
#[must_use]
pub fn leading_soft_clip(record: &RecordBuf) -> usize {
    record
        .cigar()
        .iter()
        .filter_map(Result::ok)
        .take_while(|op| matches!(op.kind(), Kind::SoftClip | Kind::HardClip))
        .filter(|op| op.kind() == Kind::SoftClip)
        .map(|op| op.len())
        .sum()
}

/// Number of soft-clipped bases after the last aligned base.
#[must_use]
pub fn trailing_soft_clip(record: &RecordBuf) -> usize {
    let ops: Vec<_> = record.cigar().iter().filter_map(Result::ok).collect();
    ops.iter()
        .rev()
        .take_while(|op| matches!(op.kind(), Kind::SoftClip | Kind::HardClip))
        .filter(|op| op.kind() == Kind::SoftClip)
        .map(|op| op.len())
        .sum()
}

/// Number of reference bases consumed by the alignment (M, D, N, =, X).
#[must_use]
pub fn reference_length(record: &RecordBuf) -> usize {
    record
        .cigar()
        .iter()
        .filter_map(Result::ok)
        .map(|op| match op.kind() {
            Kind::Match
            | Kind::SequenceMatch
            | Kind::SequenceMismatch
            | Kind::Deletion
            | Kind::Skip => op.len(),
            _ => 0,
        })
        .sum()
}

/// Number of reference bases spanned by the clipped-inclusive footprint:
/// reference-consuming operations plus soft clips at either end.
#[must_use]
pub fn clipped_span(record: &RecordBuf) -> usize {
    record
        .cigar()
        .iter()
        .filter_map(Result::ok)
        .map(|op| match op.kind() {
            Kind::Match
            | Kind::SequenceMatch
            | Kind::SequenceMismatch
            | Kind::Deletion
            | Kind::Skip
            | Kind::SoftClip => op.len(),
            _ => 0,
        })
        .sum()
}

/// 0-based alignment start counting leading soft-clipped bases.
///
/// May be negative for reads overhanging the start of a contig. Returns
/// `None` for records with no alignment start.
#[must_use]
pub fn clipped_start(record: &RecordBuf) -> Option<i64> {
    let start = usize::from(record.alignment_start()?) as i64 - 1;
    Some(start - leading_soft_clip(record) as i64)
}

/// 0-based exclusive end of the clipped-inclusive footprint.
///
/// `clipped_start..clipped_end` is exactly the reference span a scanner needs,
/// soft-clip flanks included.
#[must_use]
pub fn clipped_end(record: &RecordBuf) -> Option<i64> {
    Some(clipped_start(record)? + clipped_span(record) as i64)
}

/// 0-based inclusive end of the aligned (unclipped) span.
///
/// Returns `None` for records with no alignment start or no
/// reference-consuming operations.
#[must_use]
pub fn alignment_end(record: &RecordBuf) -> Option<usize> {
    let start = usize::from(record.alignment_start()?) - 1;
    let ref_len = reference_length(record);
    if ref_len == 0 { None } else { Some(start + ref_len - 1) }
}
