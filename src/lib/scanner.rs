//! The CIGAR-driven alignment-diff scanner.
//!
//! [`scan_read`] walks one read's CIGAR against the reference bases spanning
//! its clipped-inclusive footprint and emits an ordered sequence of
//! [`DiffEvent`]s: one per mismatching aligned column, and one per soft-clip,
//! deletion, reference-skip, or insertion run.
//!
//! Three cursors advance through the walk: `read_pos` and `ref_pos` (0-based
//! offsets from the clipped start into the read and the reference slice) and
//! `joint_pos` (alignment columns consumed, matched or not):
//!
//! ```text
//!    0    4    8
//!    ACGTACGTA--CGT  ref
//!    ACGCAC--ACCCGT  read
//!       ^  ^^ ^^
//!       3  56 78     joint positions of the diffs
//! ```
//!
//! Within one read's event sequence `ref_pos` and `joint_pos` are
//! non-decreasing, and `read_pos` is non-decreasing except that deletions and
//! skips do not advance it.
//!
//! Scanning never fails on well-formed input. A read overhanging the start of
//! its contig (negative clipped-inclusive start) yields an empty sequence,
//! and CIGAR operations outside the table (hard clips, padding) are skipped
//! with cursors unchanged and counted at debug level. `read_pos`,
//! `joint_pos`, and run lengths saturate at their packed-field maxima before
//! an event is built; `ref_pos` is carried at full width.

use log::debug;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::record::cigar::Cigar as CigarTrait;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::event::{DiffEvent, DiffKind, MAX_LEN, MAX_OFFSET};
use crate::sam::record_utils::clipped_start;

/// 2-bit base packing table, after BWA's nucleotide table.
///
/// `A/a -> 0`, `C/c -> 1`, `G/g -> 2`, `T/t -> 3`, `- -> 5`, everything else
/// (N, IUPAC ambiguity codes, stray bytes) `-> 4`. Process-wide immutable
/// data with no lifecycle.
#[rustfmt::skip]
pub const PACK_2BIT: [u8; 256] = {
    let mut table = [4u8; 256];
    table[b'A' as usize] = 0; table[b'a' as usize] = 0;
    table[b'C' as usize] = 1; table[b'c' as usize] = 1;
    table[b'G' as usize] = 2; table[b'g' as usize] = 2;
    table[b'T' as usize] = 3; table[b't' as usize] = 3;
    table[b'-' as usize] = 5;
    table
};

/// Whether two bases disagree under the packing table.
///
/// Codes at or above 4 (unknown bases and the `-` gap symbol) compare unequal
/// to everything, including themselves: N never matches N, and a gap never
/// matches a real base.
#[inline]
#[must_use]
pub fn bases_differ(reference: u8, read: u8) -> bool {
    let ref_code = PACK_2BIT[reference as usize];
    let read_code = PACK_2BIT[read as usize];
    ref_code >= 4 || read_code >= 4 || ref_code != read_code
}

#[inline]
fn clamp_offset(value: usize) -> u16 {
    value.min(MAX_OFFSET as usize) as u16
}

#[inline]
fn clamp_len(value: usize) -> u16 {
    value.min(MAX_LEN as usize) as u16
}

/// Scans one read against the reference bases spanning its clipped footprint.
///
/// `ref_bases` must cover exactly `[clipped_start, clipped_end)` of the read,
/// soft-clip flanks included. Events are returned in alignment order.
///
/// Reads overhanging the start of their contig (negative clipped-inclusive
/// start) and records with no alignment start return an empty sequence; this
/// is a deliberate silent skip, not an error.
#[must_use]
pub fn scan_read(record: &RecordBuf, ref_bases: &[u8]) -> Vec<DiffEvent> {
    let mut events = Vec::new();

    // Contigs without N padding (e.g. chrM) can have reads whose soft clip
    // overhangs the contig start; skip them.
    let start = match clipped_start(record) {
        Some(start) if start >= 0 => start as u64,
        _ => return events,
    };

    let seq = record.sequence().as_ref();

    let mut read_pos: usize = 0;
    let mut ref_pos: usize = 0;
    let mut joint_pos: usize = 0;
    let mut unrecognized: usize = 0;

    for result in record.cigar().iter() {
        let Ok(op) = result else {
            unrecognized += 1;
            continue;
        };
        let len = op.len();

        match op.kind() {
            // Consumes both reference and read; each column is compared.
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                for _ in 0..len {
                    let (Some(&ref_base), Some(&read_base)) =
                        (ref_bases.get(ref_pos), seq.get(read_pos))
                    else {
                        // CIGAR ran past the slice or the sequence; stop
                        // scanning this read rather than abort the stream.
                        debug!("CIGAR walk ran past read or reference bounds; truncating scan");
                        return events;
                    };
                    if bases_differ(ref_base, read_base) {
                        events.push(DiffEvent {
                            ref_pos: start + ref_pos as u64,
                            read_pos: clamp_offset(read_pos),
                            joint_pos: clamp_offset(joint_pos),
                            kind: DiffKind::Mismatch,
                            len: 1,
                        });
                    }
                    read_pos += 1;
                    ref_pos += 1;
                    joint_pos += 1;
                }
            }
            // Consumes both, but the bases are not assessed; one event
            // covers the whole run. Soft clips occur only at read ends.
            Kind::SoftClip => {
                events.push(DiffEvent {
                    ref_pos: start + ref_pos as u64,
                    read_pos: clamp_offset(read_pos),
                    joint_pos: clamp_offset(joint_pos),
                    kind: DiffKind::SoftClip,
                    len: clamp_len(len),
                });
                read_pos += len;
                ref_pos += len;
                joint_pos += len;
            }
            // Consumes reference only; deletion and skip stay distinct.
            Kind::Deletion | Kind::Skip => {
                let kind = if op.kind() == Kind::Deletion {
                    DiffKind::Deletion
                } else {
                    DiffKind::Skip
                };
                events.push(DiffEvent {
                    ref_pos: start + ref_pos as u64,
                    read_pos: clamp_offset(read_pos),
                    joint_pos: clamp_offset(joint_pos),
                    kind,
                    len: clamp_len(len),
                });
                ref_pos += len;
                joint_pos += len;
            }
            // Consumes read only.
            Kind::Insertion => {
                events.push(DiffEvent {
                    ref_pos: start + ref_pos as u64,
                    read_pos: clamp_offset(read_pos),
                    joint_pos: clamp_offset(joint_pos),
                    kind: DiffKind::Insertion,
                    len: clamp_len(len),
                });
                read_pos += len;
                joint_pos += len;
            }
            // Outside the table: no cursor movement, no event.
            Kind::HardClip | Kind::Pad => {
                unrecognized += 1;
            }
        }
    }

    if unrecognized > 0 {
        debug!("skipped {unrecognized} CIGAR operations outside the diff table");
    }

    events
}
