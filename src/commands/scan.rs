//! Scan aligned reads for non-reference positions.
//!
//! Walks a coordinate-sorted BAM against a reference FASTA and emits one TSV
//! line per diff event: mismatches per differing aligned column, and one line
//! per soft-clip, insertion, deletion, or reference-skip run.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use noodles::sam::alignment::RecordBuf;
use std::io::Write;
use std::path::PathBuf;

use nonref_lib::event::encode;
use nonref_lib::filter::has_zero_edit_distance;
use nonref_lib::logging::{OperationTimer, format_count};
use nonref_lib::output::OutputSink;
use nonref_lib::poscache::PositionCache;
use nonref_lib::reference::ReferenceReader;
use nonref_lib::sam::record_utils::{clipped_end, clipped_start};
use nonref_lib::scanner::scan_read;
use nonref_lib::validation::validate_file_exists;
use nonref_lib::walker::{BamSource, GenomicRegion, ReadWalker, WalkSummary};

use crate::commands::command::Command;

/// Scan aligned reads and emit positions disagreeing with the reference.
#[derive(Debug, Parser)]
#[command(
    name = "scan",
    about = "Scan aligned reads and emit non-reference positions",
    long_about = r"
Walks a coordinate-sorted BAM against a reference FASTA and emits one line per
position where a read disagrees with, or structurally diverges from, the
reference: single-base mismatches, insertions, deletions, reference skips, and
soft-clip boundaries.

Reads that are unmapped, vendor QC failures, duplicates, non-primary, or have
mapping quality zero are skipped. Reads whose soft clips overhang the start of
their contig are silently ignored.

Output columns: chrom, ref_pos (0-based), read_pos, joint_pos, op, len, packed.

Example usage:
  nonref scan -i sample.bam -r ref.fa -o diffs.tsv
  nonref scan -i sample.bam -r ref.fa -L chr1:10000-20000 -L chr2
  nonref scan -i sample.bam -r ref.fa --unique-positions --skip-zero-edit-distance
"
)]
pub struct Scan {
    /// Input coordinate-sorted BAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Reference FASTA file
    #[arg(short = 'r', long = "reference")]
    pub reference: PathBuf,

    /// Output TSV file ("-" for stdout)
    #[arg(short = 'o', long = "output", default_value = "-")]
    pub output: PathBuf,

    /// Restrict the walk to one or more regions (chr, chr:start, or
    /// chr:start-end; 1-based inclusive, in reference order)
    #[arg(short = 'L', long = "region")]
    pub regions: Vec<GenomicRegion>,

    /// Emit each reference position at most once within the cache window
    #[arg(long = "unique-positions")]
    pub unique_positions: bool,

    /// Skip reads whose NM tag reports zero edit distance
    #[arg(long = "skip-zero-edit-distance")]
    pub skip_zero_edit_distance: bool,
}

impl Command for Scan {
    fn execute(&self) -> Result<()> {
        validate_file_exists(&self.input, "Input BAM")?;
        validate_file_exists(&self.reference, "Reference FASTA")?;

        let timer = OperationTimer::new("Scanning reads");
        info!("Input: {}", self.input.display());
        info!("Reference: {}", self.reference.display());
        info!("Output: {}", self.output.display());
        for region in &self.regions {
            info!("Region: {region}");
        }

        let reference = ReferenceReader::new(&self.reference)?;
        let source = BamSource::open(&self.input)?;
        let mut walker = ReadWalker::new(source);

        // The hook borrows the walker mutably, so contig names are resolved
        // against a snapshot of the header.
        let contig_names: Vec<String> =
            walker.header().reference_sequences().keys().map(|name| name.to_string()).collect();

        let mut sink = OutputSink::create(&self.output)?;
        writeln!(sink, "#chrom\tref_pos\tread_pos\tjoint_pos\top\tlen\tpacked")
            .context("Failed to write output header")?;

        let mut seen_positions: PositionCache<u8> = PositionCache::new();
        let mut events_emitted: u64 = 0;
        let mut reads_skipped: u64 = 0;
        let mut write_error: Option<anyhow::Error> = None;

        let hook = |record: &RecordBuf| -> bool {
            if self.skip_zero_edit_distance && has_zero_edit_distance(record) {
                return true;
            }

            let (Some(chrom), Some(start), Some(end)) = (
                record.reference_sequence_id().and_then(|id| contig_names.get(id)),
                clipped_start(record),
                clipped_end(record),
            ) else {
                reads_skipped += 1;
                return true;
            };
            if start < 0 {
                // Overhangs the contig start; the scanner would reject it too.
                reads_skipped += 1;
                return true;
            }

            let ref_bases = match reference.fetch_span(chrom, start as u64, end as u64) {
                Ok(bases) => bases,
                Err(e) => {
                    debug!("skipping read with unfetchable span: {e}");
                    reads_skipped += 1;
                    return true;
                }
            };

            for event in scan_read(record, ref_bases) {
                if self.unique_positions {
                    if seen_positions.contains(event.ref_pos) {
                        continue;
                    }
                    seen_positions.insert(event.ref_pos, 1);
                }

                let result = writeln!(
                    sink,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{:#x}",
                    chrom,
                    event.ref_pos,
                    event.read_pos,
                    event.joint_pos,
                    event.kind_symbol(),
                    event.len,
                    encode(event)
                );
                if let Err(e) = result {
                    write_error = Some(anyhow::Error::new(e).context("Failed to write event"));
                    return false;
                }
                events_emitted += 1;
            }

            true
        };

        let summary: WalkSummary = if self.regions.is_empty() {
            walker.walk(hook)
        } else {
            walker.walk_regions(self.regions.clone(), hook)?
        };

        if let Some(e) = write_error {
            return Err(e);
        }
        sink.finish()?;

        info!("=== Summary ===");
        info!("Reads seen: {}", format_count(summary.reads_seen));
        info!("Reads processed: {}", format_count(summary.reads_processed));
        info!("Reads skipped in scan: {}", format_count(reads_skipped));
        info!("Events emitted: {}", format_count(events_emitted));
        timer.log_completion(summary.reads_seen);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonref_lib::bam_io::create_bam_writer;
    use nonref_lib::sam::builder::{RecordBuilder, create_test_fasta};
    use noodles::sam::Header;
    use noodles::sam::alignment::io::Write as AlignmentWrite;
    use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
    use std::num::NonZeroUsize;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_header() -> Header {
        Header::builder()
            .add_reference_sequence(
                b"chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(40).unwrap()),
            )
            .build()
    }

    fn write_bam(path: &Path, records: &[RecordBuf]) -> Result<()> {
        let header = test_header();
        let mut writer = create_bam_writer(path, &header)?;
        for record in records {
            writer.write_alignment_record(&header, record)?;
        }
        Ok(())
    }

    fn scan_command(dir: &TempDir, fasta: &Path, bam: &Path) -> (Scan, PathBuf) {
        let output = dir.path().join("out.tsv");
        let command = Scan {
            input: bam.to_path_buf(),
            reference: fasta.to_path_buf(),
            output: output.clone(),
            regions: Vec::new(),
            unique_positions: false,
            skip_zero_edit_distance: false,
        };
        (command, output)
    }

    #[test]
    fn test_scan_emits_expected_events() -> Result<()> {
        let dir = TempDir::new()?;
        //                              0123456789...
        let fasta = create_test_fasta(&[("chr1", "ACGTACGTACGTACGTACGT")])?;
        let bam = dir.path().join("input.bam");

        // One mismatch at 0-based position 7 (T -> A).
        let record = RecordBuilder::new()
            .name("r1")
            .sequence("ACGTACGA")
            .cigar("8M")
            .reference_sequence_id(0)
            .alignment_start(1)
            .build();
        write_bam(&bam, &[record])?;

        let (command, output) = scan_command(&dir, fasta.path(), &bam);
        command.execute()?;

        let contents = std::fs::read_to_string(&output)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert!(lines[0].starts_with("#chrom"));
        assert_eq!(lines.len(), 2);
        let fields: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(fields[0], "chr1");
        assert_eq!(fields[1], "7");
        assert_eq!(fields[2], "7");
        assert_eq!(fields[4], "X");
        assert_eq!(fields[5], "1");
        Ok(())
    }

    #[test]
    fn test_unique_positions_suppresses_duplicates() -> Result<()> {
        let dir = TempDir::new()?;
        let fasta = create_test_fasta(&[("chr1", "ACGTACGTACGTACGTACGT")])?;
        let bam = dir.path().join("input.bam");

        // Two overlapping reads sharing the mismatch at position 7; the
        // second also mismatches at position 8.
        let r1 = RecordBuilder::new()
            .name("r1")
            .sequence("ACGTACGA")
            .cigar("8M")
            .reference_sequence_id(0)
            .alignment_start(1)
            .build();
        let r2 = RecordBuilder::new()
            .name("r2")
            .sequence("CGTACGAG")
            .cigar("8M")
            .reference_sequence_id(0)
            .alignment_start(2)
            .build();
        write_bam(&bam, &[r1, r2])?;

        let (mut command, output) = scan_command(&dir, fasta.path(), &bam);
        command.unique_positions = true;
        command.execute()?;

        let contents = std::fs::read_to_string(&output)?;
        // Both reads mismatch at ref_pos 7; r2 also mismatches at 8.
        let data_lines: Vec<&str> =
            contents.lines().filter(|line| !line.starts_with('#')).collect();
        assert_eq!(data_lines.len(), 2);
        assert!(data_lines[0].starts_with("chr1\t7\t"));
        assert!(data_lines[1].starts_with("chr1\t8\t"));
        Ok(())
    }

    #[test]
    fn test_skip_zero_edit_distance() -> Result<()> {
        let dir = TempDir::new()?;
        let fasta = create_test_fasta(&[("chr1", "ACGTACGTACGTACGTACGT")])?;
        let bam = dir.path().join("input.bam");

        // Soft-clipped read tagged NM=0: the clip would normally emit an
        // event, but the NM short-circuit skips the read entirely.
        let record = RecordBuilder::new()
            .name("r1")
            .sequence("TTACGTAC")
            .cigar("2S6M")
            .reference_sequence_id(0)
            .alignment_start(3)
            .tag("NM", 0i32)
            .build();
        write_bam(&bam, &[record])?;

        let (mut command, output) = scan_command(&dir, fasta.path(), &bam);
        command.skip_zero_edit_distance = true;
        command.execute()?;

        let contents = std::fs::read_to_string(&output)?;
        assert_eq!(contents.lines().count(), 1, "only the header line");
        Ok(())
    }

    #[test]
    fn test_region_restriction() -> Result<()> {
        let dir = TempDir::new()?;
        let fasta = create_test_fasta(&[("chr1", "ACGTACGTACGTACGTACGT")])?;
        let bam = dir.path().join("input.bam");

        // Mismatching reads at 0-based positions 0 and 12.
        let early = RecordBuilder::new()
            .name("early")
            .sequence("ACGA")
            .cigar("4M")
            .reference_sequence_id(0)
            .alignment_start(1)
            .build();
        let late = RecordBuilder::new()
            .name("late")
            .sequence("ACGA")
            .cigar("4M")
            .reference_sequence_id(0)
            .alignment_start(13)
            .build();
        write_bam(&bam, &[early, late])?;

        let (mut command, output) = scan_command(&dir, fasta.path(), &bam);
        command.regions = vec!["chr1:11-20".parse().unwrap()];
        command.execute()?;

        let contents = std::fs::read_to_string(&output)?;
        let data_lines: Vec<&str> =
            contents.lines().filter(|line| !line.starts_with('#')).collect();
        assert_eq!(data_lines.len(), 1);
        assert!(data_lines[0].starts_with("chr1\t15\t"));
        Ok(())
    }

    #[test]
    fn test_missing_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let fasta = create_test_fasta(&[("chr1", "ACGT")]).unwrap();
        let (command, _output) =
            scan_command(&dir, fasta.path(), Path::new("/nonexistent/input.bam"));
        let msg = command.execute().unwrap_err().to_string();
        assert!(msg.contains("Input BAM"));
    }
}
