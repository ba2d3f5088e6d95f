//! The streaming read walker.
//!
//! [`ReadWalker`] drives one sequential pass over a read stream: pull a
//! record from a [`RecordSource`], emit a throughput status report every
//! 100,000th read, apply the [`ReadFilter`], and hand surviving reads to a
//! per-read hook. The hook's boolean return is the only cancellation
//! mechanism: `false` stops the walk immediately.
//!
//! The walker moves through three phases: `Idle` (constructed), `Running`
//! (inside the loop), and `Stopped` (terminal; the source is exhausted or
//! the hook requested early stop). Region narrowing is delegated entirely to
//! the source's own restriction capability; the walker has no region logic.
//!
//! Per-read failures (undecodable records) are skipped with a warning and the
//! walk continues; only failing to open the source at construction is fatal.

use log::{info, warn};
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use crate::bam_io::{BamReader, create_bam_reader};
use crate::errors::NonrefError;
use crate::filter::ReadFilter;
use crate::progress::ThroughputTracker;
use crate::sam::record_utils::alignment_end;

/// Reads between throughput status reports.
const STATUS_INTERVAL: u64 = 100_000;

/// A 1-based inclusive genomic interval, e.g. `chr1:1000-2000`.
///
/// `chr1` alone spans the whole contig and `chr1:1000` is open-ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicRegion {
    /// Contig name.
    pub name: String,
    /// 1-based inclusive start.
    pub start: u64,
    /// 1-based inclusive end; `u64::MAX` when open-ended.
    pub end: u64,
}

impl FromStr for GenomicRegion {
    type Err = NonrefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| NonrefError::InvalidParameter {
            parameter: "region".to_string(),
            reason: format!("{reason}: '{s}'"),
        };

        let (name, interval) = match s.split_once(':') {
            None => return Ok(Self { name: s.to_string(), start: 1, end: u64::MAX }),
            Some((name, interval)) => (name, interval),
        };
        if name.is_empty() {
            return Err(invalid("empty contig name"));
        }

        let (start, end) = match interval.split_once('-') {
            None => {
                let start = interval.parse().map_err(|_| invalid("malformed start"))?;
                (start, u64::MAX)
            }
            Some((start, end)) => {
                let start = start.parse().map_err(|_| invalid("malformed start"))?;
                let end = end.parse().map_err(|_| invalid("malformed end"))?;
                (start, end)
            }
        };
        if start == 0 {
            return Err(invalid("regions are 1-based"));
        }
        if end < start {
            return Err(invalid("end before start"));
        }

        Ok(Self { name: name.to_string(), start, end })
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == 1 && self.end == u64::MAX {
            write!(f, "{}", self.name)
        } else if self.end == u64::MAX {
            write!(f, "{}:{}", self.name, self.start)
        } else {
            write!(f, "{}:{}-{}", self.name, self.start, self.end)
        }
    }
}

/// A stream of alignment records with optional region restriction.
///
/// This is the walker-facing contract of the sequence source: header access,
/// a blocking pull, and region setters that affect subsequent pulls.
pub trait RecordSource {
    /// The stream's header (chromosome name/length lookup by id).
    fn header(&self) -> &Header;

    /// Restricts subsequent [`RecordSource::next_read`] calls to one region.
    ///
    /// # Errors
    /// Returns an error if the region's contig is not in the header.
    fn set_region(&mut self, region: GenomicRegion) -> anyhow::Result<()>;

    /// Restricts subsequent pulls to a collection of regions, which must be
    /// sorted in reference order and non-overlapping.
    ///
    /// # Errors
    /// Returns an error if any region's contig is not in the header.
    fn set_regions(&mut self, regions: Vec<GenomicRegion>) -> anyhow::Result<()>;

    /// Pulls the next record, or `None` at end of stream. Blocking.
    fn next_read(&mut self) -> Option<io::Result<RecordBuf>>;
}

/// A region resolved against the header: reference index plus 0-based bounds.
#[derive(Debug, Clone, Copy)]
struct ResolvedRegion {
    ref_index: usize,
    /// 0-based inclusive start.
    start: u64,
    /// 0-based inclusive end.
    end: u64,
}

/// A [`RecordSource`] over a coordinate-sorted BAM file.
///
/// Region restriction is implemented as overlap filtering with early
/// termination: once the stream is past the last requested region, the
/// source reports end-of-stream without reading further records. Regions
/// must be given in reference order.
pub struct BamSource {
    reader: BamReader,
    header: Header,
    regions: VecDeque<ResolvedRegion>,
    restricted: bool,
}

impl BamSource {
    /// Opens a BAM file.
    ///
    /// # Errors
    /// Returns an error naming the path if the file cannot be opened or its
    /// header read; this aborts the run.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let (reader, header) = create_bam_reader(path)?;
        Ok(Self { reader, header, regions: VecDeque::new(), restricted: false })
    }

    fn resolve(&self, region: &GenomicRegion) -> anyhow::Result<ResolvedRegion> {
        let ref_index = self
            .header
            .reference_sequences()
            .get_index_of(region.name.as_bytes())
            .ok_or_else(|| NonrefError::ReferenceNotFound { ref_name: region.name.clone() })?;
        Ok(ResolvedRegion {
            ref_index,
            start: region.start - 1,
            end: if region.end == u64::MAX { u64::MAX } else { region.end - 1 },
        })
    }

    fn pull(&mut self) -> Option<io::Result<RecordBuf>> {
        let mut record = RecordBuf::default();
        match self.reader.read_record_buf(&self.header, &mut record) {
            Ok(0) => None,
            Ok(_) => Some(Ok(record)),
            Err(e) => Some(Err(e)),
        }
    }
}

impl RecordSource for BamSource {
    fn header(&self) -> &Header {
        &self.header
    }

    fn set_region(&mut self, region: GenomicRegion) -> anyhow::Result<()> {
        self.set_regions(vec![region])
    }

    fn set_regions(&mut self, regions: Vec<GenomicRegion>) -> anyhow::Result<()> {
        let mut resolved = Vec::with_capacity(regions.len());
        for region in &regions {
            resolved.push(self.resolve(region)?);
        }
        self.regions = resolved.into();
        self.restricted = true;
        Ok(())
    }

    fn next_read(&mut self) -> Option<io::Result<RecordBuf>> {
        if !self.restricted {
            return self.pull();
        }

        loop {
            let record = match self.pull()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };

            // Unplaced records cannot overlap a region.
            let (Some(ref_index), Some(start)) =
                (record.reference_sequence_id(), record.alignment_start())
            else {
                continue;
            };
            let start = usize::from(start) as u64 - 1;
            let end = alignment_end(&record).map_or(start, |end| end as u64);

            // Drop regions the coordinate-sorted stream has moved past.
            while let Some(region) = self.regions.front() {
                if region.ref_index < ref_index
                    || (region.ref_index == ref_index && region.end < start)
                {
                    self.regions.pop_front();
                } else {
                    break;
                }
            }
            let Some(region) = self.regions.front() else {
                // Past the last region: end of the restricted stream.
                return None;
            };

            // Before the current region: keep scanning.
            if ref_index < region.ref_index
                || (ref_index == region.ref_index && end < region.start)
            {
                continue;
            }

            return Some(Ok(record));
        }
    }
}

/// Phase of a [`ReadWalker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkerPhase {
    /// Constructed, not yet iterating.
    Idle,
    /// Actively pulling from the source.
    Running,
    /// Terminal: source exhausted or the hook requested early stop.
    Stopped,
}

/// Counters for a completed (or stopped) walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSummary {
    /// Records pulled from the source.
    pub reads_seen: u64,
    /// Records that survived the filter and reached the hook.
    pub reads_processed: u64,
    /// Whether the hook requested early termination.
    pub stopped_early: bool,
}

/// The streaming control loop: source -> filter -> hook.
pub struct ReadWalker<S: RecordSource> {
    source: S,
    filter: ReadFilter,
    state: ThroughputTracker,
    phase: WalkerPhase,
}

impl<S: RecordSource> ReadWalker<S> {
    /// Creates a walker over `source` with the default [`ReadFilter`].
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            filter: ReadFilter::new(),
            state: ThroughputTracker::new(STATUS_INTERVAL),
            phase: WalkerPhase::Idle,
        }
    }

    /// Replaces the read filter.
    #[must_use]
    pub fn with_filter(mut self, filter: ReadFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The source's header.
    #[must_use]
    pub fn header(&self) -> &Header {
        self.source.header()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> WalkerPhase {
        self.phase
    }

    fn summary(&self, stopped_early: bool) -> WalkSummary {
        WalkSummary {
            reads_seen: self.state.reads_seen(),
            reads_processed: self.state.reads_processed(),
            stopped_early,
        }
    }

    /// Walks the stream start to end, passing each included read to `hook`.
    ///
    /// The hook returns `true` to continue and `false` to stop the walk; that
    /// return value is the only cancellation mechanism. A walker that has
    /// already stopped returns its summary without iterating.
    pub fn walk<F>(&mut self, mut hook: F) -> WalkSummary
    where
        F: FnMut(&RecordBuf) -> bool,
    {
        if self.phase == WalkerPhase::Stopped {
            return self.summary(false);
        }
        self.phase = WalkerPhase::Running;

        loop {
            let record = match self.source.next_read() {
                None => break,
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    // Per-read failures never abort the scan.
                    warn!("skipping undecodable record: {e}");
                    self.state.count_seen();
                    continue;
                }
            };

            if self.state.report_due() {
                self.report_status(&record);
            }
            self.state.count_seen();

            if self.filter.is_excluded(&record) {
                continue;
            }
            self.state.count_processed();

            if !hook(&record) {
                self.phase = WalkerPhase::Stopped;
                return self.summary(true);
            }
        }

        self.phase = WalkerPhase::Stopped;
        self.summary(false)
    }

    /// Narrows the source to one region, then walks it.
    ///
    /// # Errors
    /// Returns an error if the source rejects the region (unknown contig).
    pub fn walk_region<F>(&mut self, region: GenomicRegion, hook: F) -> anyhow::Result<WalkSummary>
    where
        F: FnMut(&RecordBuf) -> bool,
    {
        self.source.set_region(region)?;
        Ok(self.walk(hook))
    }

    /// Narrows the source to a region collection, then walks it.
    ///
    /// # Errors
    /// Returns an error if the source rejects any region (unknown contig).
    pub fn walk_regions<F>(
        &mut self,
        regions: Vec<GenomicRegion>,
        hook: F,
    ) -> anyhow::Result<WalkSummary>
    where
        F: FnMut(&RecordBuf) -> bool,
    {
        self.source.set_regions(regions)?;
        Ok(self.walk(hook))
    }

    /// Logs one throughput status line at the current record.
    ///
    /// The first due report only arms the timing baseline.
    fn report_status(&mut self, record: &RecordBuf) {
        let Some(report) = self.state.take_report() else {
            return;
        };
        let position = record.alignment_start().map_or(0, usize::from);
        let name = record
            .reference_sequence_id()
            .and_then(|id| self.source.header().reference_sequences().get_index(id))
            .map_or_else(|| "*".to_string(), |(name, _)| name.to_string());
        info!(
            "{}:{} ({:.2} reads/s total, {:.2} reads/s processed)",
            name, position, report.reads_per_sec, report.processed_per_sec
        );
    }
}

/// Steps a (chromosome index, 0-based position) cursor one base forward,
/// rolling over to the next contig in header order at each contig's end.
///
/// Returns `None` when the cursor leaves the last contig or the index is out
/// of bounds.
#[must_use]
pub fn advance_position(header: &Header, chrom: usize, pos: u64) -> Option<(usize, u64)> {
    let sequences = header.reference_sequences();
    let (_, map) = sequences.get_index(chrom)?;
    let len = usize::from(map.length()) as u64;

    if pos + 1 >= len {
        if chrom + 1 < sequences.len() { Some((chrom + 1, 0)) } else { None }
    } else {
        Some((chrom, pos + 1))
    }
}
