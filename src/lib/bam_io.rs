//! BAM file I/O helpers.
//!
//! Thin construction helpers over `noodles` so that every open site reports
//! the failing path. The read stream is single-threaded BGZF; the walker's
//! pass is sequential and decompression is not the bottleneck for a
//! diff scan.

use anyhow::{Context, Result};
use noodles::sam::Header;
use std::fs::File;
use std::path::Path;

/// Type alias for the single-threaded BAM reader.
pub type BamReader = noodles::bam::io::Reader<noodles::bgzf::Reader<File>>;

/// Type alias for the single-threaded BAM writer.
pub type BamWriter = noodles::bam::io::Writer<noodles::bgzf::Writer<File>>;

/// Opens a BAM file and reads its header.
///
/// # Errors
/// Returns an error naming the path if the file cannot be opened or the
/// header cannot be read. Callers treat this as fatal.
pub fn create_bam_reader<P: AsRef<Path>>(path: P) -> Result<(BamReader, Header)> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open input BAM: {}", path_ref.display()))?;

    let mut reader = noodles::bam::io::Reader::new(file);
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path_ref.display()))?;

    Ok((reader, header))
}

/// Creates a BAM file and writes the header.
///
/// # Errors
/// Returns an error naming the path if the file cannot be created or the
/// header cannot be written.
pub fn create_bam_writer<P: AsRef<Path>>(path: P, header: &Header) -> Result<BamWriter> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref)
        .with_context(|| format!("Failed to create output BAM: {}", path_ref.display()))?;

    let mut writer = noodles::bam::io::Writer::new(file);
    writer
        .write_header(header)
        .with_context(|| format!("Failed to write header to: {}", path_ref.display()))?;

    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::sam::header::record::value::{Map, map::ReferenceSequence};
    use std::num::NonZeroUsize;
    use tempfile::NamedTempFile;

    fn create_test_header() -> Header {
        let ref_seq = Map::<ReferenceSequence>::new(NonZeroUsize::new(100).unwrap());
        Header::builder().add_reference_sequence(b"chr1", ref_seq).build()
    }

    #[test]
    fn test_open_nonexistent_file_names_the_path() {
        let result = create_bam_reader("/nonexistent/file.bam");
        let msg = result.err().expect("should fail").to_string();
        assert!(msg.contains("Failed to open input BAM"));
        assert!(msg.contains("/nonexistent/file.bam"));
    }

    #[test]
    fn test_write_then_read_round_trip() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let header = create_test_header();

        {
            let _writer = create_bam_writer(temp_file.path(), &header)?;
        }

        let (mut reader, read_header) = create_bam_reader(temp_file.path())?;
        assert_eq!(read_header.reference_sequences().len(), 1);

        let records: std::io::Result<Vec<_>> = reader.records().collect();
        assert!(records?.is_empty());
        Ok(())
    }
}
