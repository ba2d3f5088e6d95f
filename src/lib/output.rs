//! Scoped output sinks.
//!
//! [`OutputSink`] writes event lines either to a file or to standard output
//! (`-`). The file variant is closed when the sink is dropped, on every exit
//! path; the stdout variant only holds a locked handle, so the process stream
//! itself is never closed.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

/// A buffered output destination: a created file, or standard output.
pub enum OutputSink {
    /// A file created by [`OutputSink::create`]; closed on drop.
    File(BufWriter<File>),
    /// The process's standard output; never closed.
    Stdout(BufWriter<Stdout>),
}

impl OutputSink {
    /// Opens the sink for `path`, where `-` means standard output.
    ///
    /// # Errors
    /// Returns an error if a file destination cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        if path_ref.as_os_str() == "-" {
            Ok(OutputSink::Stdout(BufWriter::new(io::stdout())))
        } else {
            let file = File::create(path_ref)
                .with_context(|| format!("Failed to create output file: {}", path_ref.display()))?;
            Ok(OutputSink::File(BufWriter::new(file)))
        }
    }

    /// Flushes and, for files, closes the destination.
    ///
    /// Dropping the sink has the same effect; calling `finish` surfaces the
    /// final I/O errors instead of discarding them.
    ///
    /// # Errors
    /// Returns an error if flushing fails.
    pub fn finish(mut self) -> Result<()> {
        self.flush().context("Failed to flush output")?;
        Ok(())
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::File(w) => w.write(buf),
            OutputSink::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::File(w) => w.flush(),
            OutputSink::Stdout(w) => w.flush(),
        }
    }
}
