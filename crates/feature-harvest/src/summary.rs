//! Per-term summary log: one `term,count` line per parsed response.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::HarvestResult;
use crate::types::SummaryEntry;

/// Append-only two-column CSV log, flushed after every line.
pub struct SummaryLog<W: Write> {
    writer: csv::Writer<W>,
    lines: usize,
}

impl SummaryLog<File> {
    /// Create (or truncate) the log file.
    pub fn create(path: &Path) -> HarvestResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write> SummaryLog<W> {
    pub fn new(inner: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Self { writer, lines: 0 }
    }

    /// Write one entry and flush it immediately.
    pub fn record(&mut self, entry: &SummaryEntry) -> HarvestResult<()> {
        self.writer
            .write_record([entry.term.as_str(), entry.count.to_string().as_str()])?;
        self.writer.flush()?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> HarvestResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::HarvestError::Io(std::io::Error::other(e.to_string())))
    }
}
