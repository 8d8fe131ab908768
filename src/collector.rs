use std::collections::HashMap;
use std::io::BufRead;

use crate::error::{Error, Result};
use crate::record::{self, HistoryRecord, LineError};

/// Folds history lines into one record per command. A command seen again
/// later in the file replaces the earlier record.
#[derive(Debug, Default)]
pub struct Collector {
    records: HashMap<Vec<u8>, HistoryRecord>,
    lines_seen: usize,
    skipped: usize,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line of the file.
    ///
    /// # Errors
    /// Returns [`Error::MalformedMetadata`] when the line has a command segment
    /// but no parsable timestamp.
    pub fn push(&mut self, line: &[u8]) -> Result<()> {
        self.lines_seen += 1;
        match record::parse_line(line) {
            Ok(rec) => {
                let rec = rec.without_terminator();
                self.records.insert(rec.key.clone(), rec);
                Ok(())
            }
            Err(LineError::TooFewSegments) => {
                self.skipped += 1;
                tracing::trace!(line = self.lines_seen, "skipping line without delimiter");
                Ok(())
            }
            Err(LineError::MalformedMetadata { segment }) => Err(Error::MalformedMetadata {
                line: self.lines_seen,
                segment,
            }),
        }
    }

    /// Number of lines skipped for lacking a delimiter.
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iteration order of the returned map is unspecified.
    pub fn into_records(self) -> HashMap<Vec<u8>, HistoryRecord> {
        self.records
    }
}

/// Read every line from `reader` and collect the deduplicated records.
///
/// Lines are read as bytes and need not be valid UTF-8. A final line
/// without a trailing newline is included.
///
/// # Errors
/// Returns [`Error::SourceRead`] on an I/O failure and
/// [`Error::MalformedMetadata`] on a line with a bad timestamp.
pub fn collect<R: BufRead>(mut reader: R) -> Result<HashMap<Vec<u8>, HistoryRecord>> {
    let mut collector = Collector::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| Error::SourceRead {
                line: collector.lines_seen + 1,
                source,
            })?;
        if n == 0 {
            break;
        }
        collector.push(&buf)?;
    }
    tracing::debug!(
        lines = collector.lines_seen,
        skipped = collector.skipped(),
        distinct = collector.len(),
        "collected history"
    );
    Ok(collector.into_records())
}
