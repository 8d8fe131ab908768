//! Parsing of zsh extended-history lines.
//!
//! A line looks like `: 1700000000:0;git status`. The part before the first
//! `;` is metadata (`: <timestamp>:<duration>`), the part after it is the
//! command. Only the text up to the *next* `;` becomes the key, so
//! `: 1:0;make; make install` is keyed as `make`.
//!
//! Lines are handled as raw bytes. zsh metafies some bytes when writing its
//! history file, so a line is not guaranteed to be valid UTF-8.

/// Separates the metadata segment from the command.
pub const DELIMITER: u8 = b';';

/// Marks the start of the timestamp inside the metadata segment.
const TIMESTAMP_MARKER: &[u8] = b": ";

/// One history entry as stored in the backup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    /// Command bytes; unique within the store.
    pub key: Vec<u8>,
    /// Seconds since the epoch, taken from the metadata segment.
    pub timestamp: u64,
    /// The original line, metadata prefix included.
    pub raw_line: Vec<u8>,
}

impl HistoryRecord {
    /// Drop a trailing `\n` / `\r\n` from the stored raw line.
    #[must_use]
    pub fn without_terminator(mut self) -> Self {
        let len = trim_terminator(&self.raw_line).len();
        self.raw_line.truncate(len);
        self
    }
}

/// Why a line did not yield a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// No `;` in the line. Callers skip these.
    #[error("line has no `;` delimiter")]
    TooFewSegments,
    /// There is a command segment but the metadata is not `: <digits>:...`.
    /// Callers treat this as fatal.
    #[error("malformed metadata segment {segment:?}")]
    MalformedMetadata { segment: String },
}

/// Parse one history line, with or without its trailing newline.
///
/// # Errors
/// [`LineError::TooFewSegments`] when the line has no delimiter,
/// [`LineError::MalformedMetadata`] when the timestamp cannot be extracted.
pub fn parse_line(line: &[u8]) -> Result<HistoryRecord, LineError> {
    let mut segments = line.split(|&b| b == DELIMITER);
    let metadata = segments.next().unwrap_or_default();
    let Some(command) = segments.next() else {
        return Err(LineError::TooFewSegments);
    };
    let key = if segments.next().is_none() {
        trim_terminator(command)
    } else {
        command
    };

    let timestamp = parse_timestamp(metadata).ok_or_else(|| LineError::MalformedMetadata {
        segment: String::from_utf8_lossy(metadata).into_owned(),
    })?;

    Ok(HistoryRecord {
        key: key.to_vec(),
        timestamp,
        raw_line: line.to_vec(),
    })
}

/// `": 1700000000:0"` -> `1700000000`.
fn parse_timestamp(metadata: &[u8]) -> Option<u64> {
    let start = metadata
        .windows(TIMESTAMP_MARKER.len())
        .position(|w| w == TIMESTAMP_MARKER)?
        + TIMESTAMP_MARKER.len();
    let after_marker = &metadata[start..];
    let digits = after_marker
        .split(|&b| b == b':')
        .next()
        .unwrap_or_default();
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn trim_terminator(s: &[u8]) -> &[u8] {
    let s = s.strip_suffix(b"\n").unwrap_or(s);
    s.strip_suffix(b"\r").unwrap_or(s)
}
