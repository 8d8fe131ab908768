use std::path::PathBuf;

/// Every failure the backup and restore paths can hit. All of them are fatal
/// to the running operation; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source history file (backup) or the destination file (restore)
    /// could not be opened.
    #[error("cannot open {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading the source file failed part-way.
    #[error("read history line {line}")]
    SourceRead {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    /// A line had a `;` delimiter but its metadata segment did not carry a
    /// `": <timestamp>:"` prefix.
    #[error("line {line}: malformed metadata segment {segment:?}")]
    MalformedMetadata { line: usize, segment: String },

    #[error("open store at {}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: StoreSetupError,
    },

    #[error("batch upsert")]
    TransactionFailure(#[source] rusqlite::Error),

    #[error("scan stored history")]
    ScanFailure(#[source] rusqlite::Error),

    #[error("append to {}", .path.display())]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why the store could not be brought up.
#[derive(Debug, thiserror::Error)]
pub enum StoreSetupError {
    #[error("create parent directory")]
    CreateDir(#[source] std::io::Error),
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    /// A table with the backup table's name exists but lacks the `command`
    /// key column, e.g. one written by an older two-column tool.
    #[error("table {table} has no `command` column; move it aside or use another --db")]
    IncompatibleSchema { table: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
