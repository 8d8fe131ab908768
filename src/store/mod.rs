use std::path::{Path, PathBuf};

use rusqlite::types::{Value, ValueRef};
use rusqlite::{Connection, OptionalExtension as _};

use crate::error::{Error, Result, StoreSetupError};
use crate::record::HistoryRecord;

/// Name of the backup table.
pub const TABLE: &str = "shellrack";

/// SQLite-backed history store, keyed by command text.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open or create the store at `path` and make sure the table exists.
    ///
    /// # Errors
    /// Returns [`Error::StoreUnavailable`] if the directory cannot be created,
    /// the DB cannot be opened, or the schema cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |source: StoreSetupError| Error::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| unavailable(StoreSetupError::CreateDir(e)))?;
        }
        let conn = Connection::open(path).map_err(|e| unavailable(e.into()))?;
        Self::with_connection(conn, path)
    }

    /// Wrap an already-open connection; `path` is only used in error messages.
    ///
    /// # Errors
    /// Returns [`Error::StoreUnavailable`] if the schema cannot be created.
    pub fn with_connection(conn: Connection, path: &Path) -> Result<Self> {
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the backup table and its index if they are missing. Safe to
    /// call on every start.
    ///
    /// # Errors
    /// Returns [`Error::StoreUnavailable`] if the DDL fails or a table with
    /// the same name but an older layout is already present.
    pub fn ensure_schema(&self) -> Result<()> {
        self.create_table().map_err(|source| Error::StoreUnavailable {
            path: self.path.clone(),
            source,
        })
    }

    fn create_table(&self) -> Result<(), StoreSetupError> {
        // Table names are case-insensitive in SQLite.
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                [TABLE],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(table) = existing {
            let has_key: bool = self.conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM pragma_table_info(?1) WHERE name = 'command')",
                [&table],
                |r| r.get(0),
            )?;
            if !has_key {
                return Err(StoreSetupError::IncompatibleSchema { table });
            }
            return Ok(());
        }
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (
                command       BLOB    PRIMARY KEY,
                history_line  BLOB    NOT NULL,
                timestamp     INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{TABLE}_timestamp ON {TABLE}(timestamp DESC);"
        ))?;
        tracing::info!(path = %self.path.display(), "created backup table");
        Ok(())
    }

    /// Write every record in one transaction, replacing any stored record with
    /// the same key. Nothing is written if any row fails.
    ///
    /// # Errors
    /// Returns [`Error::TransactionFailure`] if begin, any insert, or commit fails.
    pub fn upsert_batch<'a, I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a HistoryRecord>,
    {
        let tx = self
            .conn
            .transaction()
            .map_err(Error::TransactionFailure)?;
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "REPLACE INTO {TABLE} (command, history_line, timestamp) VALUES (?1, ?2, ?3)"
                ))
                .map_err(Error::TransactionFailure)?;
            for record in records {
                stmt.execute(rusqlite::params![
                    record.key,
                    record.raw_line,
                    timestamp_value(record.timestamp)
                ])
                .map_err(Error::TransactionFailure)?;
                written += 1;
            }
        }
        tx.commit().map_err(Error::TransactionFailure)?;
        Ok(written)
    }

    /// Hand every stored raw line to `visit`, newest first. Records sharing a
    /// timestamp come out in command order.
    ///
    /// Rows are read one at a time; the scan stops at the first error.
    ///
    /// # Errors
    /// Returns [`Error::ScanFailure`] if the query or a row read fails, or
    /// whatever `visit` returns.
    pub fn scan_descending<F>(&self, mut visit: F) -> Result<usize>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT history_line FROM {TABLE} ORDER BY timestamp DESC, command ASC"
            ))
            .map_err(Error::ScanFailure)?;
        let mut rows = stmt.query([]).map_err(Error::ScanFailure)?;
        let mut seen = 0;
        while let Some(row) = rows.next().map_err(Error::ScanFailure)? {
            // Lines inserted by hand may be TEXT rather than BLOB.
            let line = match row.get_ref(0).map_err(Error::ScanFailure)? {
                ValueRef::Text(b) | ValueRef::Blob(b) => b,
                other => {
                    return Err(Error::ScanFailure(rusqlite::Error::InvalidColumnType(
                        0,
                        "history_line".to_owned(),
                        other.data_type(),
                    )));
                }
            };
            visit(line)?;
            seen += 1;
        }
        Ok(seen)
    }

    /// Number of stored records.
    ///
    /// # Errors
    /// Returns [`Error::ScanFailure`] if the count query fails.
    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {TABLE}"), [], |r| r.get(0))
            .map_err(Error::ScanFailure)?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Location the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) const fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// SQLite integers are signed; larger timestamps are stored as REAL, which
/// still orders numerically against INTEGER values.
#[allow(clippy::cast_precision_loss)]
fn timestamp_value(ts: u64) -> Value {
    i64::try_from(ts).map_or(Value::Real(ts as f64), Value::Integer)
}
