use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::collector;
use crate::error::{Error, Result};
use crate::store::Store;

/// Read `history_path`, deduplicate by command and upsert the result into
/// `store` as one transaction. Returns the number of distinct commands saved.
///
/// The store is untouched if the file cannot be read or any line has a
/// malformed timestamp.
///
/// # Errors
/// [`Error::SourceUnavailable`], [`Error::SourceRead`],
/// [`Error::MalformedMetadata`] or [`Error::TransactionFailure`].
pub fn backup(store: &mut Store, history_path: &Path) -> Result<usize> {
    tracing::info!(history = %history_path.display(), "backing up shell history");
    let records = {
        let file = File::open(history_path).map_err(|source| Error::SourceUnavailable {
            path: history_path.to_path_buf(),
            source,
        })?;
        collector::collect(BufReader::new(file))?
    };

    let saved = store.upsert_batch(records.values())?;
    tracing::info!(saved, db = %store.path().display(), "commands saved to db");
    Ok(saved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup(history: &str) -> (TempDir, Store, std::path::PathBuf) {
        let dir = TempDir::new().expect("tempdir");
        let hist = dir.path().join(".zsh_history");
        std::fs::write(&hist, history).expect("write history");
        let store = Store::open(&dir.path().join("h.sqlite")).expect("open store");
        (dir, store, hist)
    }

    fn stored(store: &Store) -> Vec<String> {
        let mut out = Vec::new();
        store
            .scan_descending(|l| {
                out.push(String::from_utf8_lossy(l).into_owned());
                Ok(())
            })
            .expect("scan");
        out
    }

    #[test]
    fn backup_reports_distinct_command_count() {
        let (_dir, mut store, hist) =
            setup(": 1000:0;ls -la\n: 2000:0;cd /tmp\n: 1000:0;ls -la\n");
        assert_eq!(backup(&mut store, &hist).expect("backup"), 2);
        assert_eq!(stored(&store), vec![": 2000:0;cd /tmp", ": 1000:0;ls -la"]);
    }

    #[test]
    fn backup_twice_is_idempotent() {
        let (_dir, mut store, hist) = setup(": 1:0;a\n: 2:0;b\n: 3:0;a\n");
        backup(&mut store, &hist).expect("first");
        let once = stored(&store);
        backup(&mut store, &hist).expect("second");
        assert_eq!(stored(&store), once);
        assert_eq!(store.count().expect("count"), 2);
    }

    #[test]
    fn unparsable_only_file_saves_nothing() {
        let (_dir, mut store, hist) = setup("no-semicolon-here\n");
        assert_eq!(backup(&mut store, &hist).expect("backup"), 0);
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn malformed_metadata_leaves_store_unchanged() {
        let (dir, mut store, hist) = setup(": 5:0;seed\n");
        backup(&mut store, &hist).expect("seed backup");

        let bad = dir.path().join("bad");
        std::fs::write(&bad, ": 10:0;fine\n: badformat;echo hi\n").expect("write");
        let err = backup(&mut store, &bad).unwrap_err();
        assert!(matches!(err, Error::MalformedMetadata { line: 2, .. }));
        assert_eq!(stored(&store), vec![": 5:0;seed"]);
    }

    #[test]
    fn missing_source_is_unavailable() {
        let (dir, mut store, _) = setup("");
        let err = backup(&mut store, &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn non_utf8_history_backs_up_and_restores_byte_exact() {
        let dir = TempDir::new().expect("tempdir");
        let hist = dir.path().join(".zsh_history");
        std::fs::write(&hist, b": 1:0;ls\n: 2:0;echo \xe2\x80\x83\xb4\n").expect("write");
        let mut store = Store::open(&dir.path().join("h.sqlite")).expect("open store");

        assert_eq!(backup(&mut store, &hist).expect("backup"), 2);

        let dest = dir.path().join("restored");
        crate::restore::restore(&store, &dest).expect("restore");
        assert_eq!(
            std::fs::read(&dest).expect("read"),
            b": 2:0;echo \xe2\x80\x83\xb4\n: 1:0;ls\n"
        );
    }

    #[test]
    fn timestamp_beyond_i64_range_is_backed_up() {
        let (_dir, mut store, hist) = setup(": 1:0;ls\n: 9223372036854775808:0;pwd\n");
        assert_eq!(backup(&mut store, &hist).expect("backup"), 2);
        assert_eq!(
            stored(&store),
            vec![": 9223372036854775808:0;pwd", ": 1:0;ls"]
        );
    }

    #[test]
    fn newer_backup_replaces_older_line_for_same_command() {
        let (dir, mut store, hist) = setup(": 100:0;make\n");
        backup(&mut store, &hist).expect("first");
        let later = dir.path().join("later");
        std::fs::write(&later, ": 900:4;make\n").expect("write");
        backup(&mut store, &later).expect("second");
        assert_eq!(stored(&store), vec![": 900:4;make"]);
    }
}
