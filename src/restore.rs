use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write as _};
use std::path::Path;

use crate::error::{Error, Result};
use crate::store::Store;

/// Append every stored line to `destination`, newest first, one per line.
/// Returns the number of lines written.
///
/// The file is created if missing and never truncated, so restoring twice
/// into the same file writes every line twice. Lines appended before a
/// failure stay in the file.
///
/// # Errors
/// [`Error::SourceUnavailable`] if the file cannot be opened,
/// [`Error::ScanFailure`] on a store read failure, or
/// [`Error::DestinationWrite`] if writing fails.
pub fn restore(store: &Store, destination: &Path) -> Result<usize> {
    tracing::info!(history = %destination.display(), "restoring shell history");
    let file = open_append(destination).map_err(|source| Error::SourceUnavailable {
        path: destination.to_path_buf(),
        source,
    })?;
    let write_err = |source| Error::DestinationWrite {
        path: destination.to_path_buf(),
        source,
    };

    let mut out = BufWriter::new(file);
    let written = store.scan_descending(|line| {
        out.write_all(line)
            .and_then(|()| out.write_all(b"\n"))
            .map_err(write_err)
    })?;
    out.flush().map_err(write_err)?;

    tracing::info!(written, "commands restored");
    Ok(written)
}

fn open_append(path: &Path) -> std::io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt as _;
        opts.mode(0o600);
    }
    opts.open(path)
}
