//! User-directory resolution.
//!
//! When `SHELLRACK_HOME` is set, it replaces the platform config directory
//! as the place `config.toml` is read from.
//!
//! Defaults for the two files the tool works on sit next to each other in
//! the home directory, matching where zsh keeps its history:
//!   - `~/.zsh_history`
//!   - `~/.zsh_history.sqlite`

use std::path::{Path, PathBuf};

pub const DEFAULT_HISTORY_FILE: &str = ".zsh_history";
pub const DEFAULT_DB_FILE: &str = ".zsh_history.sqlite";

/// Returns the shellrack config directory: `SHELLRACK_HOME` if set and
/// non-empty, else `dirs::config_dir()/shellrack`.
pub fn user_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("SHELLRACK_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs::config_dir().map(|d| d.join("shellrack"))
}

/// Path of the optional user config file.
pub fn config_file() -> Option<PathBuf> {
    user_dir().map(|d| d.join("config.toml"))
}

/// Expand a leading `~/` against `home`. Other paths are returned as-is.
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
