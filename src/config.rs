use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::paths;

/// The two files an invocation works on, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Shell history file: read by backup, appended to by restore.
    pub history_file: PathBuf,
    /// SQLite backup store.
    pub db_file: PathBuf,
}

/// Private: parsed representation of a shellrack config file.
#[derive(serde::Deserialize, Default)]
struct ShellrackConfig {
    paths: Option<PathsSection>,
}

#[derive(serde::Deserialize, Default)]
struct PathsSection {
    history: Option<PathBuf>,
    db: Option<PathBuf>,
}

/// Read the `[paths]` table from a TOML config file. A missing or invalid
/// file yields an empty section.
fn read_paths_section(path: &Path) -> PathsSection {
    let Ok(content) = std::fs::read_to_string(path) else {
        return PathsSection::default();
    };
    match toml::from_str::<ShellrackConfig>(&content) {
        Ok(cfg) => cfg.paths.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(config = %path.display(), "ignoring invalid config file: {e}");
            PathsSection::default()
        }
    }
}

impl Settings {
    /// Resolve paths using the auto-detected config file and home directory.
    /// Priority per path:
    /// 1. explicit override (CLI flag or its env var)
    /// 2. `[paths]` in `config.toml` (see [`paths::config_file`])
    /// 3. `~/.zsh_history` / `~/.zsh_history.sqlite`
    ///
    /// # Errors
    /// Returns an error if a path falls through to the default and no home
    /// directory can be determined.
    pub fn resolve(history: Option<PathBuf>, db: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = paths::config_file();
        let home = dirs::home_dir();
        Self::resolve_from(history, db, config.as_deref(), home.as_deref())
    }

    /// Resolve paths from explicit inputs. Useful for testing.
    ///
    /// # Errors
    /// Returns an error if a default is needed but `home` is `None`.
    pub fn resolve_from(
        history: Option<PathBuf>,
        db: Option<PathBuf>,
        config_file: Option<&Path>,
        home: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let section = config_file.map(read_paths_section).unwrap_or_default();
        let pick = |explicit: Option<PathBuf>, configured: Option<PathBuf>, default: &str| {
            explicit
                .or(configured)
                .map(|p| paths::expand_home(&p, home))
                .or_else(|| home.map(|h| h.join(default)))
                .with_context(|| {
                    format!("cannot determine home directory for default path ~/{default}")
                })
        };

        let settings = Self {
            history_file: pick(history, section.history, paths::DEFAULT_HISTORY_FILE)?,
            db_file: pick(db, section.db, paths::DEFAULT_DB_FILE)?,
        };
        tracing::debug!(
            history = %settings.history_file.display(),
            db = %settings.db_file.display(),
            "resolved paths"
        );
        Ok(settings)
    }
}
