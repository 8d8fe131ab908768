use std::io::IsTerminal as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use shellrack::Store;
use shellrack::config::Settings;

#[derive(Parser)]
#[command(
    name = "shellrack",
    version,
    about = "Back up shell history into SQLite and restore it into a history file"
)]
struct Cli {
    /// Back up the shell history file into the store
    #[arg(long, conflicts_with = "restore")]
    backup: bool,

    /// Append stored history to the shell history file, newest first.
    /// Existing content is kept; restoring twice writes every line twice.
    #[arg(long)]
    restore: bool,

    /// Print the number of commands in the store
    #[arg(long)]
    stats: bool,

    /// Shell history file [default: ~/.zsh_history]
    #[arg(long, env = "SHELLRACK_HISTORY", value_name = "PATH")]
    history: Option<PathBuf>,

    /// SQLite store [default: ~/.zsh_history.sqlite]
    #[arg(long, env = "SHELLRACK_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    /// Log resolved paths and per-step details
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "shellrack=debug"
    } else {
        "shellrack=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::resolve(cli.history.clone(), cli.db.clone())?;
    let mut store = Store::open(&settings.db_file)?;

    if cli.backup {
        shellrack::backup::backup(&mut store, &settings.history_file)
            .with_context(|| format!("backup of {}", settings.history_file.display()))?;
    } else if cli.restore {
        shellrack::restore::restore(&store, &settings.history_file)
            .with_context(|| format!("restore into {}", settings.history_file.display()))?;
    } else if !cli.stats {
        eprintln!("[shellrack] nothing to do: pass --backup or --restore");
    }

    if cli.stats {
        println!("{}", store.count()?);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("[shellrack] error: {e:#}");
            1
        }
    };
    std::process::exit(exit_code);
}
