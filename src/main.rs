use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use pathsync::config::{ConfigManager, Syncfile};
use pathsync::logger;
use pathsync::sync::{self, ResponseMode, SyncOptions, TerminalPrompt};
use pathsync::VerbosityLevel;

#[derive(Parser)]
#[command(name = "pathsync")]
#[command(about = "Simplistic one-way file syncing utility", long_about = None)]
#[command(version)]
struct Cli {
    /// Syncfile with all src:target pairs (default: <config dir>/pathsync/syncfile.yaml)
    syncfile: Option<PathBuf>,

    /// Silent mode; answers yes to every prompt unless --no is given
    #[arg(short, long)]
    silent: bool,

    /// Answer all prompts with yes
    #[arg(short = 'y', long = "yes", conflicts_with = "no_to_all")]
    yes_to_all: bool,

    /// Answer all prompts with no
    #[arg(short = 'n', long = "no")]
    no_to_all: bool,

    /// Delete files from target whose source no longer exists
    #[arg(short, long)]
    delete: bool,

    /// Rescan the full src directory; without it only cached files are checked
    #[arg(short, long)]
    rescan: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = VerbosityLevel::from_flags(cli.silent, cli.verbose);
    logger::init_logger(verbosity);

    let options = SyncOptions {
        response: ResponseMode::from_flags(cli.yes_to_all, cli.no_to_all, cli.silent),
        delete_orphans: cli.delete,
        rescan: cli.rescan,
        verbosity,
    };

    if options.response == ResponseMode::Prompt && !sync::is_interactive() {
        bail!("Not running in a terminal; pass --yes or --no to answer copy prompts");
    }

    let syncfile_path = match cli.syncfile {
        Some(path) => path,
        None => ConfigManager::default_syncfile_path()?,
    };
    let syncfile = Syncfile::load(&syncfile_path)?;

    sync::run_all(&syncfile, &options, &mut TerminalPrompt)?;

    Ok(())
}
