use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

use pathsync::logger;
use pathsync::manifest::legacy::{upgrade_file, UpgradeOutcome};
use pathsync::VerbosityLevel;

#[derive(Parser)]
#[command(name = "pathsync-upgrade")]
#[command(about = "Upgrades the specified cachefile to the newest available version", long_about = None)]
#[command(version)]
struct Cli {
    /// Path of cachefile to upgrade
    cachefile: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(VerbosityLevel::from_flags(false, cli.verbose));

    match upgrade_file(&cli.cachefile)? {
        UpgradeOutcome::Upgraded { backup, entries } => {
            println!(
                "{} {} ({} entries, original kept at {})",
                "Upgraded".green().bold(),
                cli.cachefile.display(),
                entries,
                backup.display()
            );
        }
        UpgradeOutcome::NotLegacy => {
            println!(
                "{} {} is not a legacy JSON cache; nothing to do",
                "Note:".yellow(),
                cli.cachefile.display()
            );
        }
    }

    Ok(())
}
