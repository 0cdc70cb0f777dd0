// Module declarations
mod confirm;
mod options;
mod prune;
mod reconcile;

// Re-export public types and functions
pub use confirm::{is_interactive, Confirmer, TerminalPrompt};
pub use options::{ResponseMode, SyncOptions};
pub use reconcile::reconcile_pair;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use crate::config::{SyncPair, Syncfile};
use crate::report::SyncReport;

/// How one pair ended.
#[derive(Debug)]
pub struct PairOutcome {
    pub source: PathBuf,
    pub target: PathBuf,
    pub result: Result<SyncReport>,
}

/// Everything a run did, pair by pair, in syncfile order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<PairOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Counters summed over every pair that completed
    pub fn totals(&self) -> SyncReport {
        let mut totals = SyncReport::default();
        for report in self.outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
            totals += report;
        }
        totals
    }
}

/// Sync every pair of `syncfile`, one after the other.
///
/// All sources are validated before any target is touched. After that, pairs
/// are independent: a pair that fails (bad manifest, unwritable target, ...) is
/// reported and the next one still runs. The run only fails as a whole when
/// every pair failed.
pub fn run_all(
    syncfile: &Syncfile,
    options: &SyncOptions,
    confirmer: &mut dyn Confirmer,
) -> Result<RunSummary> {
    syncfile.validate_sources()?;

    let mut summary = RunSummary::default();

    for pair in &syncfile.pairs {
        if options.verbosity.shows_summaries() {
            println!(
                "{} {} -> {}",
                "Syncing".cyan().bold(),
                pair.source.display(),
                pair.target.display()
            );
        }

        let result = sync_pair(pair, &syncfile.ignore, options, confirmer);

        match &result {
            Ok(report) => report.display(&pair.source, &pair.target, options.verbosity),
            Err(e) => log::error!(
                "Error occurred syncing {}: {:#}",
                pair.source.display(),
                e
            ),
        }

        summary.outcomes.push(PairOutcome {
            source: pair.source.clone(),
            target: pair.target.clone(),
            result,
        });
    }

    if !summary.outcomes.is_empty() && summary.succeeded() == 0 {
        return Err(anyhow!(
            "All {} pair(s) failed; see the errors above",
            summary.outcomes.len()
        ));
    }

    if options.verbosity.shows_summaries() {
        if summary.failed() > 0 {
            println!(
                "{} {} of {} pair(s) failed",
                "Done with errors:".yellow().bold(),
                summary.failed(),
                summary.outcomes.len()
            );
        } else {
            println!("{}", "Done!".green().bold());
        }
    }

    Ok(summary)
}

/// Make sure the target root exists, then reconcile.
fn sync_pair(
    pair: &SyncPair,
    global_ignores: &[String],
    options: &SyncOptions,
    confirmer: &mut dyn Confirmer,
) -> Result<SyncReport> {
    if !pair.target.is_dir() {
        log::debug!("Creating target {}", pair.target.display());
        fs::create_dir_all(&pair.target)
            .with_context(|| format!("Error creating directory {}", pair.target.display()))?;
    }

    reconcile_pair(pair, global_ignores, options, confirmer)
}
