use colored::Colorize;
use std::ops::AddAssign;
use std::path::Path;

use crate::VerbosityLevel;

/// Counters collected while reconciling one pair.
///
/// Every file the reconciler looks at lands in exactly one of `unchanged`,
/// `refreshed`, `copied`, `declined`, `ignored`, `failed` or `missing`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files considered (walked in a rescan, or listed in the manifest)
    pub scanned: usize,

    /// Fast-path hits: modification time matched the manifest, nothing hashed
    pub unchanged: usize,

    /// Files whose contents were hashed
    pub hashed: usize,

    /// Changed files copied to the target
    pub copied: usize,

    /// Timestamp moved but hash identical; manifest refreshed, no copy
    pub refreshed: usize,

    /// Changed files not copied because of `--no` or a declined prompt
    pub declined: usize,

    /// Files matching an ignore pattern
    pub ignored: usize,

    /// Files that could not be hashed or copied
    pub failed: usize,

    /// Manifest entries whose source file could not be stat'ed (cache-driven scan only)
    pub missing: usize,

    /// Target files deleted because their source is gone
    pub pruned: usize,

    /// Directories created under the target
    pub dirs_created: usize,

    /// Keys present in the previous manifest but not in the new one
    pub orphans: Vec<String>,
}

impl SyncReport {
    /// Changed files detected, whether or not they were copied
    pub fn changed(&self) -> usize {
        self.copied + self.declined + self.failed
    }

    /// Print the per-pair summary
    pub fn display(&self, source: &Path, target: &Path, verbosity: VerbosityLevel) {
        if !verbosity.shows_summaries() {
            return;
        }

        println!(
            "  {} file(s) to update, {} copied    {} unchanged    {} refreshed",
            self.changed(),
            format!("{}", self.copied).green(),
            format!("{}", self.unchanged).dimmed(),
            format!("{}", self.refreshed).cyan(),
        );

        if self.declined > 0 {
            println!("  {} {} changed file(s) not copied", "Skipped:".yellow(), self.declined);
        }
        if self.failed > 0 {
            println!("  {} {} file(s) failed", "Errors:".red().bold(), self.failed);
        }
        if !self.orphans.is_empty() {
            if self.pruned > 0 {
                println!(
                    "  {} {} orphaned file(s) from {}",
                    "Deleted".red(),
                    self.pruned,
                    target.display()
                );
            } else {
                println!(
                    "  {} {} file(s) no longer in {} (use --delete to remove them from the target)",
                    "Note:".yellow(),
                    self.orphans.len(),
                    source.display()
                );
            }
        }

        if verbosity >= VerbosityLevel::Verbose {
            println!(
                "  {} scanned, {} hashed, {} ignored, {} missing, {} dir(s) created",
                self.scanned, self.hashed, self.ignored, self.missing, self.dirs_created
            );
        }
    }
}

impl AddAssign<&SyncReport> for SyncReport {
    fn add_assign(&mut self, other: &SyncReport) {
        self.scanned += other.scanned;
        self.unchanged += other.unchanged;
        self.hashed += other.hashed;
        self.copied += other.copied;
        self.refreshed += other.refreshed;
        self.declined += other.declined;
        self.ignored += other.ignored;
        self.failed += other.failed;
        self.missing += other.missing;
        self.pruned += other.pruned;
        self.dirs_created += other.dirs_created;
        self.orphans.extend(other.orphans.iter().cloned());
    }
}
