//! Per-pair reconciliation: decide for every candidate file whether it must be
//! copied, build the new manifest, prune orphans and write the manifest back.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs::{self, Metadata};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::config::SyncPair;
use crate::filter::IgnoreFilter;
use crate::hasher::fingerprint_file;
use crate::manifest::{Manifest, ManifestEntry};
use crate::report::SyncReport;

use super::confirm::Confirmer;
use super::options::{ResponseMode, SyncOptions};
use super::prune::prune_orphans;

/// Reconcile one pair.
///
/// Loads the pair's manifest (a version mismatch or undecodable file stops here,
/// before anything under the target is touched), scans the source, copies what
/// changed, prunes orphans when asked to, and replaces the manifest on disk.
pub fn reconcile_pair(
    pair: &SyncPair,
    global_ignores: &[String],
    options: &SyncOptions,
    confirmer: &mut dyn Confirmer,
) -> Result<SyncReport> {
    let manifest_path = pair.manifest_path();
    log::debug!("Reading cache file: {}", manifest_path.display());

    let old = Manifest::load(&manifest_path)?;
    old.check_version(&manifest_path)?;
    log::trace!("Cached entries: {}", old.len());

    let filter = IgnoreFilter::for_pair(global_ignores, &pair.ignore);
    log::trace!("Ignoring {} pattern(s)", filter.len());

    let mut reconciler = Reconciler {
        pair,
        filter,
        options,
        confirmer,
        old: &old,
        entries: BTreeMap::new(),
        report: SyncReport::default(),
    };

    if options.rescan {
        log::debug!("Rescanning {}, this may take a while...", pair.source.display());
        reconciler.scan_tree()?;
    } else {
        reconciler.scan_cached()?;
    }

    let Reconciler {
        entries,
        mut report,
        ..
    } = reconciler;

    report.orphans = old
        .entries
        .keys()
        .filter(|key| !entries.contains_key(*key))
        .cloned()
        .collect();

    if options.delete_orphans && !report.orphans.is_empty() {
        report.pruned = prune_orphans(&pair.target, &report.orphans);
    }

    log::debug!("Writing {} entries to {}", entries.len(), manifest_path.display());
    Manifest::from_entries(entries)
        .save(&manifest_path)
        .context("Copies were made but the manifest could not be written")?;

    Ok(report)
}

struct Reconciler<'a> {
    pair: &'a SyncPair,
    filter: IgnoreFilter,
    options: &'a SyncOptions,
    confirmer: &'a mut dyn Confirmer,
    /// Read-only for the whole run
    old: &'a Manifest,
    /// The manifest being built
    entries: BTreeMap<String, ManifestEntry>,
    report: SyncReport,
}

impl Reconciler<'_> {
    /// Full rescan: pre-order walk, so every directory exists on the target
    /// before its children are copied into it. Any walk, stat or mkdir error
    /// aborts the pair.
    fn scan_tree(&mut self) -> Result<()> {
        let source = self.pair.source.clone();

        for entry in WalkDir::new(&source).follow_links(false) {
            let entry =
                entry.with_context(|| format!("Error occurred syncing {}", source.display()))?;
            let relative = relative_key(&source, entry.path())?;

            if entry.file_type().is_dir() {
                self.ensure_target_dir(&relative)?;
                continue;
            }

            self.report.scanned += 1;
            if self.filter.is_ignored(&relative) {
                self.report.ignored += 1;
                continue;
            }

            let metadata = fs::metadata(entry.path())
                .with_context(|| format!("Failed to stat {}", entry.path().display()))?;
            if metadata.is_dir() {
                log::debug!("Not following directory link {}", entry.path().display());
                continue;
            }

            self.visit_file(&relative, entry.path(), &metadata)?;
        }

        Ok(())
    }

    /// Cache-driven scan: only paths already in the manifest. A path that can
    /// no longer be stat'ed is logged and dropped from the new manifest.
    fn scan_cached(&mut self) -> Result<()> {
        let old = self.old;
        if old.is_empty() {
            log::debug!(
                "Nothing cached for {}; run with --rescan to discover files",
                self.pair.source.display()
            );
        }

        for relative in old.entries.keys() {
            self.report.scanned += 1;

            if !is_safe_key(relative) {
                log::warn!("Skipping unsafe manifest entry {relative:?}");
                self.report.failed += 1;
                continue;
            }

            if self.filter.is_ignored(relative) {
                self.report.ignored += 1;
                continue;
            }

            log::trace!("Checking {relative}");
            let source_path = join_relative(&self.pair.source, relative);

            let metadata = match fs::metadata(&source_path) {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => {
                    log::warn!("{} is no longer a file, skipping", source_path.display());
                    self.report.missing += 1;
                    continue;
                }
                Err(e) => {
                    if e.kind() == ErrorKind::NotFound {
                        log::debug!(
                            "{} does not exist, skipping and removing from cache",
                            source_path.display()
                        );
                    } else {
                        log::warn!("Failed to stat {}: {}", source_path.display(), e);
                    }
                    self.report.missing += 1;
                    continue;
                }
            };

            self.visit_file(relative, &source_path, &metadata)?;
        }

        Ok(())
    }

    /// The per-file decision. Hashing and copy failures are logged and counted;
    /// only a failed prompt or an unreadable mtime is returned as an error.
    /// A file whose copy would land on the pair's own manifest is never copied
    /// or recorded.
    fn visit_file(&mut self, relative: &str, source_path: &Path, metadata: &Metadata) -> Result<()> {
        let target_path = join_relative(&self.pair.target, relative);
        if target_path == self.pair.manifest_path() {
            log::error!(
                "{} would overwrite the cache file {}; move the cache with `cache:` to back it up",
                source_path.display(),
                target_path.display()
            );
            self.report.failed += 1;
            return Ok(());
        }

        let modified = unix_mtime(metadata)
            .with_context(|| format!("Failed to read mtime of {}", source_path.display()))?;
        let old = self.old;
        let previous = old.get(relative);

        // Fast path: the timestamp is authoritative
        if let Some(previous) = previous {
            if previous.modified == modified {
                log::trace!("ModTimes match. skipping {relative}");
                self.entries.insert(relative.to_string(), previous.clone());
                self.report.unchanged += 1;
                return Ok(());
            }
        }

        log::trace!("Different mtime or new file - hashing {}", source_path.display());
        let hash = match fingerprint_file(source_path) {
            Ok(hash) => hash,
            Err(e) => {
                log::error!("{e:#}");
                self.carry_forward(relative);
                self.report.failed += 1;
                return Ok(());
            }
        };
        self.report.hashed += 1;

        let entry = ManifestEntry { hash, modified };

        if previous.is_some_and(|previous| previous.hash == entry.hash) {
            log::trace!("Timestamps differ but hashes are identical. Refreshing {relative}");
            self.entries.insert(relative.to_string(), entry);
            self.report.refreshed += 1;
            return Ok(());
        }

        if !self.should_copy(relative)? {
            log::debug!("Not copying {relative}");
            self.carry_forward(relative);
            self.report.declined += 1;
            return Ok(());
        }

        log::debug!(
            "Copying {} -> {}",
            source_path.display(),
            target_path.display()
        );
        match copy_file(source_path, &target_path) {
            Ok(()) => {
                self.entries.insert(relative.to_string(), entry);
                self.report.copied += 1;
            }
            Err(e) => {
                log::error!("{e:#}");
                self.carry_forward(relative);
                self.report.failed += 1;
            }
        }

        Ok(())
    }

    fn should_copy(&mut self, relative: &str) -> Result<bool> {
        match self.options.response {
            ResponseMode::YesToAll => Ok(true),
            ResponseMode::NoToAll => Ok(false),
            ResponseMode::Prompt => self.confirmer.confirm_copy(relative),
        }
    }

    /// Keep the previous entry, if any, so an uncopied change is seen again next run
    /// and its target file is not mistaken for an orphan.
    fn carry_forward(&mut self, relative: &str) {
        let old = self.old;
        if let Some(previous) = old.get(relative) {
            self.entries.insert(relative.to_string(), previous.clone());
        }
    }

    fn ensure_target_dir(&mut self, relative: &str) -> Result<()> {
        let dir = join_relative(&self.pair.target, relative);

        match fs::metadata(&dir) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => bail!("{} exists and is not a directory", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("Creating directory {}", dir.display());
                fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory {}", dir.display()))?;
                self.report.dirs_created += 1;
                Ok(())
            }
            Err(e) => {
                Err(e).with_context(|| format!("Failed to stat directory {}", dir.display()))
            }
        }
    }
}

/// Whole-file copy into the mirrored location, creating the parent directory when needed.
fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    fs::copy(source, target).with_context(|| {
        format!(
            "Failed to copy {} -> {}",
            source.display(),
            target.display()
        )
    })?;

    Ok(())
}

/// Forward-slash path of `path` relative to `root`; empty for `root` itself.
pub(crate) fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).with_context(|| {
        format!("{} is not inside {}", path.display(), root.display())
    })?;

    let parts: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();

    Ok(parts.join("/"))
}

/// `root` joined with each segment of a forward-slash relative key.
pub(crate) fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Manifest keys must stay inside the pair's directories.
pub(crate) fn is_safe_key(relative: &str) -> bool {
    !relative.is_empty()
        && Path::new(relative)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

/// Modification time in whole seconds since the epoch, rounded down.
pub(crate) fn unix_mtime(metadata: &Metadata) -> std::io::Result<i64> {
    let modified = metadata.modified()?;

    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_secs() as i64,
        Err(e) => {
            let before = e.duration();
            -(before.as_secs() as i64) - i64::from(before.subsec_nanos() > 0)
        }
    })
}
