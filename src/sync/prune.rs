use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::reconcile::{is_safe_key, join_relative};

/// Delete the target copies of orphaned manifest entries.
///
/// Best effort: failures are logged and never abort the run. After each
/// deletion the file's parent directory is removed when it became empty,
/// one level only, and never the target root itself. Returns how many files
/// were deleted.
pub(crate) fn prune_orphans(target_root: &Path, orphans: &[String]) -> usize {
    let mut pruned = 0;

    for relative in orphans {
        if !is_safe_key(relative) {
            log::warn!("Refusing to delete outside the target: {relative:?}");
            continue;
        }

        let orphan_path = join_relative(target_root, relative);

        log::debug!(
            "{} does not exist, deleting {}",
            relative,
            orphan_path.display()
        );

        match fs::remove_file(&orphan_path) {
            Ok(()) => pruned += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("{} was already gone", orphan_path.display());
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", orphan_path.display(), e);
                continue;
            }
        }

        if let Some(parent) = orphan_path.parent() {
            remove_dir_if_empty(target_root, parent);
        }
    }

    pruned
}

fn remove_dir_if_empty(target_root: &Path, dir: &Path) {
    if dir == target_root || !dir.starts_with(target_root) {
        return;
    }

    let is_empty = match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return,
    };

    if is_empty {
        log::debug!("Removing empty dir: {}", dir.display());
        if let Err(e) = fs::remove_dir(dir) {
            log::warn!("Failed to remove empty dir {}: {}", dir.display(), e);
        }
    }
}
