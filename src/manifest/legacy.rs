//! Conversion of the original JSON cache into a current manifest.
//!
//! The JSON cache maps `"/relative/path"` to `["<md5>", "<float mtime>"]`. Some
//! files written by the cache-only scan of that era stored a bare hash string
//! instead of the pair; those entries get `modified = 0`, which makes the next
//! run re-hash them once without re-copying unchanged content.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Manifest, ManifestEntry};

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyValue {
    Pair(Vec<String>),
    Hash(String),
}

/// Result of [`upgrade_file`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// The file was converted; the original was kept at `backup`.
    Upgraded { backup: PathBuf, entries: usize },
    /// The file is not a JSON cache and was left untouched.
    NotLegacy,
}

/// Whether `bytes` look like a JSON cache rather than a binary manifest.
pub fn is_legacy_json(bytes: &[u8]) -> bool {
    bytes.first() == Some(&b'{')
}

/// Parse a JSON cache into a manifest at the current version.
pub fn convert_legacy_json(bytes: &[u8]) -> Result<Manifest> {
    let raw: HashMap<String, LegacyValue> =
        serde_json::from_slice(bytes).context("Failed to parse legacy JSON cache")?;

    let mut entries = BTreeMap::new();
    for (key, value) in raw {
        let entry = match value {
            LegacyValue::Pair(fields) => match fields.as_slice() {
                [hash, modified] => ManifestEntry {
                    hash: hash.clone(),
                    modified: parse_legacy_mtime(modified)
                        .with_context(|| format!("Invalid modification time for {key}"))?,
                },
                _ => bail!("Entry {key} has {} fields, expected 2", fields.len()),
            },
            LegacyValue::Hash(hash) => ManifestEntry { hash, modified: 0 },
        };

        let relative = key.trim_start_matches('/').to_string();
        log::trace!("Got file: {} {} {}", relative, entry.hash, entry.modified);
        entries.insert(relative, entry);
    }

    Ok(Manifest::from_entries(entries))
}

/// Float seconds, truncated toward zero
fn parse_legacy_mtime(value: &str) -> Result<i64> {
    let seconds: f64 = value.trim().parse()?;
    if !seconds.is_finite() {
        bail!("{value} is not a finite number");
    }
    Ok(seconds.trunc() as i64)
}

/// Upgrade the cache at `path` in place.
///
/// The original file is renamed to `<path>.1` before the new manifest is written
/// under the original name.
pub fn upgrade_file(path: &Path) -> Result<UpgradeOutcome> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read cache file {}", path.display()))?;

    if !is_legacy_json(&bytes) {
        return Ok(UpgradeOutcome::NotLegacy);
    }

    let manifest = convert_legacy_json(&bytes)
        .with_context(|| format!("Failed to convert {}", path.display()))?;

    let mut backup = OsString::from(path.as_os_str());
    backup.push(".1");
    let backup = PathBuf::from(backup);

    log::info!("Renaming {} to {}", path.display(), backup.display());
    fs::rename(path, &backup)
        .with_context(|| format!("Failed to move {} aside", path.display()))?;

    log::info!("Writing {}", path.display());
    manifest.save(path)?;

    Ok(UpgradeOutcome::Upgraded {
        backup,
        entries: manifest.len(),
    })
}
