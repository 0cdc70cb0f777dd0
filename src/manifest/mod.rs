//! Versioned per-pair cache of file fingerprints and modification times.
//!
//! The manifest is bincode-encoded (standard config). The format version is the
//! first field of the encoding, so it is decoded and checked on its own before the
//! rest of the payload is trusted. Entries live in a `BTreeMap`, which keeps the
//! encoding deterministic: an unchanged tree always produces identical bytes.

mod error;
pub mod legacy;

pub use error::ManifestError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Manifest format version read and written by this build.
///
/// Version 1 was the JSON cache; see [`legacy`].
pub const MANIFEST_VERSION: i32 = 2;

/// Last-known state of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Hex MD5 of the file contents
    pub hash: String,

    /// Modification time in whole seconds since the Unix epoch
    pub modified: i64,
}

/// The persisted cache for one pair, keyed by forward-slash path relative to the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: i32,
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Creates an empty manifest at the current version.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, ManifestEntry>) -> Self {
        Manifest {
            version: MANIFEST_VERSION,
            entries,
        }
    }

    /// Loads the manifest at `path`.
    ///
    /// A missing file yields an empty manifest at [`MANIFEST_VERSION`]. Anything
    /// else that cannot be read, is a legacy JSON cache, carries another version,
    /// or fails to decode is an error.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No manifest at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(ManifestError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        Self::decode(&bytes, path)
    }

    /// Decodes manifest bytes; `path` is only used for error messages.
    pub fn decode(bytes: &[u8], path: &Path) -> Result<Self, ManifestError> {
        if legacy::is_legacy_json(bytes) {
            return Err(ManifestError::LegacyFormat {
                path: path.to_path_buf(),
            });
        }

        let config = bincode::config::standard();
        let decode_err = |e: bincode::error::DecodeError| ManifestError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let (version, consumed): (i32, usize) =
            bincode::serde::decode_from_slice(bytes, config).map_err(decode_err)?;
        check_version(version, path)?;

        let payload = &bytes[consumed..];
        let (entries, read): (BTreeMap<String, ManifestEntry>, usize) =
            bincode::serde::decode_from_slice(payload, config).map_err(decode_err)?;
        if read != payload.len() {
            return Err(ManifestError::Decode {
                path: path.to_path_buf(),
                reason: format!("{} unexpected trailing byte(s)", payload.len() - read),
            });
        }

        Ok(Manifest { version, entries })
    }

    pub fn encode(&self) -> Result<Vec<u8>, ManifestError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            ManifestError::Encode {
                reason: e.to_string(),
            }
        })
    }

    /// Writes the manifest to `path`, replacing any existing file.
    ///
    /// The bytes go to a hidden temporary sibling first and are renamed into
    /// place, so an interrupted write never leaves a truncated manifest behind.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let io_err = |path: &Path, e: std::io::Error| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let bytes = self.encode()?;
        let temp_path = temp_sibling(path);

        fs::write(&temp_path, &bytes).map_err(|e| io_err(&temp_path, e))?;

        if let Err(e) = fs::rename(&temp_path, path) {
            fs::remove_file(&temp_path).ok();
            return Err(io_err(path, e));
        }

        Ok(())
    }

    /// Fails unless this manifest is at [`MANIFEST_VERSION`].
    pub fn check_version(&self, path: &Path) -> Result<(), ManifestError> {
        check_version(self.version, path)
    }

    pub fn get(&self, relative_path: &str) -> Option<&ManifestEntry> {
        self.entries.get(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn check_version(found: i32, path: &Path) -> Result<(), ManifestError> {
    if found != MANIFEST_VERSION {
        return Err(ManifestError::VersionMismatch {
            path: path.to_path_buf(),
            expected: MANIFEST_VERSION,
            found,
        });
    }
    Ok(())
}

/// `.<name>.<pid>.tmp` next to `path`
fn temp_sibling(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Manifest {
        let mut entries = BTreeMap::new();
        entries.insert(
            "a.txt".to_string(),
            ManifestEntry {
                hash: "5d41402abc4b2a76b9719d911017c592".to_string(),
                modified: 1_700_000_000,
            },
        );
        entries.insert(
            "sub/b.txt".to_string(),
            ManifestEntry {
                hash: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
                modified: -5,
            },
        );
        Manifest::from_entries(entries)
    }

    #[test]
    fn test_missing_file_is_empty_current_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::load(&dir.path().join("cache")).unwrap();
        assert_eq!(manifest.version, MANIFEST_VERSION);
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache");

        sample().save(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();

        assert_eq!(loaded, sample());
        assert_eq!(loaded.get("sub/b.txt").unwrap().modified, -5);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache");
        sample().save(&path).unwrap();
        sample().save(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["cache".to_string()]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let first = sample().encode().unwrap();

        // Insert in the opposite order; the map must not care
        let mut entries = BTreeMap::new();
        for (k, v) in sample().entries.into_iter().rev() {
            entries.insert(k, v);
        }
        let second = Manifest::from_entries(entries).encode().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_older_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache");
        let mut old = sample();
        old.version = 1;
        fs::write(&path, old.encode().unwrap()).unwrap();

        match Manifest::load(&path) {
            Err(ManifestError::VersionMismatch { expected, found, .. }) => {
                assert_eq!(expected, MANIFEST_VERSION);
                assert_eq!(found, 1);
            }
            other => panic!("expected version mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let mut newer = sample();
        newer.version = MANIFEST_VERSION + 1;
        let bytes = newer.encode().unwrap();

        assert!(matches!(
            Manifest::decode(&bytes, Path::new("cache")),
            Err(ManifestError::VersionMismatch { found, .. }) if found == MANIFEST_VERSION + 1
        ));
    }

    #[test]
    fn test_corrupt_payload_is_surfaced() {
        let mut bytes = sample().encode().unwrap();
        bytes.truncate(bytes.len() - 3);

        assert!(matches!(
            Manifest::decode(&bytes, Path::new("cache")),
            Err(ManifestError::Decode { .. })
        ));
        assert!(matches!(
            Manifest::decode(&[], Path::new("cache")),
            Err(ManifestError::Decode { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = sample().encode().unwrap();
        bytes.extend_from_slice(&sample().encode().unwrap());

        match Manifest::decode(&bytes, Path::new("cache")) {
            Err(ManifestError::Decode { reason, .. }) => assert!(reason.contains("trailing")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_foreign_binary_cache_is_not_sent_to_the_json_upgrader() {
        // Leading field tag 1, value 2: reads back as version 4
        let err = Manifest::decode(&[0x08, 0x02, 0x12, 0x00], Path::new("cache")).unwrap_err();

        assert!(matches!(err, ManifestError::VersionMismatch { found: 4, .. }));
        let message = err.to_string();
        assert!(message.contains("only converts legacy JSON caches"));
        assert!(message.contains("--rescan"));
    }

    #[test]
    fn test_legacy_json_is_recognized() {
        let err = Manifest::decode(br#"{"/a.txt": ["abc", "1.0"]}"#, Path::new("cache"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::LegacyFormat { .. }));
        assert!(err.to_string().contains("pathsync-upgrade"));
    }

    #[test]
    fn test_check_version_on_in_memory_manifest() {
        let mut manifest = Manifest::new();
        assert!(manifest.check_version(Path::new("cache")).is_ok());
        manifest.version = 0;
        assert!(manifest.check_version(Path::new("cache")).is_err());
    }
}
