//! Error types for manifest operations.

use std::path::PathBuf;

/// Errors that can occur while loading or saving a manifest.
///
/// Every variant is fatal for the pair that owns the manifest: the pair is
/// skipped and its target directory and manifest file are left as they were.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// An I/O error occurred while reading or writing the manifest file.
    #[error("manifest I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is a JSON cache written by the first generation of pathsync.
    #[error("{path} is a legacy JSON cache; convert it with `pathsync-upgrade {path}`")]
    LegacyFormat { path: PathBuf },

    /// The file could not be decoded as a manifest.
    #[error("failed to decode manifest {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The manifest could not be encoded.
    #[error("failed to encode manifest: {reason}")]
    Encode { reason: String },

    /// The stored format version is not the one this build understands.
    #[error(
        "manifest {path} has format version {found}, expected {expected}; `pathsync-upgrade` only converts legacy JSON caches, \
         otherwise delete the file and run with --rescan"
    )]
    VersionMismatch {
        path: PathBuf,
        /// Version this build reads and writes.
        expected: i32,
        /// Version found in the file.
        found: i32,
    },
}
