//! # pathsync
//!
//! A one-way directory synchronizer. For every configured (source, target) pair it copies
//! only the files that changed since the last run, tracked by a per-pair manifest of
//! content hash and modification time.
//!
//! ## Overview
//!
//! Each pair owns a manifest (by default `<target>/cache`). A run either walks the whole
//! source tree (`--rescan`) or just re-checks the files already in the manifest, which is
//! the cheap default and never discovers new files. A file whose modification time matches
//! its manifest entry is skipped without being read; otherwise it is hashed and copied if
//! the hash differs. With `--delete`, target files whose source disappeared are removed.
//!
//! ## Architecture
//!
//! - Configuration ([`config`]) and ignore rules ([`filter`])
//! - Content fingerprints ([`hasher`]) and the versioned manifest ([`manifest`])
//! - Reconciliation and orchestration ([`sync`]) with per-pair counters ([`report`])
//! - Console logging ([`logger`])

/// Syncfile loading and the platform configuration directory.
pub mod config;

/// Regex ignore rules, applied to forward-slash paths relative to a pair's source.
pub mod filter;

/// MD5 fingerprints of file contents.
pub mod hasher;

/// Logging configuration and verbosity levels.
///
/// Sets up `env_logger` on the console. The level follows the `-v`/`-s` flags unless
/// `RUST_LOG` is set.
pub mod logger;

pub mod manifest;

/// Per-pair counters and the human-readable summary printed after each pair.
pub mod report;

/// Core synchronization logic.
///
/// - **Reconcile**: decide, per file, between fast-path skip, manifest refresh and copy
/// - **Prune**: remove target files whose source is gone
/// - **Run**: validate every source, then reconcile each pair in order
pub mod sync;

pub use logger::VerbosityLevel;
