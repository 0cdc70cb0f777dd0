use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest inside a target directory when a pair has no `cache` override.
pub const DEFAULT_MANIFEST_NAME: &str = "cache";

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the main configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/pathsync or ~/.config/pathsync
    /// - macOS: ~/Library/Application Support/pathsync
    /// - Windows: %APPDATA%\pathsync
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("pathsync"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("pathsync"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join("Library").join("Application Support").join("pathsync"))
        }

        #[cfg(target_os = "windows")]
        {
            Ok(dirs::config_dir()
                .context("Failed to get Windows config directory")?
                .join("pathsync"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".pathsync"))
        }
    }

    /// Syncfile used when none is given on the command line
    pub fn default_syncfile_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("syncfile.yaml"))
    }
}

/// One source → target unit of synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPair {
    /// Directory whose contents are mirrored
    #[serde(rename = "src")]
    pub source: PathBuf,

    /// Directory receiving the copies
    pub target: PathBuf,

    /// Manifest location override; defaults to `<target>/cache`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<PathBuf>,

    /// Regexes applied to this pair's relative file paths, seen with a leading `/`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

impl SyncPair {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        SyncPair {
            source: source.into(),
            target: target.into(),
            cache: None,
            ignore: Vec::new(),
        }
    }

    /// Where this pair's manifest lives.
    pub fn manifest_path(&self) -> PathBuf {
        self.cache
            .clone()
            .unwrap_or_else(|| self.target.join(DEFAULT_MANIFEST_NAME))
    }
}

/// Top-level contents of a syncfile.
///
/// ```yaml
/// pairs:
///   - src: /home/me/photos
///     target: /mnt/backup/photos
///     ignore: ['\.tmp$']
/// ignore: ['/\.git/']
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syncfile {
    #[serde(default)]
    pub pairs: Vec<SyncPair>,

    /// Regexes applied to every pair, matched like [`SyncPair::ignore`]
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Syncfile {
    /// Load a syncfile from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!(
                "Syncfile {} either does not exist or is a directory",
                path.display()
            );
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read syncfile: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse syncfile: {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let syncfile: Syncfile = serde_yaml::from_str(content)?;
        Ok(syncfile)
    }

    /// Check that every pair's source directory exists.
    ///
    /// All missing sources are reported before failing, so a single run
    /// surfaces every problem in the syncfile.
    pub fn validate_sources(&self) -> Result<()> {
        let missing: Vec<&Path> = self
            .pairs
            .iter()
            .map(|pair| pair.source.as_path())
            .filter(|source| !source.is_dir())
            .collect();

        for source in &missing {
            log::error!("Specified source {} does not exist", source.display());
        }

        if !missing.is_empty() {
            bail!(
                "{} source director{} missing; nothing was synced",
                missing.len(),
                if missing.len() == 1 { "y is" } else { "ies are" }
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_syncfile() {
        let yaml = r#"
pairs:
  - src: /data/photos
    target: /backup/photos
    cache: /backup/photos.cache
    ignore: ['\.tmp$']
  - src: /data/docs
    target: /backup/docs
ignore: ['/\.git/']
"#;
        let syncfile = Syncfile::from_yaml_str(yaml).unwrap();

        assert_eq!(syncfile.pairs.len(), 2);
        assert_eq!(syncfile.ignore, vec![r"/\.git/".to_string()]);

        let photos = &syncfile.pairs[0];
        assert_eq!(photos.source, PathBuf::from("/data/photos"));
        assert_eq!(photos.manifest_path(), PathBuf::from("/backup/photos.cache"));
        assert_eq!(photos.ignore, vec![r"\.tmp$".to_string()]);

        let docs = &syncfile.pairs[1];
        assert_eq!(docs.manifest_path(), PathBuf::from("/backup/docs/cache"));
        assert!(docs.ignore.is_empty());
    }

    #[test]
    fn test_empty_syncfile_has_no_pairs() {
        let syncfile = Syncfile::from_yaml_str("  \n").unwrap();
        assert!(syncfile.pairs.is_empty());
        assert!(syncfile.ignore.is_empty());
    }

    #[test]
    fn test_malformed_syncfile_is_rejected() {
        assert!(Syncfile::from_yaml_str("pairs: [ {src: 1").is_err());
        assert!(Syncfile::from_yaml_str("pairs:\n  - target: /only/target\n").is_err());
    }

    #[test]
    fn test_load_rejects_directory() {
        let temp = TempDir::new().unwrap();
        let err = Syncfile::load(temp.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist or is a directory"));
    }

    #[test]
    fn test_validate_sources_reports_missing() {
        let temp = TempDir::new().unwrap();
        let present = temp.path().join("present");
        fs::create_dir(&present).unwrap();

        let mut syncfile = Syncfile::default();
        syncfile.pairs.push(SyncPair::new(&present, temp.path().join("t1")));
        assert!(syncfile.validate_sources().is_ok());

        syncfile
            .pairs
            .push(SyncPair::new(temp.path().join("absent"), temp.path().join("t2")));
        let err = syncfile.validate_sources().unwrap_err();
        assert!(err.to_string().contains("1 source directory is missing"));
    }

    #[test]
    #[serial]
    #[cfg(target_os = "linux")]
    fn test_xdg_config_home_respected() {
        std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-xdg-config");
        let syncfile = ConfigManager::default_syncfile_path().unwrap();
        assert_eq!(
            syncfile,
            PathBuf::from("/tmp/test-xdg-config/pathsync/syncfile.yaml")
        );
        std::env::remove_var("XDG_CONFIG_HOME");
    }
}
