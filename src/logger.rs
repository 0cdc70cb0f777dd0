use log::LevelFilter;
use std::io::Write;

/// How much pathsync reports while it runs.
///
/// Verbosity only ever changes what gets printed or logged; it never changes
/// which files are copied, skipped or pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum VerbosityLevel {
    Quiet,   // Errors only, no summaries
    #[default]
    Normal,  // Per-pair summaries
    Verbose, // Every copy, deletion and directory creation
    Trace,   // Every per-file decision, including fast-path hits
}

impl VerbosityLevel {
    /// Derive the level from the command line flags.
    ///
    /// `silent` wins over any number of `-v` flags.
    pub fn from_flags(silent: bool, verbose_count: u8) -> Self {
        if silent {
            return VerbosityLevel::Quiet;
        }

        match verbose_count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            _ => VerbosityLevel::Trace,
        }
    }

    /// Log level used for the console when `RUST_LOG` is not set.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            VerbosityLevel::Quiet => LevelFilter::Error,
            VerbosityLevel::Normal => LevelFilter::Info,
            VerbosityLevel::Verbose => LevelFilter::Debug,
            VerbosityLevel::Trace => LevelFilter::Trace,
        }
    }

    /// Whether human-readable summaries should be printed.
    pub fn shows_summaries(self) -> bool {
        self != VerbosityLevel::Quiet
    }
}

/// Initialize the logging system
///
/// The console level follows the `-v`/`-s` flags, but the `RUST_LOG`
/// environment variable takes precedence when it is set:
/// - `RUST_LOG=error` - Only errors
/// - `RUST_LOG=warn` - Warnings and errors
/// - `RUST_LOG=info` - Info, warnings, and errors
/// - `RUST_LOG=debug` - Copies, deletions and directory creation
/// - `RUST_LOG=trace` - Everything, including fast-path hits
///
/// ## Examples
///
/// ```bash
/// # Show every per-file decision
/// RUST_LOG=trace pathsync ~/syncfile.yaml
///
/// # Only show errors on console
/// RUST_LOG=error pathsync -y ~/syncfile.yaml
/// ```
pub fn init_logger(verbosity: VerbosityLevel) {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| verbosity.level_filter());

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // Ignore error if logger is already initialized

    log::trace!("Logger initialized with level: {level:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_overrides_verbose_flags() {
        assert_eq!(VerbosityLevel::from_flags(true, 3), VerbosityLevel::Quiet);
        assert_eq!(VerbosityLevel::from_flags(false, 0), VerbosityLevel::Normal);
        assert_eq!(VerbosityLevel::from_flags(false, 1), VerbosityLevel::Verbose);
        assert_eq!(VerbosityLevel::from_flags(false, 2), VerbosityLevel::Trace);
        assert_eq!(VerbosityLevel::from_flags(false, 9), VerbosityLevel::Trace);
    }

    #[test]
    fn test_level_filters_are_monotonic() {
        assert!(VerbosityLevel::Quiet.level_filter() < VerbosityLevel::Normal.level_filter());
        assert!(VerbosityLevel::Normal.level_filter() < VerbosityLevel::Verbose.level_filter());
        assert!(VerbosityLevel::Verbose.level_filter() < VerbosityLevel::Trace.level_filter());
    }

    #[test]
    fn test_quiet_hides_summaries() {
        assert!(!VerbosityLevel::Quiet.shows_summaries());
        assert!(VerbosityLevel::Normal.shows_summaries());
        assert!(VerbosityLevel::Trace.shows_summaries());
    }

    #[test]
    fn test_init_logger_twice_does_not_panic() {
        init_logger(VerbosityLevel::Normal);
        init_logger(VerbosityLevel::Trace);
    }
}
