use crate::VerbosityLevel;

/// What to do when a changed file is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Copy every changed file without asking (`-y`, or `-s` alone)
    YesToAll,
    /// Never copy (`-n`); useful for dry runs
    NoToAll,
    /// Ask once per changed file
    #[default]
    Prompt,
}

impl ResponseMode {
    /// Resolve the `-y`/`-n`/`-s` flags.
    ///
    /// Silent mode cannot prompt, so it answers yes unless `-n` was given.
    pub fn from_flags(yes: bool, no: bool, silent: bool) -> Self {
        match (yes, no) {
            (true, _) => ResponseMode::YesToAll,
            (false, true) => ResponseMode::NoToAll,
            (false, false) if silent => ResponseMode::YesToAll,
            (false, false) => ResponseMode::Prompt,
        }
    }
}

/// Runtime switches for one invocation, shared by every pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    pub response: ResponseMode,

    /// Remove target files whose source disappeared
    pub delete_orphans: bool,

    /// Walk the whole source tree instead of only the files already in the manifest.
    ///
    /// Without it no new file is ever discovered.
    pub rescan: bool,

    pub verbosity: VerbosityLevel,
}
