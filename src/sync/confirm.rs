use anyhow::{Context, Result};
use inquire::Confirm;

/// Asks whether a changed file should be copied.
///
/// Only consulted in [`ResponseMode::Prompt`](super::ResponseMode::Prompt).
/// Closures `FnMut(&str) -> bool` implement it, which is how tests answer
/// without a terminal.
pub trait Confirmer {
    fn confirm_copy(&mut self, relative_path: &str) -> Result<bool>;
}

impl<F> Confirmer for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm_copy(&mut self, relative_path: &str) -> Result<bool> {
        Ok(self(relative_path))
    }
}

/// Console prompt; a blank answer means yes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Confirmer for TerminalPrompt {
    fn confirm_copy(&mut self, relative_path: &str) -> Result<bool> {
        Confirm::new(&format!("Copy {relative_path}?"))
            .with_default(true)
            .prompt()
            .context("Failed to get confirmation")
    }
}

/// Check if we're running in an interactive terminal
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_confirmer_sees_each_path() {
        let mut asked = Vec::new();
        let mut confirmer = |path: &str| {
            asked.push(path.to_string());
            path.ends_with(".txt")
        };

        assert!(confirmer.confirm_copy("a.txt").unwrap());
        assert!(!confirmer.confirm_copy("b.bin").unwrap());
        drop(confirmer);

        assert_eq!(asked, vec!["a.txt".to_string(), "b.bin".to_string()]);
    }
}
