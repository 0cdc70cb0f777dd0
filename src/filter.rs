use regex::Regex;

/// Compiled ignore rules for one pair: the pair's own patterns plus the global ones.
///
/// Patterns see the relative path with a leading slash (`/.git/config`), so
/// `'/\.git/'` and `'^/build/'` catch top-level entries. A path is ignored when
/// any pattern matches anywhere inside it (`Regex::is_match`, no implicit
/// anchoring). Patterns that fail to compile are reported once and then never match.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Regex>,
}

impl IgnoreFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|pattern| {
                let pattern = pattern.as_ref();
                match Regex::new(pattern) {
                    Ok(regex) => Some(regex),
                    Err(e) => {
                        log::warn!("Ignoring invalid ignore pattern {pattern:?}: {e}");
                        None
                    }
                }
            })
            .collect();

        IgnoreFilter { patterns }
    }

    /// Union of the global list and a pair's own list.
    pub fn for_pair(global: &[String], pair: &[String]) -> Self {
        Self::new(global.iter().chain(pair.iter()))
    }

    /// Check a forward-slash relative file path (a manifest key) against every rule
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let rooted = rooted_path(relative_path);
        match self.patterns.iter().find(|regex| regex.is_match(&rooted)) {
            Some(regex) => {
                log::trace!("Regex matched: {} Skipping {}", regex.as_str(), relative_path);
                true
            }
            None => false,
        }
    }

    /// Number of usable (compiled) patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn rooted_path(relative_path: &str) -> String {
    format!("/{}", relative_path.trim_start_matches('/'))
}

/// One-shot form of [`IgnoreFilter::is_ignored`].
pub fn should_ignore(relative_path: &str, patterns: &[String]) -> bool {
    IgnoreFilter::new(patterns).is_ignored(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("build/out.o", &[r"\.o$"], true)]
    #[case("src/main.rs", &[r"\.o$"], false)]
    #[case("a/node_modules/x.js", &["node_modules"], true)]
    #[case(".git/config", &[r"/\.git/"], true)]
    #[case("vendor/lib/.git/HEAD", &[r"/\.git/"], true)]
    #[case("docs/.gitignore", &[r"/\.git/"], false)]
    #[case("build/out.o", &["^/build/"], true)]
    #[case("src/build/out.o", &["^/build/"], false)]
    #[case("Thumbs.db", &[r"^/Thumbs\.db$"], true)]
    #[case("notes.txt", &[], false)]
    fn test_unanchored_matching(
        #[case] path: &str,
        #[case] rules: &[&str],
        #[case] expected: bool,
    ) {
        assert_eq!(should_ignore(path, &patterns(rules)), expected);
    }

    #[test]
    fn test_invalid_pattern_fails_open() {
        let filter = IgnoreFilter::new(["(unclosed", r"\.log$"]);
        assert_eq!(filter.len(), 1);
        assert!(!filter.is_ignored("(unclosed"));
        assert!(filter.is_ignored("server.log"));
    }

    #[test]
    fn test_pair_and_global_rules_are_unioned() {
        let global = patterns(&[r"\.tmp$"]);
        let pair = patterns(&["^/cache/"]);
        let filter = IgnoreFilter::for_pair(&global, &pair);

        assert!(filter.is_ignored("x.tmp"));
        assert!(filter.is_ignored("cache/blob"));
        assert!(!filter.is_ignored("keep/cache/blob"));
        assert!(!filter.is_ignored("keep.txt"));
    }

    #[test]
    fn test_empty_filter_ignores_nothing() {
        let filter = IgnoreFilter::default();
        assert!(filter.is_empty());
        assert!(!filter.is_ignored("anything"));
    }
}
