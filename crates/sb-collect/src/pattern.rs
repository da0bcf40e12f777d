//! Ant-style include/exclude pattern sets.
//!
//! Patterns are matched against `/`-separated paths relative to the
//! collection root:
//! - `*` and `?` never cross a `/`
//! - `**` spans any number of segments, including none (`**/*.xml` matches `build.xml`)
//! - a trailing `/` is shorthand for `/**`
//! - `\` is a path separator, as in Ant, not an escape character
//!
//! Pattern lists are accepted as a single string, split on commas and newlines.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{CollectError, Result};

/// Split a comma and/or newline separated pattern list.
///
/// Items are trimmed and empty items dropped, so `""`, `" , "` and `"\n"`
/// all produce an empty list.
pub fn split_patterns(raw: &str) -> Vec<String> {
    raw.split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize one pattern to the form handed to the glob compiler.
pub fn normalize_pattern(pattern: &str) -> String {
    let slashed = pattern.trim().replace('\\', "/");
    let mut rest = slashed.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    let mut normalized = rest.trim_start_matches('/').to_string();
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    normalized
}

/// A compiled, ordered set of glob patterns.
///
/// An empty set matches nothing; callers decide what "no patterns" means
/// (include everything, exclude nothing).
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl PatternSet {
    /// Compile a list of patterns.
    ///
    /// # Errors
    /// Returns `CollectError::InvalidPattern` for the first pattern that does
    /// not compile.
    pub fn compile<I, S>(patterns: I, case_sensitive: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| normalize_pattern(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();

        if patterns.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .case_insensitive(!case_sensitive)
                .backslash_escape(false)
                .build()
                .map_err(|e| CollectError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|e| CollectError::InvalidPattern {
            pattern: patterns.join(", "),
            reason: e.to_string(),
        })?;

        Ok(Self {
            patterns,
            set: Some(set),
        })
    }

    /// Compile a comma/newline separated pattern string.
    pub fn parse(raw: &str, case_sensitive: bool) -> Result<Self> {
        Self::compile(split_patterns(raw), case_sensitive)
    }

    /// True if any pattern matches the relative path.
    pub fn is_match(&self, relative_path: &str) -> bool {
        match &self.set {
            Some(set) => set.is_match(relative_path),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The normalized patterns, in the order given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_patterns() {
        assert_eq!(
            split_patterns("workflow*/**, */log"),
            vec!["workflow*/**".to_string(), "*/log".to_string()]
        );
        assert_eq!(
            split_patterns("a\nb,\r\nc"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_patterns("").is_empty());
        assert!(split_patterns(" , \n ").is_empty());
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("logs/"), "logs/**");
        assert_eq!(normalize_pattern("/build.xml"), "build.xml");
        assert_eq!(normalize_pattern("./a/b"), "a/b");
        assert_eq!(normalize_pattern("dir\\*.txt"), "dir/*.txt");
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = PatternSet::parse("", true).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_match("build.xml"));
    }

    #[test]
    fn test_star_stays_in_segment() {
        let set = PatternSet::parse("*/log", true).unwrap();
        assert!(set.is_match("a/log"));
        assert!(!set.is_match("log"));
        assert!(!set.is_match("a/b/log"));

        let set = PatternSet::parse("*.txt", true).unwrap();
        assert!(set.is_match("file.txt"));
        assert!(!set.is_match("dir/file.txt"));
    }

    #[test]
    fn test_double_star_spans_segments() {
        let set = PatternSet::parse("workflow*/**", true).unwrap();
        assert!(set.is_match("workflow/1.xml"));
        assert!(set.is_match("workflow-completed/a/b.xml"));
        assert!(!set.is_match("build.xml"));
        assert!(!set.is_match("log"));

        let set = PatternSet::parse("**/*.xml", true).unwrap();
        assert!(set.is_match("build.xml"));
        assert!(set.is_match("workflow/1.xml"));
        assert!(!set.is_match("log"));
    }

    #[test]
    fn test_trailing_slash_means_everything_below() {
        let set = PatternSet::parse("archive/", true).unwrap();
        assert!(set.is_match("archive/a.txt"));
        assert!(set.is_match("archive/x/y.txt"));
        assert!(!set.is_match("other/a.txt"));
    }

    #[test]
    fn test_case_sensitivity() {
        let sensitive = PatternSet::parse("**/*.XML", true).unwrap();
        assert!(!sensitive.is_match("build.xml"));

        let insensitive = PatternSet::parse("**/*.XML", false).unwrap();
        assert!(insensitive.is_match("build.xml"));
        assert!(insensitive.is_match("Workflow/1.Xml"));
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let err = PatternSet::parse("ok/**, [unclosed", true).unwrap_err();
        match err {
            CollectError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "[unclosed"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_patterns_keep_order() {
        let set = PatternSet::parse("b/**, a/**", true).unwrap();
        assert_eq!(set.patterns(), &["b/**".to_string(), "a/**".to_string()]);
    }
}
