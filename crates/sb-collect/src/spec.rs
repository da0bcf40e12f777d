//! Validated configuration for one collection pass.

use crate::error::{CollectError, Result};
use crate::pattern::PatternSet;

/// Default maximum depth below the collection root.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default per-file size cap handed to the sink (2 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1_000_000;

/// Immutable filter configuration for a single pass.
///
/// Patterns are compiled when the spec is built, so a malformed glob is
/// reported here and never in the middle of a walk.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    include: PatternSet,
    exclude: PatternSet,
    case_sensitive: bool,
    max_depth: usize,
    max_file_size: u64,
    allowed_suffix: Option<String>,
}

impl Default for CollectionSpec {
    /// Everything up to `DEFAULT_MAX_DEPTH`, case sensitive, 2 MB cap.
    fn default() -> Self {
        Self {
            include: PatternSet::default(),
            exclude: PatternSet::default(),
            case_sensitive: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_suffix: None,
        }
    }
}

impl CollectionSpec {
    /// Build a spec from comma/newline separated include and exclude strings.
    ///
    /// # Errors
    /// `InvalidPattern` for a glob that does not compile, `InvalidValue` when
    /// `max_depth` is zero.
    pub fn new(
        includes: &str,
        excludes: &str,
        case_sensitive: bool,
        max_depth: usize,
    ) -> Result<Self> {
        Self::from_patterns(
            crate::pattern::split_patterns(includes),
            crate::pattern::split_patterns(excludes),
            case_sensitive,
            max_depth,
        )
    }

    /// Build a spec from already split pattern lists.
    pub fn from_patterns<I, E, S>(
        includes: I,
        excludes: E,
        case_sensitive: bool,
        max_depth: usize,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if max_depth == 0 {
            return Err(CollectError::InvalidValue {
                field: "max_depth".to_string(),
                message: "must be a positive integer, got 0".to_string(),
            });
        }

        Ok(Self {
            include: PatternSet::compile(includes, case_sensitive)?,
            exclude: PatternSet::compile(excludes, case_sensitive)?,
            case_sensitive,
            max_depth,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_suffix: None,
        })
    }

    /// Set the per-file size cap carried by every entry.
    ///
    /// # Errors
    /// `InvalidValue` when `max_file_size` is zero.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Result<Self> {
        if max_file_size == 0 {
            return Err(CollectError::InvalidValue {
                field: "max_file_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        self.max_file_size = max_file_size;
        Ok(self)
    }

    /// Restrict the pass to file names ending in `suffix` (e.g. `.txt`).
    pub fn with_allowed_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.allowed_suffix = if suffix.is_empty() { None } else { Some(suffix) };
        self
    }

    pub fn include_patterns(&self) -> &[String] {
        self.include.patterns()
    }

    pub fn exclude_patterns(&self) -> &[String] {
        self.exclude.patterns()
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn allowed_suffix(&self) -> Option<&str> {
        self.allowed_suffix.as_deref()
    }

    /// Apply suffix, include and exclude filters, in that order.
    ///
    /// `file_name` is the last path segment, `relative_path` the
    /// `/`-separated path below the root.
    pub fn accepts(&self, file_name: &str, relative_path: &str) -> bool {
        if let Some(suffix) = &self.allowed_suffix {
            let has_suffix = if self.case_sensitive {
                file_name.ends_with(suffix.as_str())
            } else {
                file_name
                    .to_lowercase()
                    .ends_with(&suffix.to_lowercase())
            };
            if !has_suffix {
                return false;
            }
        }

        if !self.include.is_empty() && !self.include.is_match(relative_path) {
            return false;
        }

        // Exclude wins over include.
        !self.exclude.is_match(relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_accepts_everything() {
        let spec = CollectionSpec::default();
        assert!(spec.accepts("build.xml", "build.xml"));
        assert!(spec.accepts("1.xml", "workflow/1.xml"));
        assert_eq!(spec.max_depth(), DEFAULT_MAX_DEPTH);
        assert_eq!(spec.max_file_size(), DEFAULT_MAX_FILE_SIZE);
        assert!(spec.case_sensitive());
        assert!(spec.allowed_suffix().is_none());
    }

    #[test]
    fn test_zero_depth_rejected() {
        let err = CollectionSpec::new("", "", true, 0).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("max_depth"));
    }

    #[test]
    fn test_zero_file_size_rejected() {
        let err = CollectionSpec::default().with_max_file_size(0).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("max_file_size"));

        let spec = CollectionSpec::default().with_max_file_size(1).unwrap();
        assert_eq!(spec.max_file_size(), 1);
    }

    #[test]
    fn test_bad_glob_rejected_at_construction() {
        let err = CollectionSpec::new("", "[oops", true, 10).unwrap_err();
        assert!(matches!(err, CollectError::InvalidPattern { .. }));
    }

    #[test]
    fn test_exclude_beats_include() {
        let spec = CollectionSpec::new("**/*.xml", "workflow*/**", true, 10).unwrap();
        assert!(spec.accepts("build.xml", "build.xml"));
        assert!(!spec.accepts("1.xml", "workflow/1.xml"));
        assert!(!spec.accepts("log", "log"));

        let spec = CollectionSpec::new("build.xml", "build.xml", true, 10).unwrap();
        assert!(!spec.accepts("build.xml", "build.xml"));
    }

    #[test]
    fn test_suffix_filter() {
        let spec = CollectionSpec::default().with_allowed_suffix(".txt");
        assert!(spec.accepts("report.txt", "report.txt"));
        assert!(!spec.accepts("report.log", "report.log"));
        assert!(!spec.accepts("REPORT.TXT", "REPORT.TXT"));

        let spec = CollectionSpec::new("", "", false, 10)
            .unwrap()
            .with_allowed_suffix(".txt");
        assert!(spec.accepts("REPORT.TXT", "REPORT.TXT"));
    }

    #[test]
    fn test_empty_suffix_disables_filter() {
        let spec = CollectionSpec::default().with_allowed_suffix("");
        assert!(spec.allowed_suffix().is_none());
        assert!(spec.accepts("log", "log"));
    }
}
