//! Serializable collection options, as entered in a form or config file.
//!
//! `CollectionOptions` is the unvalidated input surface. Convert it with
//! [`CollectionOptions::to_spec`] to get a compiled `CollectionSpec`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::spec::{CollectionSpec, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FILE_SIZE};

/// Raw options for one collection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOptions {
    /// Include patterns, comma or newline separated. Empty includes everything.
    #[serde(default)]
    pub include: String,

    /// Exclude patterns, comma or newline separated. Empty excludes nothing.
    #[serde(default)]
    pub exclude: String,

    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    /// Depth below the root; files directly in the root are depth 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Per-file cap in bytes, applied by the sink.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Only collect file names ending with this suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_suffix: Option<String>,
}

fn default_case_sensitive() -> bool {
    true
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for CollectionOptions {
    fn default() -> Self {
        CollectionOptions {
            include: String::new(),
            exclude: String::new(),
            case_sensitive: default_case_sensitive(),
            max_depth: default_max_depth(),
            max_file_size: default_max_file_size(),
            allowed_suffix: None,
        }
    }
}

impl CollectionOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize with consistent formatting.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and compile into a `CollectionSpec`.
    pub fn to_spec(&self) -> Result<CollectionSpec> {
        let mut spec = CollectionSpec::new(
            &self.include,
            &self.exclude,
            self.case_sensitive,
            self.max_depth,
        )?
        .with_max_file_size(self.max_file_size)?;

        if let Some(suffix) = &self.allowed_suffix {
            spec = spec.with_allowed_suffix(suffix.clone());
        }

        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectError;

    #[test]
    fn test_defaults() {
        let options = CollectionOptions::default();
        assert_eq!(options.include, "");
        assert_eq!(options.exclude, "");
        assert!(options.case_sensitive);
        assert_eq!(options.max_depth, 10);
        assert_eq!(options.max_file_size, 2_000_000);
        assert!(options.allowed_suffix.is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let options = CollectionOptions::from_json(r#"{"exclude": "workflow*/**"}"#).unwrap();
        assert_eq!(options.exclude, "workflow*/**");
        assert_eq!(options.max_depth, 10);
        assert!(options.case_sensitive);
    }

    #[test]
    fn test_to_spec() {
        let options = CollectionOptions {
            include: "**/*.xml".to_string(),
            exclude: "workflow*/**".to_string(),
            case_sensitive: false,
            max_depth: 3,
            max_file_size: 1024,
            allowed_suffix: Some(".xml".to_string()),
        };
        let spec = options.to_spec().unwrap();
        assert_eq!(spec.include_patterns(), &["**/*.xml".to_string()]);
        assert_eq!(spec.exclude_patterns(), &["workflow*/**".to_string()]);
        assert!(!spec.case_sensitive());
        assert_eq!(spec.max_depth(), 3);
        assert_eq!(spec.max_file_size(), 1024);
        assert_eq!(spec.allowed_suffix(), Some(".xml"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let options = CollectionOptions {
            max_depth: 0,
            ..Default::default()
        };
        assert!(options.to_spec().unwrap_err().is_configuration());

        let options = CollectionOptions {
            max_file_size: 0,
            ..Default::default()
        };
        assert!(options.to_spec().is_err());

        let options = CollectionOptions {
            include: "{a,b".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            options.to_spec(),
            Err(CollectError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = CollectionOptions::from_json("{not json").unwrap_err();
        assert!(matches!(err, CollectError::Json(_)));
    }
}
