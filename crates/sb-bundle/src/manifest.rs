//! Bundle manifest types and serialization.
//!
//! The manifest lists every collected entry with its SHA-256 checksum,
//! stored size, and whether the size cap cut it short.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current bundle format version.
pub const BUNDLE_SCHEMA_VERSION: &str = "1.0.0";

/// Manifest file name within the bundle.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Bundle manifest containing metadata and file checksums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Bundle format version.
    pub bundle_version: String,

    /// When the bundle was created.
    pub created_at: DateTime<Utc>,

    /// Label of the host the bundle was collected on.
    pub host: String,

    /// Files included in the bundle, sorted by path.
    pub files: Vec<FileEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Version of the tool that wrote the bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_version: Option<String>,
}

impl BundleManifest {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            bundle_version: BUNDLE_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            host: host.into(),
            files: Vec::new(),
            description: None,
            generator_version: None,
        }
    }

    pub fn with_generator_version(mut self, version: impl Into<String>) -> Self {
        self.generator_version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn add_file(&mut self, entry: FileEntry) {
        self.files.push(entry);
    }

    /// Total stored bytes across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Entries the size cap cut short.
    pub fn truncated_files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().filter(|f| f.truncated)
    }

    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Validate the manifest structure.
    pub fn validate(&self) -> crate::Result<()> {
        if self.bundle_version != BUNDLE_SCHEMA_VERSION {
            return Err(crate::BundleError::UnsupportedVersion {
                version: self.bundle_version.clone(),
                supported: BUNDLE_SCHEMA_VERSION.to_string(),
            });
        }

        for file in &self.files {
            if file.path.is_empty() {
                return Err(crate::BundleError::CorruptedManifest(
                    "file entry has empty path".to_string(),
                ));
            }
            if file.sha256.len() != 64 {
                return Err(crate::BundleError::CorruptedManifest(format!(
                    "file '{}' has invalid checksum length",
                    file.path
                )));
            }
            if file.truncated && file.source_bytes.is_some_and(|source| source <= file.bytes) {
                return Err(crate::BundleError::CorruptedManifest(format!(
                    "file '{}' is marked truncated but its source is not larger",
                    file.path
                )));
            }
        }

        Ok(())
    }

    /// Sort files for deterministic ordering.
    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path within the bundle.
    pub path: String,

    /// SHA-256 checksum of the stored bytes (64 hex characters).
    pub sha256: String,

    /// Stored size in bytes.
    pub bytes: u64,

    /// Whether the size cap cut the content short.
    #[serde(default)]
    pub truncated: bool,

    /// Size of the file on disk, recorded when truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_bytes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>, sha256: impl Into<String>, bytes: u64) -> Self {
        Self {
            path: path.into(),
            sha256: sha256.into(),
            bytes,
            truncated: false,
            source_bytes: None,
            mime_type: None,
        }
    }

    /// Mark the entry as cut short from a source of `source_bytes`.
    pub fn with_truncation(mut self, source_bytes: Option<u64>) -> Self {
        self.truncated = true;
        self.source_bytes = source_bytes;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute_checksum(data) == self.sha256
    }
}
