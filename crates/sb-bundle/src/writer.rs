//! Bundle writer for creating support bundle zips.
//!
//! Entries are buffered in memory, then written as a deflated ZIP with
//! `manifest.json` first and content files in sorted order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use sb_collect::{CollectedEntry, Sink, SinkError};
use tracing::{debug, info};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::manifest::MANIFEST_FILE_NAME;
use crate::{BundleError, BundleManifest, FileEntry, Result};

/// File type hints for MIME type assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Json,
    Xml,
    Text,
    Binary,
}

impl FileType {
    fn mime_type(&self) -> &'static str {
        match self {
            FileType::Json => "application/json",
            FileType::Xml => "application/xml",
            FileType::Text => "text/plain",
            FileType::Binary => "application/octet-stream",
        }
    }

    /// Guess from the last path segment. Extensionless files (build logs)
    /// are treated as text.
    fn from_path(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            None => FileType::Text,
            Some(ext) => match ext.as_str() {
                "json" | "jsonl" => FileType::Json,
                "xml" => FileType::Xml,
                "txt" | "log" | "properties" | "md" => FileType::Text,
                _ => FileType::Binary,
            },
        }
    }
}

/// Builder for support bundles; also a [`Sink`] for collection passes.
pub struct BundleWriter {
    manifest: BundleManifest,
    files: BTreeMap<String, Vec<u8>>,
}

impl BundleWriter {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            manifest: BundleManifest::new(host),
            files: BTreeMap::new(),
        }
    }

    pub fn with_generator_version(mut self, version: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_generator_version(version);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_description(description);
        self
    }

    /// Add a file to the bundle with automatic checksum.
    ///
    /// Names must be unique, relative, and must not shadow the manifest.
    pub fn add_file(&mut self, path: impl Into<String>, data: Vec<u8>) -> Result<()> {
        self.insert(path.into(), data, None)
    }

    /// Add a JSON-serializable value as a file.
    pub fn add_json<T: serde::Serialize>(&mut self, path: impl Into<String>, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.add_file(path, json.into_bytes())
    }

    fn insert(&mut self, path: String, data: Vec<u8>, truncated_from: Option<Option<u64>>) -> Result<()> {
        validate_name(&path)?;
        if self.files.contains_key(&path) {
            return Err(BundleError::DuplicateFile(path));
        }

        let bytes = data.len() as u64;
        let mut entry = FileEntry::new(&path, FileEntry::compute_checksum(&data), bytes)
            .with_mime_type(FileType::from_path(&path).mime_type());
        if let Some(source_bytes) = truncated_from {
            entry = entry.with_truncation(source_bytes);
        }

        debug!(path = %path, bytes, truncated = entry.truncated, "Added file to bundle");
        self.manifest.add_file(entry);
        self.files.insert(path, data);
        Ok(())
    }

    /// Get the current manifest (for inspection before writing).
    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    /// Total size in bytes before compression.
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|data| data.len() as u64).sum()
    }

    /// File count, not including the manifest.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Write the bundle to a file.
    pub fn write(self, path: &Path) -> Result<BundleManifest> {
        let file = File::create(path)?;
        let manifest = self.write_zip(file)?;

        info!(
            path = %path.display(),
            files = manifest.file_count(),
            bytes = manifest.total_bytes(),
            "Bundle written"
        );

        Ok(manifest)
    }

    /// Write the bundle to a byte vector (for in-memory use).
    pub fn write_to_vec(self) -> Result<(Vec<u8>, BundleManifest)> {
        let mut buffer = Cursor::new(Vec::new());
        let manifest = self.write_zip(&mut buffer)?;
        let bytes = buffer.into_inner();

        info!(
            files = manifest.file_count(),
            compressed_bytes = bytes.len(),
            uncompressed_bytes = manifest.total_bytes(),
            "Bundle written to memory"
        );

        Ok((bytes, manifest))
    }

    fn write_zip<W: Write + Seek>(mut self, out: W) -> Result<BundleManifest> {
        if self.files.is_empty() {
            return Err(BundleError::EmptyBundle);
        }

        self.manifest.sort_files();
        let manifest_json = self.manifest.to_json()?;

        let mut zip = ZipWriter::new(out);
        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(manifest_json.as_bytes())?;

        // BTreeMap iteration is already sorted by name.
        for (file_path, data) in &self.files {
            zip.start_file(file_path.as_str(), options)?;
            zip.write_all(data)?;
        }

        zip.finish()?;
        Ok(self.manifest)
    }
}

fn validate_name(path: &str) -> Result<()> {
    let invalid = path.is_empty()
        || path == MANIFEST_FILE_NAME
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|segment| segment.is_empty() || segment == "..");
    if invalid {
        return Err(BundleError::InvalidName(path.to_string()));
    }
    Ok(())
}

impl Sink for BundleWriter {
    /// Copies at most `entry.max_file_size` bytes. Larger files are stored
    /// truncated and flagged in the manifest with their on-disk size.
    fn add(&mut self, entry: &CollectedEntry, content: &mut dyn Read) -> std::result::Result<(), SinkError> {
        if self.files.contains_key(&entry.archive_name) {
            return Err(SinkError::Duplicate(entry.archive_name.clone()));
        }

        let mut data = Vec::new();
        Read::take(&mut *content, entry.max_file_size).read_to_end(&mut data)?;

        let mut probe = [0u8; 1];
        let truncated = content.read(&mut probe)? > 0;
        let truncated_from = if truncated {
            let source_bytes = std::fs::metadata(&entry.path).ok().map(|m| m.len());
            debug!(
                name = %entry.archive_name,
                cap = entry.max_file_size,
                source_bytes,
                "Truncating oversized file"
            );
            Some(source_bytes)
        } else {
            None
        };

        self.insert(entry.archive_name.clone(), data, truncated_from)
            .map_err(|e| match e {
                BundleError::DuplicateFile(name) => SinkError::Duplicate(name),
                other => SinkError::Rejected(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(name: &str, cap: u64) -> CollectedEntry {
        CollectedEntry {
            archive_name: name.to_string(),
            relative_path: name.to_string(),
            path: PathBuf::from("/nonexistent").join(name),
            max_file_size: cap,
        }
    }

    #[test]
    fn test_bundle_writer_add_file() {
        let mut writer = BundleWriter::new("host");
        writer.add_file("items/job/builds/1/log", b"Started".to_vec()).unwrap();

        assert_eq!(writer.file_count(), 1);
        assert_eq!(writer.total_bytes(), 7);
        let file = writer.manifest().find_file("items/job/builds/1/log").unwrap();
        assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_bundle_writer_rejects_duplicates() {
        let mut writer = BundleWriter::new("host");
        writer.add_file("a.txt", b"one".to_vec()).unwrap();
        let err = writer.add_file("a.txt", b"two".to_vec()).unwrap_err();
        assert!(matches!(err, BundleError::DuplicateFile(name) if name == "a.txt"));
        assert_eq!(writer.file_count(), 1);
    }

    #[test]
    fn test_bundle_writer_rejects_bad_names() {
        let mut writer = BundleWriter::new("host");
        for name in ["", "manifest.json", "/abs", "a/../b", "a//b", "dir\\file"] {
            assert!(
                matches!(writer.add_file(name, vec![]), Err(BundleError::InvalidName(_))),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn test_sink_truncates_to_cap() {
        let mut writer = BundleWriter::new("host");
        let data = vec![b'x'; 100];
        Sink::add(&mut writer, &entry("big.log", 10), &mut &data[..]).unwrap();
        Sink::add(&mut writer, &entry("small.log", 10), &mut &b"tiny"[..]).unwrap();

        let big = writer.manifest().find_file("big.log").unwrap();
        assert_eq!(big.bytes, 10);
        assert!(big.truncated);
        // No file on disk to measure.
        assert_eq!(big.source_bytes, None);

        let small = writer.manifest().find_file("small.log").unwrap();
        assert_eq!(small.bytes, 4);
        assert!(!small.truncated);
    }

    #[test]
    fn test_sink_exact_cap_is_not_truncated() {
        let mut writer = BundleWriter::new("host");
        Sink::add(&mut writer, &entry("exact", 5), &mut &b"12345"[..]).unwrap();
        assert!(!writer.manifest().find_file("exact").unwrap().truncated);
    }

    #[test]
    fn test_sink_rejects_duplicates() {
        let mut writer = BundleWriter::new("host");
        Sink::add(&mut writer, &entry("a", 10), &mut &b"x"[..]).unwrap();
        let err = Sink::add(&mut writer, &entry("a", 10), &mut &b"y"[..]).unwrap_err();
        assert!(matches!(err, SinkError::Duplicate(_)));
    }

    #[test]
    fn test_bundle_writer_write_empty_fails() {
        let writer = BundleWriter::new("host");
        assert!(matches!(writer.write_to_vec(), Err(BundleError::EmptyBundle)));
    }

    #[test]
    fn test_bundle_writer_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let bundle_path = temp_dir.path().join("support.zip");

        let mut writer = BundleWriter::new("host").with_generator_version("0.1.0");
        writer.add_json("about.json", &serde_json::json!({"collector": "sb"})).unwrap();
        writer.add_file("data.txt", b"test data".to_vec()).unwrap();

        let manifest = writer.write(&bundle_path).unwrap();

        assert!(bundle_path.exists());
        assert_eq!(manifest.file_count(), 2);
        assert_eq!(manifest.generator_version.as_deref(), Some("0.1.0"));
    }

    #[test]
    fn test_bundle_writer_deterministic_order() {
        let mut writer1 = BundleWriter::new("host");
        writer1.add_file("z.txt", b"z".to_vec()).unwrap();
        writer1.add_file("a.txt", b"a".to_vec()).unwrap();

        let mut writer2 = BundleWriter::new("host");
        writer2.add_file("a.txt", b"a".to_vec()).unwrap();
        writer2.add_file("z.txt", b"z".to_vec()).unwrap();

        let (bytes1, manifest1) = writer1.write_to_vec().unwrap();
        let (_, manifest2) = writer2.write_to_vec().unwrap();

        assert_eq!(&bytes1[0..2], b"PK");
        let paths1: Vec<_> = manifest1.files.iter().map(|f| &f.path).collect();
        let paths2: Vec<_> = manifest2.files.iter().map(|f| &f.path).collect();
        assert_eq!(paths1, paths2);
        assert_eq!(paths1, vec!["a.txt", "z.txt"]);
    }

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path("a/build.xml"), FileType::Xml);
        assert_eq!(FileType::from_path("a/log"), FileType::Text);
        assert_eq!(FileType::from_path("reports/x.TXT"), FileType::Text);
        assert_eq!(FileType::from_path("x.json"), FileType::Json);
        assert_eq!(FileType::from_path("x.bin"), FileType::Binary);
        assert_eq!(FileType::from_path("v1.2/log"), FileType::Text);
    }
}
