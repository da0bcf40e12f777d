//! Bundle reader for opening and verifying support bundles.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::manifest::MANIFEST_FILE_NAME;
use crate::{BundleError, BundleManifest, FileEntry, Result};

/// Reader for support bundles with checksum verification.
pub struct BundleReader<R: Read + Seek> {
    manifest: BundleManifest,
    archive: ZipArchive<R>,
    verified: HashSet<String>,
}

impl BundleReader<File> {
    /// Open a bundle from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl BundleReader<Cursor<Vec<u8>>> {
    /// Open a bundle from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> BundleReader<R> {
    /// Create a reader from any Read + Seek source.
    ///
    /// The manifest is parsed and validated up front.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let manifest = Self::read_manifest(&mut archive)?;
        manifest.validate()?;

        info!(
            host = %manifest.host,
            files = manifest.file_count(),
            "Bundle opened"
        );

        Ok(Self {
            manifest,
            archive,
            verified: HashSet::new(),
        })
    }

    fn read_manifest(archive: &mut ZipArchive<R>) -> Result<BundleManifest> {
        let mut manifest_file = archive
            .by_name(MANIFEST_FILE_NAME)
            .map_err(|_| BundleError::MissingFile(MANIFEST_FILE_NAME.to_string()))?;

        let mut json = String::new();
        manifest_file.read_to_string(&mut json)?;
        BundleManifest::from_json(&json)
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    /// Entries listed in the manifest, sorted by path.
    pub fn files(&self) -> &[FileEntry] {
        &self.manifest.files
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.manifest.find_file(path).is_some()
    }

    /// Read a file from the bundle without verification.
    ///
    /// Use `read_verified` for integrity-checked reads.
    pub fn read_raw(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|_| BundleError::FileNotFound(path.to_string()))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        debug!(path, bytes = data.len(), "Read file from bundle (unverified)");
        Ok(data)
    }

    /// Read a file and check it against its manifest checksum.
    pub fn read_verified(&mut self, path: &str) -> Result<Vec<u8>> {
        let expected = self
            .manifest
            .find_file(path)
            .ok_or_else(|| BundleError::FileNotFound(path.to_string()))?
            .sha256
            .clone();

        let data = self.read_raw(path)?;

        let actual = FileEntry::compute_checksum(&data);
        if actual != expected {
            return Err(BundleError::ChecksumMismatch {
                path: path.to_string(),
                expected,
                actual,
            });
        }

        self.verified.insert(path.to_string());
        debug!(path, "File verified");
        Ok(data)
    }

    pub fn is_verified(&self, path: &str) -> bool {
        self.verified.contains(path)
    }

    /// Verify every file in the manifest.
    ///
    /// Returns the paths that failed verification.
    pub fn verify_all(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        let paths: Vec<String> = self.manifest.files.iter().map(|f| f.path.clone()).collect();

        for path in paths {
            if let Err(e) = self.read_verified(&path) {
                warn!(path = %path, error = %e, "Verification failed");
                failures.push(path);
            }
        }

        if failures.is_empty() {
            info!("All files verified");
        } else {
            warn!(failures = ?failures, "Some files failed verification");
        }

        failures
    }

    /// All verified entries keyed by archive name.
    pub fn contents(&mut self) -> Result<BTreeMap<String, Vec<u8>>> {
        let paths: Vec<String> = self.manifest.files.iter().map(|f| f.path.clone()).collect();
        let mut contents = BTreeMap::new();
        for path in paths {
            let data = self.read_verified(&path)?;
            contents.insert(path, data);
        }
        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BundleWriter;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn create_test_bundle() -> Vec<u8> {
        let mut writer = BundleWriter::new("host-abc");
        writer.add_file("items/job/builds/1/build.xml", b"<build/>".to_vec()).unwrap();
        writer.add_file("items/job/builds/1/log", b"Started".to_vec()).unwrap();
        let (bytes, _) = writer.write_to_vec().unwrap();
        bytes
    }

    /// Hand-built zip whose manifest lies about one checksum.
    fn tampered_bundle() -> Vec<u8> {
        let mut manifest = BundleManifest::new("host");
        manifest.add_file(FileEntry::new("good", FileEntry::compute_checksum(b"good"), 4));
        manifest.add_file(FileEntry::new("bad", "0".repeat(64), 3));

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options: FileOptions<'_, ()> = FileOptions::default();
            zip.start_file(MANIFEST_FILE_NAME, options).unwrap();
            zip.write_all(manifest.to_json().unwrap().as_bytes()).unwrap();
            zip.start_file("good", options).unwrap();
            zip.write_all(b"good").unwrap();
            zip.start_file("bad", options).unwrap();
            zip.write_all(b"bad").unwrap();
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_bundle_reader_from_bytes() {
        let reader = BundleReader::from_bytes(create_test_bundle()).unwrap();
        assert_eq!(reader.manifest().host, "host-abc");
        assert_eq!(reader.manifest().file_count(), 2);
        assert!(reader.has_file("items/job/builds/1/log"));
        assert!(!reader.has_file("missing.txt"));
    }

    #[test]
    fn test_bundle_reader_read_verified() {
        let mut reader = BundleReader::from_bytes(create_test_bundle()).unwrap();
        let data = reader.read_verified("items/job/builds/1/log").unwrap();
        assert_eq!(data, b"Started");
        assert!(reader.is_verified("items/job/builds/1/log"));
        assert!(!reader.is_verified("items/job/builds/1/build.xml"));
    }

    #[test]
    fn test_bundle_reader_missing_file() {
        let mut reader = BundleReader::from_bytes(create_test_bundle()).unwrap();
        assert!(matches!(
            reader.read_verified("nope"),
            Err(BundleError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_bundle_reader_contents() {
        let mut reader = BundleReader::from_bytes(create_test_bundle()).unwrap();
        let contents = reader.contents().unwrap();
        let names: Vec<_> = contents.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["items/job/builds/1/build.xml", "items/job/builds/1/log"]
        );
        assert_eq!(contents["items/job/builds/1/build.xml"], b"<build/>");
    }

    #[test]
    fn test_verify_all_reports_mismatch() {
        let mut reader = BundleReader::from_bytes(tampered_bundle()).unwrap();
        assert_eq!(reader.verify_all(), vec!["bad".to_string()]);
        assert!(reader.is_verified("good"));
        assert!(matches!(
            reader.read_verified("bad"),
            Err(BundleError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_manifest() {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buffer);
            let options: FileOptions<'_, ()> = FileOptions::default();
            zip.start_file("log", options).unwrap();
            zip.write_all(b"x").unwrap();
            zip.finish().unwrap();
        }
        let result = BundleReader::from_bytes(buffer.into_inner());
        assert!(matches!(result, Err(BundleError::MissingFile(_))));
    }

    #[test]
    fn test_not_a_zip() {
        let result = BundleReader::from_bytes(b"definitely not a zip".to_vec());
        assert!(matches!(result, Err(BundleError::Zip(_))));
    }
}
