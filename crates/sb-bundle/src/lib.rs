//! Zip support bundle writer/reader.
//!
//! A support bundle is a ZIP archive containing:
//! - `manifest.json`: host label, creation time, and every entry with its
//!   SHA-256 checksum, stored size, and truncation flag
//! - the collected files, named `<prefix>/<relative path>`
//!
//! [`BundleWriter`] implements [`sb_collect::Sink`], so a collection pass can
//! feed it directly. Files over the per-entry cap are stored truncated and
//! flagged in the manifest.
//!
//! # Example
//!
//! ```no_run
//! use sb_bundle::{BundleReader, BundleWriter};
//! use sb_collect::{add_contents, CollectionSpec, ManagedDirectory};
//! use std::path::Path;
//!
//! let dir = ManagedDirectory::new("/var/lib/builds/42");
//! let mut writer = BundleWriter::new("build-agent-01");
//! add_contents(&mut writer, &dir, &CollectionSpec::default(), "items/job/builds/42").unwrap();
//! writer.write(Path::new("support.zip")).unwrap();
//!
//! let mut reader = BundleReader::open(Path::new("support.zip")).unwrap();
//! let failures = reader.verify_all();
//! assert!(failures.is_empty());
//! ```

pub mod error;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use error::{BundleError, Result};
pub use manifest::{BundleManifest, FileEntry, BUNDLE_SCHEMA_VERSION, MANIFEST_FILE_NAME};
pub use reader::BundleReader;
pub use writer::{BundleWriter, FileType};
