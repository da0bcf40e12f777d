//! Bundle components that contribute files.
//!
//! A component reports the permissions a caller must hold before invoking
//! it; checking them is the caller's job. File-collecting components also
//! implement [`FileContributor`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::contents::{add_contents, PassSummary};
use crate::error::Result;
use crate::file_list_cap::FileListCap;
use crate::guard::ManagedDirectory;
use crate::options::CollectionOptions;
use crate::sink::Sink;
use crate::spec::{CollectionSpec, DEFAULT_MAX_FILE_SIZE};

/// Capabilities a principal may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Full administrative access.
    Administer,
    /// Read-only access.
    Read,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Permission::Administer => write!(f, "administer"),
            Permission::Read => write!(f, "read"),
        }
    }
}

/// Something that can appear in a support bundle.
pub trait Component {
    /// Short human-readable name.
    fn display_name(&self) -> &str;

    /// Permissions required to include this component.
    fn required_permissions(&self) -> &[Permission] {
        &[Permission::Administer]
    }
}

/// A component that copies files into a sink.
pub trait FileContributor: Component {
    fn add_contents(&self, sink: &mut dyn Sink) -> Result<PassSummary>;
}

/// Maximum file size packed from a capped file list (2 MB).
pub const MAX_FILE_SIZE: u64 = DEFAULT_MAX_FILE_SIZE;

/// Attaches the `.txt` reports kept by a [`FileListCap`].
///
/// Entries are named `<folder name>/<file name>`.
#[derive(Debug)]
pub struct FileListCapComponent {
    name: String,
    cap: Arc<FileListCap>,
    spec: CollectionSpec,
}

impl FileListCapComponent {
    pub fn new(name: impl Into<String>, cap: Arc<FileListCap>) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            cap,
            spec: file_list_spec()?,
        })
    }

    pub fn cap(&self) -> &FileListCap {
        &self.cap
    }
}

/// Root-level `*.txt` files only, capped at `MAX_FILE_SIZE`.
fn file_list_spec() -> Result<CollectionSpec> {
    // "*" never crosses a separator, so nested files are never matched.
    CollectionSpec::new("*", "", true, 1)?
        .with_allowed_suffix(".txt")
        .with_max_file_size(MAX_FILE_SIZE)
}

impl Component for FileListCapComponent {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl FileContributor for FileListCapComponent {
    fn add_contents(&self, sink: &mut dyn Sink) -> Result<PassSummary> {
        let folder = self.cap.folder();
        add_contents(sink, folder, &self.spec, &folder.name())
    }
}

/// Archive prefix for a build: `items/<job>/builds/<number>`.
///
/// Jobs inside folders (`folder/job`) map to `items/folder/jobs/job`.
pub fn run_prefix(job_full_name: &str, number: u64) -> String {
    let job_path = job_full_name
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/jobs/");
    format!("items/{}/builds/{}", job_path, number)
}

/// Attaches the contents of one build's run directory.
#[derive(Debug)]
pub struct RunDirectoryComponent {
    directory: Arc<ManagedDirectory>,
    prefix: String,
    spec: CollectionSpec,
}

impl RunDirectoryComponent {
    /// Component with default options: everything up to depth 10, 2 MB per file.
    pub fn new(directory: Arc<ManagedDirectory>, job_full_name: &str, number: u64) -> Self {
        Self {
            directory,
            prefix: run_prefix(job_full_name, number),
            spec: CollectionSpec::default(),
        }
    }

    /// Component with explicit include/exclude/case/depth settings.
    pub fn with_options(
        directory: Arc<ManagedDirectory>,
        job_full_name: &str,
        number: u64,
        options: &CollectionOptions,
    ) -> Result<Self> {
        Ok(Self {
            directory,
            prefix: run_prefix(job_full_name, number),
            spec: options.to_spec()?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }
}

impl Component for RunDirectoryComponent {
    fn display_name(&self) -> &str {
        "Build directory"
    }
}

impl FileContributor for RunDirectoryComponent {
    fn add_contents(&self, sink: &mut dyn Sink) -> Result<PassSummary> {
        add_contents(sink, &self.directory, &self.spec, &self.prefix)
    }
}
