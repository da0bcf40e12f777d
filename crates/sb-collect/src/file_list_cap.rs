//! Capped file list: a flat report directory that keeps its newest N files.
//!
//! Pruning takes the same directory guard as collection passes, so a pass
//! never loses a file it already discovered. Every deletion is logged and
//! returned as a `PruneEvent`; nothing is removed silently.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CollectError, Result};
use crate::guard::ManagedDirectory;

/// Record of one pruned file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneEvent {
    /// File name inside the capped folder.
    pub file_name: String,

    /// Size of the file when it was pruned.
    pub size_bytes: u64,

    /// Modification time that ranked the file as oldest.
    pub modified: DateTime<Utc>,

    /// False when deletion failed; the file may still be on disk.
    pub deleted: bool,
}

/// A directory holding at most `size` files.
#[derive(Debug)]
pub struct FileListCap {
    folder: ManagedDirectory,
    size: usize,
}

struct CapFile {
    path: PathBuf,
    name: String,
    size_bytes: u64,
    modified: SystemTime,
}

impl FileListCap {
    /// Create the cap, making the folder if needed.
    pub fn new(folder: impl Into<PathBuf>, size: usize) -> Result<Self> {
        let folder = folder.into();
        fs::create_dir_all(&folder)?;
        Ok(Self {
            folder: ManagedDirectory::new(folder),
            size,
        })
    }

    /// The guarded folder.
    pub fn folder(&self) -> &ManagedDirectory {
        &self.folder
    }

    /// Maximum number of files kept.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Path for a new file named `name` inside the folder.
    pub fn file(&self, name: &str) -> PathBuf {
        self.folder.root().join(name)
    }

    /// Register a freshly written file and enforce the cap.
    ///
    /// # Errors
    /// `InvalidValue` when `path` is not a regular file directly inside the
    /// folder.
    pub fn add(&self, path: &Path) -> Result<Vec<PruneEvent>> {
        if path.parent() != Some(self.folder.root()) || !path.is_file() {
            return Err(CollectError::InvalidValue {
                field: "path".to_string(),
                message: format!(
                    "{} is not a file in {}",
                    path.display(),
                    self.folder.root().display()
                ),
            });
        }

        debug!(path = %path.display(), "File added to capped list");
        self.prune()
    }

    /// Delete the oldest files until at most `size` remain.
    ///
    /// Files are ranked by modification time, then by name.
    pub fn prune(&self) -> Result<Vec<PruneEvent>> {
        self.folder.with_lock(|root| -> Result<Vec<PruneEvent>> {
            let mut files = list_files(root)?;
            if files.len() <= self.size {
                return Ok(Vec::new());
            }

            files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
            let excess = files.len() - self.size;

            let mut events = Vec::with_capacity(excess);
            for file in files.into_iter().take(excess) {
                info!(
                    file = %file.name,
                    size_bytes = file.size_bytes,
                    cap = self.size,
                    "Pruning capped file"
                );

                let deleted = match fs::remove_file(&file.path) {
                    Ok(()) => true,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
                    Err(e) => {
                        warn!(path = %file.path.display(), error = %e, "Failed to prune file");
                        false
                    }
                };

                events.push(PruneEvent {
                    file_name: file.name,
                    size_bytes: file.size_bytes,
                    modified: DateTime::<Utc>::from(file.modified),
                    deleted,
                });
            }

            Ok(events)
        })
    }

    /// Names of the files currently kept, oldest first.
    pub fn files(&self) -> Result<Vec<String>> {
        self.folder.with_lock(|root| -> Result<Vec<String>> {
            let mut files = list_files(root)?;
            files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
            Ok(files.into_iter().map(|f| f.name).collect())
        })
    }
}

/// Regular files directly inside `root`. A missing folder is empty.
fn list_files(root: &Path) -> Result<Vec<CapFile>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }
        files.push(CapFile {
            path: entry.path(),
            name: entry.file_name().to_string_lossy().into_owned(),
            size_bytes: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }
    Ok(files)
}
