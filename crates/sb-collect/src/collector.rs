//! Selective collector: walk, filter and name files below a root.
//!
//! The collector is a pure filter/namer. It never reads file contents and
//! never enforces the size cap; both belong to the sink.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::spec::CollectionSpec;

/// One file selected by a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedEntry {
    /// Name inside the bundle: `<prefix>/<relative path>`.
    pub archive_name: String,

    /// `/`-separated path below the collection root.
    pub relative_path: String,

    /// Location of the file on disk.
    pub path: PathBuf,

    /// Size cap the sink applies when copying the file.
    pub max_file_size: u64,
}

impl CollectedEntry {
    /// Open the underlying file for reading.
    pub fn open(&self) -> std::io::Result<File> {
        File::open(&self.path)
    }
}

/// Join a logical prefix and a relative path into an archive name.
pub fn archive_name(prefix: &str, relative_path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative_path.to_string()
    } else {
        format!("{}/{}", prefix, relative_path)
    }
}

/// Render `path` relative to `root` with `/` separators on every host.
///
/// Returns `None` when `path` is not below `root`.
pub fn relative_name(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Start a lazy collection pass over `root`.
///
/// A missing root, or a root that is not a directory, yields an empty
/// sequence rather than an error.
pub fn collect<'a>(root: &Path, spec: &'a CollectionSpec, prefix: &str) -> Collector<'a> {
    Collector::new(root, spec, prefix)
}

/// Iterator over the entries of one pass, in walk order.
///
/// Files inside one directory come out sorted by name; the walk is depth
/// first, so the order is stable for an unchanged tree.
pub struct Collector<'a> {
    walker: Option<walkdir::IntoIter>,
    root: PathBuf,
    canonical_root: PathBuf,
    spec: &'a CollectionSpec,
    prefix: String,
}

impl<'a> Collector<'a> {
    fn new(root: &Path, spec: &'a CollectionSpec, prefix: &str) -> Self {
        let canonical_root = match root.canonicalize() {
            Ok(canonical) if canonical.is_dir() => Some(canonical),
            Ok(_) => {
                debug!(root = %root.display(), "Collection root is not a directory");
                None
            }
            Err(e) => {
                debug!(root = %root.display(), error = %e, "Collection root unavailable");
                None
            }
        };

        // Depth 0 is the root's own files, which walkdir reports at depth 1.
        let walker = canonical_root.as_ref().map(|_| {
            WalkDir::new(root)
                .min_depth(1)
                .max_depth(spec.max_depth().saturating_add(1))
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
        });

        Self {
            walker,
            root: root.to_path_buf(),
            canonical_root: canonical_root.unwrap_or_default(),
            spec,
            prefix: prefix.to_string(),
        }
    }
}

/// Symbolic links count only when they resolve to a regular file inside the
/// root. Links to directories are never traversed.
fn link_stays_inside(path: &Path, canonical_root: &Path) -> bool {
    match path.canonicalize() {
        Ok(target) => target.starts_with(canonical_root) && target.is_file(),
        Err(_) => false,
    }
}

impl Iterator for Collector<'_> {
    type Item = CollectedEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let walker = self.walker.as_mut()?;

        loop {
            let entry = match walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        path = %e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                        error = %e,
                        "Skipping unreadable entry"
                    );
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.path();
            if file_type.is_symlink() {
                if !link_stays_inside(path, &self.canonical_root) {
                    debug!(path = %path.display(), "Skipping symbolic link");
                    continue;
                }
            } else if !file_type.is_file() {
                // Pipes, sockets and devices can block on open.
                debug!(path = %path.display(), "Skipping special file");
                continue;
            }

            let relative_path = match relative_name(path, &self.root) {
                Some(relative) => relative,
                None => continue,
            };
            let file_name = entry.file_name().to_string_lossy();

            if !self.spec.accepts(&file_name, &relative_path) {
                continue;
            }

            return Some(CollectedEntry {
                archive_name: archive_name(&self.prefix, &relative_path),
                relative_path,
                path: path.to_path_buf(),
                max_file_size: self.spec.max_file_size(),
            });
        }
    }
}
