//! Directory guard serializing collection against pruning.
//!
//! A `ManagedDirectory` owns an exclusive lock. Readers (collection passes)
//! and writers (pruners) take the same lock, so a file discovered by a pass
//! cannot be deleted until the pass, including sink consumption, is over.
//!
//! The lock is keyed by instance, not by path: share one `ManagedDirectory`
//! (usually behind an `Arc`) per logical directory.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::trace;

/// A directory whose file set may be mutated concurrently by a pruner.
#[derive(Debug)]
pub struct ManagedDirectory {
    root: PathBuf,
    lock: Mutex<()>,
}

impl ManagedDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    /// Root path of the directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last path component of the root, or an empty string for `/`.
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Run `f` while holding the directory's exclusive lock.
    ///
    /// The lock is released on every exit path. Whatever `f` returns,
    /// including an `Err`, is handed back unchanged. A lock poisoned by a
    /// panicking holder is recovered, since it guards no data of its own.
    pub fn with_lock<R>(&self, f: impl FnOnce(&Path) -> R) -> R {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        trace!(root = %self.root.display(), "Directory lock acquired");
        let result = f(&self.root);
        trace!(root = %self.root.display(), "Directory lock released");
        result
    }

    /// Run `f` only if the lock is free right now.
    ///
    /// Returns `None` without waiting when another holder has it.
    pub fn try_with_lock<R>(&self, f: impl FnOnce(&Path) -> R) -> Option<R> {
        let _guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return None,
        };
        Some(f(&self.root))
    }
}
