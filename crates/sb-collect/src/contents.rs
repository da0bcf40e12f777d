//! Guarded collection pass: the one entry point that feeds a sink.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::collector::collect;
use crate::error::{CollectError, Result};
use crate::guard::ManagedDirectory;
use crate::sink::Sink;
use crate::spec::CollectionSpec;

/// Outcome of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Entries handed to the sink.
    pub added: usize,

    /// Entries discovered but unreadable when opened (vanished, permissions).
    pub skipped: usize,
}

/// Collect `directory` into `sink` under the directory guard.
///
/// Every entry is opened and consumed by the sink while the lock is held.
/// A file that cannot be opened is logged and skipped. A sink error aborts
/// the pass; entries added before it stay in the sink.
pub fn add_contents<S: Sink + ?Sized>(
    sink: &mut S,
    directory: &ManagedDirectory,
    spec: &CollectionSpec,
    prefix: &str,
) -> Result<PassSummary> {
    directory.with_lock(|root| -> Result<PassSummary> {
        let mut summary = PassSummary::default();

        for entry in collect(root, spec, prefix) {
            let mut file = match entry.open() {
                Ok(file) => file,
                Err(e) => {
                    warn!(
                        path = %entry.path.display(),
                        error = %e,
                        "Skipping file that could not be opened"
                    );
                    summary.skipped += 1;
                    continue;
                }
            };

            sink.add(&entry, &mut file)
                .map_err(|source| CollectError::Sink {
                    name: entry.archive_name.clone(),
                    source,
                })?;
            summary.added += 1;

            debug!(name = %entry.archive_name, "Added entry");
        }

        info!(
            root = %root.display(),
            prefix,
            added = summary.added,
            skipped = summary.skipped,
            "Collection pass complete"
        );

        Ok(summary)
    })
}
