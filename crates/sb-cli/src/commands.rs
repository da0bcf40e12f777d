//! Command implementations for `sb`.
//!
//! Each command returns a serializable report plus the exit code to use,
//! or a [`CommandFailure`]. Printing is left to the binary.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sb_bundle::{BundleError, BundleReader, BundleWriter};
use sb_collect::{
    add_contents, collect, CollectError, CollectionOptions, FileListCap, ManagedDirectory,
    PruneEvent,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ConfigError, ConfigSource};
use crate::exit_codes::ExitCode;
use crate::output::Report;

/// A command that could not complete.
#[derive(Debug)]
pub struct CommandFailure {
    pub code: ExitCode,
    pub message: String,
}

impl CommandFailure {
    pub fn new(code: ExitCode, message: impl Into<String>) -> Self {
        CommandFailure {
            code,
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CommandFailure {
    fn from(err: ConfigError) -> Self {
        CommandFailure::new(ExitCode::ConfigError, err.to_string())
    }
}

impl From<CollectError> for CommandFailure {
    fn from(err: CollectError) -> Self {
        CommandFailure::new(ExitCode::from(&err), err.to_string())
    }
}

impl From<BundleError> for CommandFailure {
    fn from(err: BundleError) -> Self {
        CommandFailure::new(ExitCode::from(&err), err.to_string())
    }
}

pub type CommandResult<R> = Result<(R, ExitCode), CommandFailure>;

/// Host label for bundle manifests: the system hostname, if readable.
pub fn default_host() -> String {
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

// ============================================================================
// collect
// ============================================================================

#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub root: PathBuf,
    pub output: PathBuf,
    pub prefix: String,
    pub options: CollectionOptions,
    pub config: ConfigSource,
    pub host: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectReport {
    pub command: &'static str,
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub prefix: String,
    /// Bundle path; absent when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub added: usize,
    pub skipped: usize,
    pub truncated: Vec<String>,
    pub bytes: u64,
    pub config: ConfigSource,
}

impl Report for CollectReport {
    fn summary(&self) -> String {
        match &self.output {
            Some(output) => format!(
                "[collect] {} files ({} bytes, {} truncated, {} skipped) -> {}",
                self.added,
                self.bytes,
                self.truncated.len(),
                self.skipped,
                output
            ),
            None => format!("[collect] no files matched under {}", self.root),
        }
    }

    fn markdown(&self) -> String {
        let mut md = format!("## Support bundle\n\n- Root: `{}`\n", self.root);
        if !self.prefix.is_empty() {
            md.push_str(&format!("- Prefix: `{}`\n", self.prefix));
        }
        match &self.output {
            Some(output) => md.push_str(&format!("- Bundle: `{}`\n", output)),
            None => md.push_str("- Bundle: not written (no matching files)\n"),
        }
        md.push_str(&format!(
            "- Files: {} ({} bytes)\n- Skipped: {}\n",
            self.added, self.bytes, self.skipped
        ));
        if !self.truncated.is_empty() {
            md.push_str("\n### Truncated\n\n");
            for name in &self.truncated {
                md.push_str(&format!("- `{}`\n", name));
            }
        }
        md
    }
}

/// Collect `root` into a zip bundle at `output`.
///
/// When nothing matches, no file is written and the exit code is
/// `NothingCollected`.
pub fn run_collect(request: &CollectRequest) -> CommandResult<CollectReport> {
    let spec = request.options.to_spec()?;
    let directory = ManagedDirectory::new(&request.root);

    let mut writer =
        BundleWriter::new(&request.host).with_generator_version(env!("CARGO_PKG_VERSION"));
    if let Some(ref description) = request.description {
        writer = writer.with_description(description);
    }

    let summary = add_contents(&mut writer, &directory, &spec, &request.prefix)?;

    let mut report = CollectReport {
        command: "collect",
        generated_at: Utc::now(),
        root: request.root.display().to_string(),
        prefix: request.prefix.clone(),
        output: None,
        added: summary.added,
        skipped: summary.skipped,
        truncated: Vec::new(),
        bytes: 0,
        config: request.config.clone(),
    };

    if summary.added == 0 {
        warn!(root = %request.root.display(), "No files matched; bundle not written");
        return Ok((report, ExitCode::NothingCollected));
    }

    let manifest = writer.write(&request.output)?;
    report.output = Some(request.output.display().to_string());
    report.bytes = manifest.total_bytes();
    report.truncated = manifest.truncated_files().map(|f| f.path.clone()).collect();

    Ok((report, ExitCode::Clean))
}

// ============================================================================
// list
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ListedEntry {
    pub name: String,
    pub size_bytes: u64,
    /// Whether the size cap would cut this file short.
    pub over_cap: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListReport {
    pub command: &'static str,
    pub root: String,
    pub max_file_size: u64,
    pub entries: Vec<ListedEntry>,
}

impl Report for ListReport {
    fn summary(&self) -> String {
        let over = self.entries.iter().filter(|e| e.over_cap).count();
        format!(
            "[list] {} files would be collected from {} ({} over cap)",
            self.entries.len(),
            self.root,
            over
        )
    }

    fn markdown(&self) -> String {
        let mut md = format!(
            "## Files under `{}`\n\n| Name | Bytes | Truncated |\n|---|---:|---|\n",
            self.root
        );
        for entry in &self.entries {
            md.push_str(&format!(
                "| `{}` | {} | {} |\n",
                entry.name,
                entry.size_bytes,
                if entry.over_cap { "yes" } else { "" }
            ));
        }
        md
    }
}

/// Dry run: the archive names a collection pass would produce.
pub fn run_list(root: &Path, prefix: &str, options: &CollectionOptions) -> CommandResult<ListReport> {
    let spec = options.to_spec()?;
    let directory = ManagedDirectory::new(root);

    let entries = directory.with_lock(|root| {
        collect(root, &spec, prefix)
            .map(|entry| {
                let size_bytes = std::fs::metadata(&entry.path).map(|m| m.len()).unwrap_or(0);
                ListedEntry {
                    over_cap: size_bytes > entry.max_file_size,
                    name: entry.archive_name,
                    size_bytes,
                }
            })
            .collect::<Vec<_>>()
    });

    let code = if entries.is_empty() {
        ExitCode::NothingCollected
    } else {
        ExitCode::Clean
    };

    Ok((
        ListReport {
            command: "list",
            root: root.display().to_string(),
            max_file_size: spec.max_file_size(),
            entries,
        },
        code,
    ))
}

// ============================================================================
// verify
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub command: &'static str,
    pub bundle: String,
    pub host: String,
    pub created_at: DateTime<Utc>,
    pub files: usize,
    pub failures: Vec<String>,
    pub truncated: Vec<String>,
}

impl Report for VerifyReport {
    fn summary(&self) -> String {
        if self.failures.is_empty() {
            format!("[verify] {}: {} files OK", self.bundle, self.files)
        } else {
            format!(
                "[verify] {}: {} of {} files FAILED",
                self.bundle,
                self.failures.len(),
                self.files
            )
        }
    }

    fn markdown(&self) -> String {
        let mut md = format!(
            "## Bundle `{}`\n\n- Host: {}\n- Created: {}\n- Files: {}\n",
            self.bundle,
            self.host,
            self.created_at.to_rfc3339(),
            self.files
        );
        if self.failures.is_empty() {
            md.push_str("- Checksums: all verified\n");
        } else {
            md.push_str("\n### Checksum failures\n\n");
            for path in &self.failures {
                md.push_str(&format!("- `{}`\n", path));
            }
        }
        md
    }
}

/// Verify every entry of a bundle against its manifest checksums.
pub fn run_verify(bundle: &Path) -> CommandResult<VerifyReport> {
    let mut reader = BundleReader::open(bundle)?;
    let failures = reader.verify_all();
    let manifest = reader.manifest();

    let report = VerifyReport {
        command: "verify",
        bundle: bundle.display().to_string(),
        host: manifest.host.clone(),
        created_at: manifest.created_at,
        files: manifest.file_count(),
        truncated: manifest.truncated_files().map(|f| f.path.clone()).collect(),
        failures,
    };

    let code = if report.failures.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::VerifyFailed
    };
    Ok((report, code))
}

// ============================================================================
// prune
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PruneReport {
    pub command: &'static str,
    pub folder: String,
    pub keep: usize,
    pub pruned: Vec<PruneEvent>,
    pub remaining: Vec<String>,
}

impl Report for PruneReport {
    fn summary(&self) -> String {
        format!(
            "[prune] {}: removed {}, kept {} (cap {})",
            self.folder,
            self.pruned.iter().filter(|e| e.deleted).count(),
            self.remaining.len(),
            self.keep
        )
    }

    fn markdown(&self) -> String {
        let mut md = format!("## Pruned `{}` to {} files\n\n", self.folder, self.keep);
        if self.pruned.is_empty() {
            md.push_str("Nothing to prune.\n");
        }
        for event in &self.pruned {
            md.push_str(&format!(
                "- `{}` ({} bytes, modified {}){}\n",
                event.file_name,
                event.size_bytes,
                event.modified.to_rfc3339(),
                if event.deleted { "" } else { " **not deleted**" }
            ));
        }
        md
    }
}

/// Keep the newest `keep` files in `folder`, deleting the rest.
pub fn run_prune(folder: &Path, keep: usize) -> CommandResult<PruneReport> {
    if !folder.is_dir() {
        return Err(CommandFailure::new(
            ExitCode::ArgsError,
            format!("not a directory: {}", folder.display()),
        ));
    }

    let cap = FileListCap::new(folder, keep)?;
    let pruned = cap.prune()?;
    let remaining = cap.files()?;

    info!(
        folder = %folder.display(),
        pruned = pruned.len(),
        remaining = remaining.len(),
        "Prune complete"
    );

    let code = if pruned.iter().all(|e| e.deleted) {
        ExitCode::Clean
    } else {
        ExitCode::IoError
    };

    Ok((
        PruneReport {
            command: "prune",
            folder: folder.display().to_string(),
            keep,
            pruned,
            remaining,
        },
        code,
    ))
}

// ============================================================================
// version
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VersionReport {
    pub version: &'static str,
    pub bundle_version: &'static str,
    pub rust_version: &'static str,
}

impl VersionReport {
    pub fn current() -> Self {
        VersionReport {
            version: env!("CARGO_PKG_VERSION"),
            bundle_version: sb_bundle::BUNDLE_SCHEMA_VERSION,
            rust_version: env!("CARGO_PKG_RUST_VERSION"),
        }
    }
}

impl Report for VersionReport {
    fn summary(&self) -> String {
        format!("sb {} (bundle format {})", self.version, self.bundle_version)
    }

    fn markdown(&self) -> String {
        format!(
            "## sb {}\n\n- Bundle format: {}\n- Minimum Rust: {}\n",
            self.version, self.bundle_version, self.rust_version
        )
    }
}
