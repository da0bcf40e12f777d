//! Selective file collection for support bundles.
//!
//! This crate walks a directory tree, filters files with Ant-style include
//! and exclude patterns, and hands each match to a [`Sink`] (typically a
//! bundle writer) while holding the directory's guard, so a concurrent
//! pruner cannot delete a file mid-pass.
//!
//! # Filtering
//!
//! A file is collected when all of these hold:
//! - its depth below the root is at most `max_depth` (root files are depth 0)
//! - its name ends with the allowed suffix, when one is set
//! - it matches an include pattern, or the include list is empty
//! - it matches no exclude pattern
//!
//! Patterns are matched against the `/`-separated path relative to the root.
//!
//! # Example
//!
//! ```no_run
//! use sb_collect::{add_contents, CollectionSpec, ManagedDirectory, MemorySink};
//!
//! let dir = ManagedDirectory::new("/var/lib/builds/42");
//! let spec = CollectionSpec::new("**/*.xml", "workflow*/**", true, 10).unwrap();
//!
//! let mut sink = MemorySink::new();
//! let summary = add_contents(&mut sink, &dir, &spec, "items/job/builds/42").unwrap();
//! println!("{} files collected", summary.added);
//! ```

pub mod collector;
pub mod component;
pub mod contents;
pub mod error;
pub mod file_list_cap;
pub mod guard;
pub mod options;
pub mod pattern;
pub mod sink;
pub mod spec;

pub use collector::{archive_name, collect, CollectedEntry, Collector};
pub use component::{
    run_prefix, Component, FileContributor, FileListCapComponent, Permission,
    RunDirectoryComponent,
};
pub use contents::{add_contents, PassSummary};
pub use error::{CollectError, Result, SinkError};
pub use file_list_cap::{FileListCap, PruneEvent};
pub use guard::ManagedDirectory;
pub use options::CollectionOptions;
pub use pattern::PatternSet;
pub use sink::{MemorySink, Sink};
pub use spec::{CollectionSpec, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FILE_SIZE};
