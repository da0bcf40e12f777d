//! Support bundle CLI library.
//!
//! Shared pieces of the `sb` binary: config resolution, logging setup,
//! exit codes, output rendering, and the command implementations.

pub mod commands;
pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod output;

pub use config::{ConfigEnv, ConfigError, ConfigResolver, OptionOverrides};
pub use exit_codes::ExitCode;
pub use output::OutputFormat;
