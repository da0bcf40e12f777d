//! Output formats and command reports.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::exit_codes::ExitCode;

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON (default)
    #[default]
    Json,

    /// One-line summary for quick status checks
    Summary,

    /// Human-readable Markdown
    Md,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Summary => write!(f, "summary"),
            OutputFormat::Md => write!(f, "md"),
        }
    }
}

/// Something a command prints on stdout.
pub trait Report: Serialize {
    /// Single line for `--format summary`.
    fn summary(&self) -> String;

    /// Markdown body for `--format md`.
    fn markdown(&self) -> String;
}

/// Render a report in the requested format.
pub fn render<R: Report>(report: &R, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}")),
        OutputFormat::Summary => report.summary(),
        OutputFormat::Md => report.markdown(),
    }
}

/// Failure report printed instead of a command result.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub command: String,
    pub code: &'static str,
    pub exit_code: i32,
    pub message: String,
}

impl ErrorReport {
    pub fn new(command: &str, code: ExitCode, message: impl Into<String>) -> Self {
        ErrorReport {
            command: command.to_string(),
            code: code.code_name(),
            exit_code: code.as_i32(),
            message: message.into(),
        }
    }
}

impl Report for ErrorReport {
    fn summary(&self) -> String {
        format!("[{}] {}: {}", self.code, self.command, self.message)
    }

    fn markdown(&self) -> String {
        format!("## {} failed\n\n`{}`: {}\n", self.command, self.code, self.message)
    }
}
