//! Logging setup for the `sb` binary.
//!
//! Supports configuration via:
//! - Environment variables (SB_LOG, RUST_LOG, SB_LOG_FORMAT)
//! - CLI flags (-v, -q)
//!
//! stdout is reserved for command output; all logs go to stderr.

use std::io::IsTerminal;

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    /// Standard operational info (default).
    #[default]
    Info,
    Warn,
    Error,
    /// Completely silent.
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogConfig {
    /// Create config from the process environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_vars(
            std::env::var("SB_LOG").ok().as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
            std::env::var("SB_LOG_FORMAT").ok().as_deref(),
        )
        .with_overrides(cli_level, cli_format)
    }

    /// SB_LOG takes precedence over RUST_LOG. Unparseable values are ignored.
    pub fn from_vars(sb_log: Option<&str>, rust_log: Option<&str>, log_format: Option<&str>) -> Self {
        let mut config = LogConfig::default();

        if let Some(val) = sb_log {
            if let Ok(level) = val.parse::<LogLevel>() {
                config.level = level;
            }
        } else if let Some(val) = rust_log {
            // Coarse: the most verbose level mentioned anywhere wins.
            for level in [LogLevel::Trace, LogLevel::Debug, LogLevel::Warn, LogLevel::Error] {
                if val.contains(&level.to_string()) {
                    config.level = level;
                    break;
                }
            }
        }

        if let Some(format) = log_format.and_then(|val| val.parse::<LogFormat>().ok()) {
            config.format = format;
        }

        config
    }

    /// CLI overrides take final precedence.
    pub fn with_overrides(mut self, level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(format) = format {
            self.format = format;
        }
        self
    }

    /// Level selected by `-v` counts and `-q`.
    pub fn level_from_flags(verbose: u8, quiet: bool) -> Option<LogLevel> {
        if quiet {
            return Some(LogLevel::Error);
        }
        match verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }

    fn directives(&self) -> String {
        let level = self.level;
        format!("sb={level},sb_cli={level},sb_collect={level},sb_bundle={level}")
    }
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A RUST_LOG
/// filter, when set, replaces the level-derived directives.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);

            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("JSONL".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_sb_log_beats_rust_log() {
        let config = LogConfig::from_vars(Some("warn"), Some("trace"), None);
        assert_eq!(config.level, LogLevel::Warn);

        let config = LogConfig::from_vars(None, Some("sb_collect=debug"), Some("jsonl"));
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Jsonl);

        let config = LogConfig::from_vars(Some("loud"), None, Some("fancy"));
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn test_cli_overrides() {
        let config = LogConfig::from_vars(Some("warn"), None, None)
            .with_overrides(LogConfig::level_from_flags(2, false), None);
        assert_eq!(config.level, LogLevel::Trace);

        assert_eq!(LogConfig::level_from_flags(3, true), Some(LogLevel::Error));
        assert_eq!(LogConfig::level_from_flags(0, false), None);
    }

    #[test]
    fn test_directives_cover_all_crates() {
        let config = LogConfig::default().with_overrides(Some(LogLevel::Debug), None);
        let directives = config.directives();
        assert!(directives.contains("sb_collect=debug"));
        assert!(directives.contains("sb_bundle=debug"));
    }
}
