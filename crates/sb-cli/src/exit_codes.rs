//! Exit codes for the `sb` CLI.
//!
//! Exit code ranges:
//! - 0-9: Success/operational outcomes
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

/// Exit codes for `sb` operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    /// Nothing matched; no bundle written
    NothingCollected = 1,

    /// Bundle opened but some entries failed verification
    VerifyFailed = 2,

    /// Invalid arguments
    ArgsError = 10,

    /// Config file unreadable, malformed, or invalid
    ConfigError = 11,

    /// Bundle missing, not a zip, or has a bad manifest
    BundleError = 12,

    /// Internal error (bug - please report)
    InternalError = 20,

    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Codes 10 and up need attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NothingCollected => "OK_EMPTY",
            ExitCode::VerifyFailed => "ERR_VERIFY",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::BundleError => "ERR_BUNDLE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&sb_collect::CollectError> for ExitCode {
    fn from(err: &sb_collect::CollectError) -> Self {
        match err {
            e if e.is_configuration() => ExitCode::ConfigError,
            sb_collect::CollectError::Io(_) => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

impl From<&sb_bundle::BundleError> for ExitCode {
    fn from(err: &sb_bundle::BundleError) -> Self {
        match err {
            sb_bundle::BundleError::Io(_) => ExitCode::IoError,
            sb_bundle::BundleError::EmptyBundle => ExitCode::NothingCollected,
            sb_bundle::BundleError::ChecksumMismatch { .. } => ExitCode::VerifyFailed,
            _ => ExitCode::BundleError,
        }
    }
}
