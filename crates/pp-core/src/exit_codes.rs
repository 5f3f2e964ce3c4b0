//! Exit codes for the photopi CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-9: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use pp_common::Error;

/// Exit codes for photopi operations.
///
/// These codes are a stable contract for cron jobs and wrapper scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-9)
    // ========================================================================
    /// Nothing to do
    Clean = 0,

    /// Work performed (fragments archived, files placed or transferred)
    WorkDone = 1,

    /// Some steps failed; the rest completed
    PartialFail = 3,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Missing or invalid configuration, unknown storage node
    ConfigError = 11,

    /// On-disk state forbids the operation (fragment directory exists,
    /// corrupt marker)
    PreconditionError = 15,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0 and 1.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean | ExitCode::WorkDone)
    }

    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::WorkDone => "OK_WORK_DONE",
            ExitCode::PartialFail => "ERR_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::PreconditionError => "ERR_PRECONDITION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// `WorkDone` when `did_work`, otherwise `Clean`.
    pub fn from_work(did_work: bool) -> Self {
        if did_work {
            ExitCode::WorkDone
        } else {
            ExitCode::Clean
        }
    }

    /// Exit code for an error that aborted a command.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::InvalidArgument(_) => ExitCode::ArgsError,
            Error::Config(_) | Error::UnknownNode { .. } => ExitCode::ConfigError,
            Error::FragmentExists { .. } | Error::CorruptMarker { .. } => ExitCode::PreconditionError,
            Error::Transfer(_) => ExitCode::PartialFail,
            Error::Io(_) | Error::Archive(_) => ExitCode::IoError,
            Error::Bundle(_) | Error::Json(_) => ExitCode::InternalError,
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
