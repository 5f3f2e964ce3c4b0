//! Error types for photopi.
//!
//! Every crate keeps its own error enum close to the code that raises it;
//! they all convert into [`Error`] at the CLI boundary, which adds:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Remediation hints for humans
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "bundle",
//!   "message": "fragment directory already exists: /data/pp1/2024-01-01/p3",
//!   "context": { "path": "/data/pp1/2024-01-01/p3" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for photopi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse grouping of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file and storage node errors.
    Config,
    /// Fragment and completion-marker state errors.
    Bundle,
    /// Archive creation and extraction errors.
    Archive,
    /// External transfer failures.
    Transfer,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Bundle => write!(f, "bundle"),
            ErrorCategory::Archive => write!(f, "archive"),
            ErrorCategory::Transfer => write!(f, "transfer"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for photopi.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown storage node: {name}")]
    UnknownNode { name: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Bundle state errors (20-29)
    #[error("fragment directory already exists: {}", path.display())]
    FragmentExists { path: PathBuf },

    #[error("corrupt completion marker {}: {content:?}", path.display())]
    CorruptMarker { path: PathBuf, content: String },

    #[error("bundle error: {0}")]
    Bundle(String),

    // Archive errors (30-39)
    #[error("archive error: {0}")]
    Archive(String),

    // Transfer errors (40-49)
    #[error("transfer failed: {0}")]
    Transfer(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Numeric code reported in JSON errors.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Bundle state errors
    /// - 30-39: Archive errors
    /// - 40-49: Transfer errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownNode { .. } => 11,
            Error::InvalidArgument(_) => 12,
            Error::FragmentExists { .. } => 20,
            Error::CorruptMarker { .. } => 21,
            Error::Bundle(_) => 22,
            Error::Archive(_) => 30,
            Error::Transfer(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Which part of photopi the error comes from.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::UnknownNode { .. } | Error::InvalidArgument(_) => {
                ErrorCategory::Config
            }
            Error::FragmentExists { .. } | Error::CorruptMarker { .. } | Error::Bundle(_) => {
                ErrorCategory::Bundle
            }
            Error::Archive(_) => ErrorCategory::Archive,
            Error::Transfer(_) => ErrorCategory::Transfer,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// What the operator should try next.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Run 'photopi config validate' and check photopi.yaml.",
            Error::UnknownNode { .. } => {
                "List configured nodes with 'photopi config show' or add the node under storage_nodes."
            }
            Error::InvalidArgument(_) => "Check the command line; see 'photopi <command> --help'.",
            Error::FragmentExists { .. } => {
                "A fragment directory with this number is already on disk. Inspect it, then archive it with 'photopi zip --part N' or run 'photopi sweep'."
            }
            Error::CorruptMarker { .. } => {
                "The completion marker must hold a single decimal image index. Repair or remove it, then run 'photopi sweep'."
            }
            Error::Bundle(_) => "Inspect the bundle directory layout on the storage node.",
            Error::Archive(_) => {
                "The archive could not be read or written. Check free space and the archive file itself."
            }
            Error::Transfer(_) => {
                "The transfer tool reported a failure. Sources were left in place; retry the command."
            }
            Error::Io(_) => "Check disk space, permissions, and that the storage node is mounted.",
            Error::Json(_) => "Internal serialization failure. Report as a bug.",
        }
    }

    /// Title line for `format_error_human`.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::UnknownNode { .. } => "Unknown Storage Node",
            Error::InvalidArgument(_) => "Invalid Argument",
            Error::FragmentExists { .. } => "Fragment Already Exists",
            Error::CorruptMarker { .. } => "Corrupt Completion Marker",
            Error::Bundle(_) => "Bundle Error",
            Error::Archive(_) => "Archive Error",
            Error::Transfer(_) => "Transfer Failed",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// The `error` object of a failed command envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Coarse grouping of `code`.
    pub category: ErrorCategory,

    /// `Display` text of the error.
    pub message: String,

    /// Additional structured context (e.g., node name, path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::UnknownNode { name } => {
                context.insert("node".to_string(), serde_json::json!(name));
            }
            Error::FragmentExists { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            Error::CorruptMarker { path, content } => {
                context.insert("path".to_string(), serde_json::json!(path));
                context.insert("content".to_string(), serde_json::json!(content));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Compact JSON; never fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(
            Error::FragmentExists {
                path: PathBuf::from("/x/p1")
            }
            .code(),
            20
        );
        assert_eq!(Error::Transfer("rsync exited 23".into()).code(), 40);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::UnknownNode { name: "nas".into() }.category(),
            ErrorCategory::Config
        );
        assert_eq!(
            Error::CorruptMarker {
                path: PathBuf::from(".x.done"),
                content: "abc".into()
            }
            .category(),
            ErrorCategory::Bundle
        );
        assert_eq!(Error::Archive("bad gzip".into()).category(), ErrorCategory::Archive);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(Error::from(io).category(), ErrorCategory::Io);
    }

    #[test]
    fn test_structured_error_carries_context() {
        let err = Error::UnknownNode { name: "nas".into() };
        let structured = StructuredError::from(&err);

        assert_eq!(structured.code, 11);
        assert_eq!(structured.category, ErrorCategory::Config);
        assert_eq!(structured.context.get("node"), Some(&serde_json::json!("nas")));

        let json = structured.to_json();
        assert!(json.contains(r#""code":11"#));
        assert!(json.contains(r#""category":"config""#));
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::FragmentExists {
            path: PathBuf::from("/data/pp1/2024-01-01/p3"),
        };
        let formatted = format_error_human(&err, false);

        assert!(formatted.contains("Fragment Already Exists"));
        assert!(formatted.contains("/data/pp1/2024-01-01/p3"));
        assert!(formatted.contains("photopi sweep"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Transfer.to_string(), "transfer");
        assert_eq!(ErrorCategory::Bundle.to_string(), "bundle");
    }
}
