//! Error types for bundle operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during bundle operations.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error on a specific path
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The next fragment directory is already on disk. Never retried.
    #[error("fragment directory already exists: {}", path.display())]
    FragmentExists { path: PathBuf },

    /// A completion marker exists but does not hold a decimal image index
    #[error("corrupt completion marker {}: {content:?}", path.display())]
    CorruptMarker { path: PathBuf, content: String },

    /// Archive could not be created, listed, or extracted
    #[error("archive error for {}: {message}", path.display())]
    Archive { path: PathBuf, message: String },

    /// The transfer primitive reported failure
    #[error("transfer of {} failed (exit code {exit_code}): {stderr}", path.display())]
    Transfer {
        path: PathBuf,
        exit_code: i32,
        stderr: String,
    },
}

impl BundleError {
    pub(crate) fn archive(path: &Path, message: impl std::fmt::Display) -> Self {
        BundleError::Archive {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Whether this error must stop a multi-bundle run instead of being
    /// recorded and skipped.
    pub fn is_hard_stop(&self) -> bool {
        matches!(self, BundleError::FragmentExists { .. })
    }
}

/// Adapter for `map_err` on I/O results.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> BundleError + '_ {
    move |source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl From<BundleError> for pp_common::Error {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::Io { path, source } => pp_common::Error::Io(std::io::Error::new(
                source.kind(),
                format!("{}: {}", path.display(), source),
            )),
            BundleError::FragmentExists { path } => pp_common::Error::FragmentExists { path },
            BundleError::CorruptMarker { path, content } => {
                pp_common::Error::CorruptMarker { path, content }
            }
            err @ BundleError::Archive { .. } => pp_common::Error::Archive(err.to_string()),
            err @ BundleError::Transfer { .. } => pp_common::Error::Transfer(err.to_string()),
        }
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
