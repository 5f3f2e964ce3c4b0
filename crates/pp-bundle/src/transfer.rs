//! File transfer between storage nodes.
//!
//! Transfers are synchronous and report a [`TransferOutcome`]; a non-zero exit
//! code is data, not an `Err`, so callers decide whether to continue.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{BundleError, Result};

/// Exit code reported by in-process transfers on failure.
pub const LOCAL_FAILURE_CODE: i32 = 1;

/// Exit code reported when the transfer program could not be started.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// What a transfer produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip)]
    pub duration: Duration,
}

impl TransferOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// An in-process failure, reported the same way as a failed program run.
    pub fn failed(exit_code: i32, stderr: impl Into<String>, duration: Duration) -> Self {
        TransferOutcome {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration,
        }
    }

    /// Turn a failed outcome into [`BundleError::Transfer`] for `path`.
    pub fn into_result(self, path: &Path) -> Result<TransferOutcome> {
        if self.success() {
            Ok(self)
        } else {
            Err(BundleError::Transfer {
                path: path.to_path_buf(),
                exit_code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Copy or move one file into a destination directory.
pub trait Transfer {
    /// Transfer `src` into `dest_dir`, keeping its file name. With
    /// `remove_source`, the source is removed only after the copy succeeded.
    fn transfer(&self, src: &Path, dest_dir: &Path, remove_source: bool) -> Result<TransferOutcome>;
}

/// Runs `rsync -rvh [--remove-source-files] SRC DEST/`.
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    program: PathBuf,
}

impl Default for RsyncTransfer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("rsync"),
        }
    }
}

impl RsyncTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(src: &Path, dest_dir: &Path, remove_source: bool) -> Vec<String> {
        let mut args = vec!["-rvh".to_string()];
        if remove_source {
            args.push("--remove-source-files".to_string());
        }
        args.push(src.display().to_string());
        let mut dest = dest_dir.display().to_string();
        if !dest.ends_with('/') {
            dest.push('/');
        }
        args.push(dest);
        args
    }
}

impl Transfer for RsyncTransfer {
    fn transfer(&self, src: &Path, dest_dir: &Path, remove_source: bool) -> Result<TransferOutcome> {
        let args = Self::args(src, dest_dir, remove_source);
        debug!(program = %self.program.display(), ?args, "running transfer");

        let start = Instant::now();
        let output = match Command::new(&self.program).args(&args).output() {
            Ok(output) => output,
            Err(e) => {
                warn!(program = %self.program.display(), error = %e, "failed to start transfer program");
                return Ok(TransferOutcome {
                    exit_code: SPAWN_FAILURE_CODE,
                    stdout: String::new(),
                    stderr: format!("failed to start {}: {}", self.program.display(), e),
                    duration: start.elapsed(),
                });
            }
        };

        Ok(TransferOutcome {
            // Killed by a signal: no exit code.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        })
    }
}

/// In-process transfer for nodes that share a filesystem namespace.
///
/// A move is a plain rename when source and destination share a
/// filesystem. Otherwise the file is copied to a temp name inside `dest_dir`
/// and renamed into place, so the destination never holds a half-written
/// file under the final name; the source is removed last.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransfer;

impl Transfer for LocalTransfer {
    fn transfer(&self, src: &Path, dest_dir: &Path, remove_source: bool) -> Result<TransferOutcome> {
        let start = Instant::now();
        let failed = |stderr: String| TransferOutcome::failed(LOCAL_FAILURE_CODE, stderr, start.elapsed());

        let Some(name) = src.file_name() else {
            return Ok(failed(format!("source has no file name: {}", src.display())));
        };
        if !src.is_file() {
            return Ok(failed(format!("source is not a file: {}", src.display())));
        }
        if !dest_dir.is_dir() {
            return Ok(failed(format!("destination is not a directory: {}", dest_dir.display())));
        }

        let dest = dest_dir.join(name);
        let done = || TransferOutcome {
            exit_code: 0,
            stdout: format!("{} -> {}", src.display(), dest.display()),
            stderr: String::new(),
            duration: start.elapsed(),
        };

        if remove_source {
            match std::fs::rename(src, &dest) {
                Ok(()) => return Ok(done()),
                Err(e) => debug!(src = %src.display(), error = %e, "rename failed; copying instead"),
            }
        }

        let mut tmp_name = name.to_owned();
        tmp_name.push(format!(".tmp.{}", std::process::id()));
        let tmp = dest_dir.join(tmp_name);

        if let Err(e) = std::fs::copy(src, &tmp) {
            let _ = std::fs::remove_file(&tmp);
            return Ok(failed(format!("copy {}: {}", src.display(), e)));
        }
        if let Err(e) = std::fs::rename(&tmp, &dest) {
            let _ = std::fs::remove_file(&tmp);
            return Ok(failed(format!("rename into {}: {}", dest.display(), e)));
        }
        if remove_source {
            if let Err(e) = std::fs::remove_file(src) {
                warn!(src = %src.display(), error = %e, "copied but source not removed");
                return Ok(failed(format!(
                    "copied to {} but could not remove {}: {}",
                    dest.display(),
                    src.display(),
                    e
                )));
            }
        }

        Ok(done())
    }
}
