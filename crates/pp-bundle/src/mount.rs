//! Mount point verification for remote-backed storage nodes.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Answers whether a path lives on a mounted filesystem.
pub trait MountProbe {
    fn is_mounted(&self, path: &Path) -> bool;
}

/// Walks `path` and its ancestors (excluding `/`) looking for a mount point,
/// detected as a change of device id between a directory and its parent.
///
/// A path that does not exist yet is judged by its nearest existing
/// ancestor; nothing is created while probing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMountProbe;

impl MountProbe for FsMountProbe {
    fn is_mounted(&self, path: &Path) -> bool {
        let mut current: Option<PathBuf> = Some(absolute(path));
        while let Some(dir) = current {
            let Some(parent) = dir.parent() else {
                break;
            };
            if is_mount_point(&dir, parent) {
                debug!(path = %path.display(), mount = %dir.display(), "mount point found");
                return true;
            }
            current = Some(parent.to_path_buf());
        }
        debug!(path = %path.display(), "no mount point above path");
        false
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn is_mount_point(dir: &Path, parent: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    let (Ok(meta), Ok(parent_meta)) = (std::fs::metadata(dir), std::fs::metadata(parent)) else {
        return false;
    };
    meta.is_dir() && (meta.dev() != parent_meta.dev() || meta.ino() == parent_meta.ino())
}

#[cfg(not(unix))]
fn is_mount_point(_dir: &Path, _parent: &Path) -> bool {
    false
}

/// Probe with a fixed answer, for callers that skip verification.
#[derive(Debug, Clone, Copy)]
pub struct AssumeMounted(pub bool);

impl MountProbe for AssumeMounted {
    fn is_mounted(&self, _path: &Path) -> bool {
        self.0
    }
}
