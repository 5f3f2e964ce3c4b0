//! Filesystem access for one storage node.
//!
//! The directory tree is the only state photopi keeps. [`BundleStore`] wraps a
//! node root; the free functions here list images and directory entries and
//! perform the write-once marker writes.

use pp_common::{ArtifactName, DeviceId, ImageIndex, Label};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{io_at, Result};
use crate::layout::BundleRef;

/// A storage node root.
#[derive(Debug, Clone)]
pub struct BundleStore {
    root: PathBuf,
}

impl BundleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle(&self, device: DeviceId, label: Label) -> BundleRef {
        BundleRef::new(self.root.clone(), device, label)
    }

    /// Device directories under the root, sorted. A missing root has none.
    pub fn devices(&self) -> Result<Vec<DeviceId>> {
        Ok(list_entries(&self.root)?
            .into_iter()
            .filter(|e| e.is_dir && !e.name.starts_with('.'))
            .map(|e| DeviceId::new(e.name))
            .collect())
    }
}

/// An image file found in a live or fragment directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub index: ImageIndex,
    pub path: PathBuf,
}

impl ImageFile {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// A directory entry with a UTF-8 name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Entries of `dir` sorted by name. A missing directory yields no entries;
/// names that are not valid UTF-8 are skipped.
pub fn list_entries(dir: &Path) -> Result<Vec<DirEntryInfo>> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_at(dir)(e)),
    };

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(io_at(dir))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        entries.push(DirEntryInfo {
            name,
            path: entry.path(),
            is_dir,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Image files directly inside `dir`, ascending by index.
pub fn list_images(dir: &Path) -> Result<Vec<ImageFile>> {
    let mut images: Vec<ImageFile> = list_entries(dir)?
        .into_iter()
        .filter(|e| !e.is_dir)
        .filter_map(|e| {
            ArtifactName::parse(&e.name)
                .and_then(|n| n.image_index())
                .map(|index| ImageFile {
                    index,
                    path: e.path,
                })
        })
        .collect();
    images.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path)));
    Ok(images)
}

/// Write `data` to `path` only if nothing is there yet.
///
/// Returns `false` (and leaves the existing file untouched) when `path`
/// already exists.
pub fn write_once(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let tmp = temp_sibling(path);
    write_file(&tmp, data)?;

    let linked = match fs::hard_link(&tmp, path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        // Filesystems without hard links (CIFS, FAT) get a plain rename.
        Err(_) if !path.exists() => fs::rename(&tmp, path).map(|_| true).map_err(io_at(path)),
        Err(e) => Err(io_at(path)(e)),
    };

    if tmp.exists() {
        if let Err(e) = fs::remove_file(&tmp) {
            debug!(path = %tmp.display(), error = %e, "failed to remove temp file");
        }
    }
    linked
}

/// Remove a file, treating "already gone" as success.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_at(path)(e)),
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path).map_err(io_at(path))?;
    file.write_all(data).map_err(io_at(path))?;
    file.sync_all().map_err(io_at(path))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("photopi");
    path.with_file_name(format!("{}.tmp.{}", file_name, std::process::id()))
}
