//! Archive container codec.
//!
//! Fragments are stored as gzip-compressed tarballs whose entries are the bare
//! image file names (no directory components).

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder};
use tracing::debug;

use crate::error::{io_at, BundleError, Result};

/// Create, list, and extract archive containers.
pub trait ArchiveCodec {
    /// Write `archive` containing `members`, each stored under its file name.
    fn create(&self, archive: &Path, members: &[PathBuf]) -> Result<()>;

    /// Entry names in archive order.
    fn list(&self, archive: &Path) -> Result<Vec<String>>;

    /// Extract every regular file into `dest`, returning the extracted paths
    /// in archive order.
    fn extract(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>>;
}

/// `tar` + gzip codec.
#[derive(Debug, Clone, Copy)]
pub struct TarGzCodec {
    level: Compression,
}

impl Default for TarGzCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl TarGzCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// JPEGs barely compress; a faster level is usually the better trade.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl ArchiveCodec for TarGzCodec {
    fn create(&self, archive: &Path, members: &[PathBuf]) -> Result<()> {
        let file = File::create(archive).map_err(io_at(archive))?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.level);
        let mut builder = Builder::new(encoder);

        for member in members {
            let name = member
                .file_name()
                .ok_or_else(|| BundleError::archive(archive, format!("member without file name: {}", member.display())))?;
            builder
                .append_path_with_name(member, name)
                .map_err(|e| BundleError::archive(archive, format!("add {}: {}", member.display(), e)))?;
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| BundleError::archive(archive, format!("finish tar: {}", e)))?;
        let writer = encoder
            .finish()
            .map_err(|e| BundleError::archive(archive, format!("finish gzip: {}", e)))?;
        let file = writer
            .into_inner()
            .map_err(|e| BundleError::archive(archive, format!("flush: {}", e.error())))?;
        file.sync_all().map_err(io_at(archive))?;

        debug!(archive = %archive.display(), members = members.len(), "archive written");
        Ok(())
    }

    fn list(&self, archive: &Path) -> Result<Vec<String>> {
        let mut tar = open(archive)?;
        let mut names = Vec::new();
        for entry in tar.entries().map_err(|e| BundleError::archive(archive, e))? {
            let entry = entry.map_err(|e| BundleError::archive(archive, e))?;
            let path = entry.path().map_err(|e| BundleError::archive(archive, e))?;
            names.push(path.to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn extract(&self, archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dest).map_err(io_at(dest))?;
        let mut tar = open(archive)?;
        let mut extracted = Vec::new();

        for entry in tar.entries().map_err(|e| BundleError::archive(archive, e))? {
            let mut entry = entry.map_err(|e| BundleError::archive(archive, e))?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .map_err(|e| BundleError::archive(archive, e))?
                .to_path_buf();
            // unpack_in refuses entries that would escape `dest`
            let unpacked = entry
                .unpack_in(dest)
                .map_err(|e| BundleError::archive(archive, format!("unpack {}: {}", rel.display(), e)))?;
            if unpacked {
                extracted.push(dest.join(rel));
            }
        }
        Ok(extracted)
    }
}

fn open(archive: &Path) -> Result<Archive<GzDecoder<BufReader<File>>>> {
    let file = File::open(archive).map_err(io_at(archive))?;
    Ok(Archive::new(GzDecoder::new(BufReader::new(file))))
}
