//! Reassembly of a bundle's archives into one flat image directory.
//!
//! Each archive is extracted into its own staging directory under
//! `<dest>/tmp`, then JPEG files are moved flat into `<dest>`. A file name
//! can be placed at most once per run; later copies stay in staging and are
//! reported as duplicates.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::catalog::list_archives;
use crate::codec::ArchiveCodec;
use crate::error::{io_at, Result};
use crate::layout::BundleRef;
use crate::store::list_entries;

/// Name of the staging directory inside the destination.
pub const STAGING_DIR: &str = "tmp";

/// An archive that could not be (fully) extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionFailure {
    pub archive: PathBuf,
    pub message: String,
}

/// A staged file that could not be inspected or moved into place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementFailure {
    pub file: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandReport {
    pub destination: PathBuf,
    /// Archives processed.
    pub archives: usize,
    /// JPEG files found in staging.
    pub extracted: usize,
    pub extraction_failures: Vec<ExtractionFailure>,
    /// Files moved into the destination.
    pub placed: usize,
    /// Staging paths of rejected same-name copies.
    pub duplicates: Vec<PathBuf>,
    /// Files skipped because the destination already had that name.
    pub already_present: usize,
    pub empty_skipped: usize,
    /// Files left in staging because they could not be placed.
    pub placement_failures: Vec<PlacementFailure>,
}

impl ExpandReport {
    pub fn success(&self) -> bool {
        self.extraction_failures.is_empty() && self.placement_failures.is_empty()
    }

    fn placement_failed(&mut self, file: &Path, message: String) {
        error!(file = %file.display(), error = %message, "cannot place image");
        self.placement_failures.push(PlacementFailure {
            file: file.to_path_buf(),
            message,
        });
    }
}

/// Expand every archive of `bundle` into `dest`.
pub fn expand_bundle(codec: &dyn ArchiveCodec, bundle: &BundleRef, dest: &Path) -> Result<ExpandReport> {
    let archives = list_archives(bundle, false)?;
    let staging = dest.join(STAGING_DIR);
    std::fs::create_dir_all(&staging).map_err(io_at(&staging))?;

    let mut report = ExpandReport {
        destination: dest.to_path_buf(),
        archives: archives.len(),
        ..Default::default()
    };
    info!(bundle = %bundle, archives = archives.len(), dest = %dest.display(), "expanding bundle");

    let mut stage_dirs = Vec::with_capacity(archives.len());
    for archive in &archives {
        let stage = staging.join(stage_name(&archive.path));
        debug!(archive = %archive.path.display(), stage = %stage.display(), "extracting");
        if let Err(e) = codec.extract(&archive.path, &stage) {
            // Whatever was unpacked before the failure is still placed.
            error!(archive = %archive.path.display(), error = %e, "extraction failed");
            report.extraction_failures.push(ExtractionFailure {
                archive: archive.path.clone(),
                message: e.to_string(),
            });
        }
        stage_dirs.push(stage);
    }

    let mut seen: HashSet<String> = HashSet::new();
    for stage in &stage_dirs {
        for candidate in jpeg_files(stage)? {
            report.extracted += 1;
            place(&candidate, dest, &mut seen, &mut report);
        }
    }

    info!(
        placed = report.placed,
        duplicates = report.duplicates.len(),
        already_present = report.already_present,
        empty = report.empty_skipped,
        failures = report.extraction_failures.len(),
        placement_failures = report.placement_failures.len(),
        "expand finished"
    );
    Ok(report)
}

/// Move one staged file into `dest`. Errors are recorded on the report and
/// leave the file in staging.
fn place(candidate: &Path, dest: &Path, seen: &mut HashSet<String>, report: &mut ExpandReport) {
    let Some(name) = candidate.file_name().and_then(|n| n.to_str()) else {
        return;
    };

    let size = match std::fs::metadata(candidate) {
        Ok(meta) => meta.len(),
        Err(e) => {
            report.placement_failed(candidate, e.to_string());
            return;
        }
    };
    if size == 0 {
        info!(file = name, "empty image; skipping");
        report.empty_skipped += 1;
        return;
    }

    if seen.contains(name) {
        warn!(file = name, path = %candidate.display(), "duplicate file name; left in staging");
        report.duplicates.push(candidate.to_path_buf());
        return;
    }

    let target = dest.join(name);
    if target.exists() {
        debug!(file = name, "already present; skipping");
        report.already_present += 1;
        seen.insert(name.to_string());
        return;
    }

    if let Err(e) = std::fs::rename(candidate, &target) {
        report.placement_failed(candidate, format!("move to {}: {}", target.display(), e));
        return;
    }
    seen.insert(name.to_string());
    report.placed += 1;
}

/// Staging subdirectory for an archive: its file name without `.tar.gz`.
fn stage_name(archive: &Path) -> String {
    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("archive");
    name.strip_suffix(pp_common::naming::ARCHIVE_SUFFIX)
        .unwrap_or(name)
        .to_string()
}

/// `*.jpg` files below `dir`, in sorted path order.
fn jpeg_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in list_entries(&current)? {
            if entry.is_dir {
                pending.push(entry.path);
            } else if entry.name.ends_with(pp_common::naming::IMAGE_EXTENSION) {
                out.push(entry.path);
            }
        }
    }
    out.sort();
    Ok(out)
}
