//! Fragment archiving.
//!
//! The on-disk sequence for one fragment is:
//! 1. write `<archive>.partial` and rename it to the final archive name;
//! 2. delete the archived images from the working directory;
//! 3. write the completion marker (write-once).
//!
//! A crash between any two steps leaves a state that [`archive_fragment`]
//! (residual images next to a finished archive) or [`recover`] (archive with
//! no images and no marker) completes on the next run.

use pp_common::{ArtifactName, ImageIndex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::codec::ArchiveCodec;
use crate::error::{io_at, Result};
use crate::layout::FragmentRef;
use crate::store::{list_images, remove_file_if_exists};
use crate::tracker::{is_complete, read_marker, write_marker, HighWater};

/// Suffix of an archive that is still being written.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Result of archiving one fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveOutcome {
    pub fragment: FragmentRef,
    pub archive: PathBuf,
    pub marker: PathBuf,
    /// Images removed from the working directory.
    pub images: usize,
    pub last_image: HighWater,
    /// The archive already existed and only the cleanup was redone.
    pub resumed: bool,
}

/// Archive the working images of `fragment` into `archive`.
///
/// `archive` is normally [`FragmentRef::archive_path`] but may live on another
/// node; the marker always goes next to the local archive path. Returns
/// `Ok(None)` when the working directory holds no images.
pub fn archive_fragment(
    codec: &dyn ArchiveCodec,
    fragment: &FragmentRef,
    archive: &Path,
) -> Result<Option<ArchiveOutcome>> {
    let images = list_images(&fragment.dir())?;
    let Some(newest) = images.last() else {
        return Ok(None);
    };

    let (last, resumed) = if archive.is_file() {
        let archived = max_image_index(&codec.list(archive)?);
        let last = archived.map_or(newest.index, |a| a.max(newest.index));
        warn!(
            archive = %archive.display(),
            residual = images.len(),
            "archive already present; finishing interrupted fragment"
        );
        (last, true)
    } else {
        if let Some(parent) = archive.parent() {
            std::fs::create_dir_all(parent).map_err(io_at(parent))?;
        }
        let partial = partial_path(archive);
        let members: Vec<PathBuf> = images.iter().map(|i| i.path.clone()).collect();
        codec.create(&partial, &members)?;
        std::fs::rename(&partial, archive).map_err(io_at(archive))?;
        (newest.index, false)
    };

    for image in &images {
        remove_file_if_exists(&image.path)?;
    }

    // An existing marker wins over what this run computed.
    let last = if write_marker(fragment, last)? {
        last
    } else {
        let recorded = read_marker(&fragment.marker_path())?.unwrap_or(last);
        warn!(
            marker = %fragment.marker_path().display(),
            recorded = recorded.0,
            computed = last.0,
            "completion marker already present; left unchanged"
        );
        recorded
    };

    info!(
        fragment = %fragment,
        archive = %archive.display(),
        images = images.len(),
        last_image = last.0,
        resumed,
        "archived fragment"
    );

    Ok(Some(ArchiveOutcome {
        fragment: fragment.clone(),
        archive: archive.to_path_buf(),
        marker: fragment.marker_path(),
        images: images.len(),
        last_image: HighWater::Image(last),
        resumed,
    }))
}

/// Write the missing marker of an archived fragment from the archive's own
/// entry names.
///
/// Only acts when the local archive exists, the marker does not, and the
/// working directory is empty; returns the recovered index in that case.
pub fn recover(codec: &dyn ArchiveCodec, fragment: &FragmentRef) -> Result<Option<ImageIndex>> {
    recover_from(codec, fragment, &fragment.archive_path())
}

/// Like [`recover`], reading the archive at `archive`, which may live on
/// another node (an archive written straight to its destination). The
/// marker is still written locally.
pub fn recover_from(
    codec: &dyn ArchiveCodec,
    fragment: &FragmentRef,
    archive: &Path,
) -> Result<Option<ImageIndex>> {
    if is_complete(fragment) || !archive.is_file() {
        return Ok(None);
    }
    if !list_images(&fragment.dir())?.is_empty() {
        return Ok(None);
    }

    let Some(last) = max_image_index(&codec.list(archive)?) else {
        warn!(archive = %archive.display(), "archive holds no images; marker not written");
        return Ok(None);
    };

    write_marker(fragment, last)?;
    info!(fragment = %fragment, last_image = last.0, "recovered completion marker");
    Ok(Some(last))
}

fn partial_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn max_image_index(entries: &[String]) -> Option<ImageIndex> {
    entries
        .iter()
        .filter_map(|e| {
            let name = Path::new(e).file_name()?.to_str()?;
            ArtifactName::parse(name)?.image_index()
        })
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TarGzCodec;
    use crate::layout::BundleRef;
    use pp_common::{DeviceId, FragmentNumber, Label};
    use std::fs;
    use tempfile::TempDir;

    fn sealed_fragment(root: &Path, indices: &[u64]) -> FragmentRef {
        let b = BundleRef::new(root, DeviceId::from("pp1"), Label::from("2024-01-01"));
        let f = b.fragment(FragmentNumber(1));
        fs::create_dir_all(f.dir()).unwrap();
        for i in indices {
            let name = ArtifactName::image(ImageIndex(*i)).file_name();
            fs::write(f.dir().join(name), format!("jpeg {}", i)).unwrap();
        }
        f
    }

    #[test]
    fn test_archive_writes_archive_then_marker() {
        let tmp = TempDir::new().unwrap();
        let f = sealed_fragment(tmp.path(), &[1, 2, 3]);
        let codec = TarGzCodec::new();

        let outcome = archive_fragment(&codec, &f, &f.archive_path())
            .unwrap()
            .unwrap();

        assert_eq!(outcome.images, 3);
        assert!(!outcome.resumed);
        assert!(f.archive_path().is_file());
        assert!(!partial_path(&f.archive_path()).exists());
        assert!(list_images(&f.dir()).unwrap().is_empty());
        assert_eq!(fs::read_to_string(f.marker_path()).unwrap(), "3");
    }

    #[test]
    fn test_nothing_to_archive() {
        let tmp = TempDir::new().unwrap();
        let f = sealed_fragment(tmp.path(), &[]);
        let codec = TarGzCodec::new();
        assert!(archive_fragment(&codec, &f, &f.archive_path())
            .unwrap()
            .is_none());
        assert!(!f.archive_path().exists());
        assert!(!f.marker_path().exists());
    }

    #[test]
    fn test_resume_after_crash_before_cleanup() {
        let tmp = TempDir::new().unwrap();
        let f = sealed_fragment(tmp.path(), &[4, 5, 6]);
        let codec = TarGzCodec::new();

        // Archive exists with all three images, then only 4 was deleted.
        let members: Vec<PathBuf> = list_images(&f.dir())
            .unwrap()
            .into_iter()
            .map(|i| i.path)
            .collect();
        codec.create(&f.archive_path(), &members).unwrap();
        fs::remove_file(&members[0]).unwrap();
        let before = fs::read(f.archive_path()).unwrap();

        let outcome = archive_fragment(&codec, &f, &f.archive_path())
            .unwrap()
            .unwrap();

        assert!(outcome.resumed);
        assert_eq!(outcome.images, 2);
        assert_eq!(fs::read(f.archive_path()).unwrap(), before);
        assert_eq!(read_marker(&f.marker_path()).unwrap(), Some(ImageIndex(6)));
    }

    #[test]
    fn test_recover_missing_marker() {
        let tmp = TempDir::new().unwrap();
        let f = sealed_fragment(tmp.path(), &[7, 8]);
        let codec = TarGzCodec::new();

        archive_fragment(&codec, &f, &f.archive_path()).unwrap();
        fs::remove_file(f.marker_path()).unwrap();

        assert_eq!(recover(&codec, &f).unwrap(), Some(ImageIndex(8)));
        assert_eq!(read_marker(&f.marker_path()).unwrap(), Some(ImageIndex(8)));
        // Second call is a no-op once the marker is back.
        assert_eq!(recover(&codec, &f).unwrap(), None);
    }

    #[test]
    fn test_existing_marker_is_reported_over_computed_value() {
        let tmp = TempDir::new().unwrap();
        let f = sealed_fragment(tmp.path(), &[3, 9]);
        fs::write(f.marker_path(), "5").unwrap();
        let codec = TarGzCodec::new();

        let outcome = archive_fragment(&codec, &f, &f.archive_path())
            .unwrap()
            .unwrap();

        assert_eq!(outcome.last_image, HighWater::Image(ImageIndex(5)));
        assert_eq!(fs::read_to_string(f.marker_path()).unwrap(), "5");
    }

    #[test]
    fn test_recover_from_archive_on_other_node() {
        let tmp = TempDir::new().unwrap();
        let f = sealed_fragment(&tmp.path().join("local"), &[11, 12]);
        let remote = f.archive_path_on(&tmp.path().join("nas"));
        let codec = TarGzCodec::new();

        archive_fragment(&codec, &f, &remote).unwrap();
        fs::remove_file(f.marker_path()).unwrap();

        assert_eq!(recover(&codec, &f).unwrap(), None);
        assert_eq!(recover_from(&codec, &f, &remote).unwrap(), Some(ImageIndex(12)));
        assert_eq!(read_marker(&f.marker_path()).unwrap(), Some(ImageIndex(12)));
    }

    #[test]
    fn test_max_image_index_ignores_foreign_entries() {
        let entries = vec![
            "image000010.jpg".to_string(),
            "notes.txt".to_string(),
            "p1/image000012.jpg".to_string(),
        ];
        assert_eq!(max_image_index(&entries), Some(ImageIndex(12)));
        assert_eq!(max_image_index(&[]), None);
    }
}
