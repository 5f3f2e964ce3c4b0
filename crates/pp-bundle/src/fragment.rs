//! Fragment numbering and sealing.
//!
//! Sealing moves the oldest live images of a bundle into a fresh `p{N}`
//! working directory, which is what bounds every archive's size.

use pp_common::FragmentNumber;
use std::io::ErrorKind;
use tracing::{debug, info};

use crate::catalog::list_fragment_numbers;
use crate::error::{io_at, BundleError, Result};
use crate::layout::BundleRef;
use crate::store::list_images;

/// Default number of images per fragment.
pub const DEFAULT_MAX_FILES: usize = 1000;

/// Highest fragment number seen in archives or working directories, or
/// [`FragmentNumber::NONE`].
pub fn last_fragment_number(bundle: &BundleRef) -> Result<FragmentNumber> {
    Ok(list_fragment_numbers(bundle)?
        .last()
        .copied()
        .unwrap_or(FragmentNumber::NONE))
}

pub fn next_fragment_number(bundle: &BundleRef) -> Result<FragmentNumber> {
    Ok(last_fragment_number(bundle)?.next())
}

/// Move up to `max_files` of the lowest-indexed live images into the
/// working directory of `fragment`.
///
/// A `max_files` of 0 means [`DEFAULT_MAX_FILES`]. Returns `false` without
/// touching the disk when there are no live images. An existing working
/// directory is [`BundleError::FragmentExists`].
pub fn seal_batch(bundle: &BundleRef, fragment: FragmentNumber, max_files: usize) -> Result<bool> {
    let max_files = if max_files == 0 { DEFAULT_MAX_FILES } else { max_files };
    let images = list_images(&bundle.live_dir())?;
    if images.is_empty() {
        debug!(bundle = %bundle, "no live images to seal");
        return Ok(false);
    }

    let dir = bundle.fragment(fragment).dir();
    match std::fs::create_dir(&dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(BundleError::FragmentExists { path: dir });
        }
        Err(e) => return Err(io_at(&dir)(e)),
    }

    let batch = &images[..images.len().min(max_files)];
    for image in batch {
        let target = dir.join(image.file_name());
        std::fs::rename(&image.path, &target).map_err(io_at(&image.path))?;
    }

    info!(
        bundle = %bundle,
        fragment = %fragment,
        moved = batch.len(),
        remaining = images.len() - batch.len(),
        "sealed fragment"
    );
    Ok(true)
}
