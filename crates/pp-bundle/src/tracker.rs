//! Completion tracking: the highest image index archived so far.
//!
//! Resolution for a fragment, walking down from its number:
//! 1. a completion marker is authoritative;
//! 2. otherwise the highest image still in the working directory;
//! 3. fragment 0 with neither means the bundle is empty;
//! 4. otherwise continue with the preceding fragment.

use pp_common::ImageIndex;
use serde::{Serialize, Serializer};
use std::path::Path;
use tracing::trace;

use crate::error::{io_at, BundleError, Result};
use crate::fragment::last_fragment_number;
use crate::layout::{BundleRef, FragmentRef};
use crate::store::{list_images, write_once};

/// Highest image index known for a fragment or bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HighWater {
    Empty,
    Image(ImageIndex),
}

impl HighWater {
    /// Numeric form used in reports: `-1` when empty.
    pub fn to_legacy(self) -> i64 {
        match self {
            HighWater::Empty => -1,
            HighWater::Image(index) => i64::try_from(index.0).unwrap_or(i64::MAX),
        }
    }

    pub fn index(self) -> Option<ImageIndex> {
        match self {
            HighWater::Empty => None,
            HighWater::Image(index) => Some(index),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, HighWater::Empty)
    }
}

impl From<Option<ImageIndex>> for HighWater {
    fn from(index: Option<ImageIndex>) -> Self {
        index.map_or(HighWater::Empty, HighWater::Image)
    }
}

impl Serialize for HighWater {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_legacy())
    }
}

/// Read a completion marker. `Ok(None)` when it does not exist.
pub fn read_marker(path: &Path) -> Result<Option<ImageIndex>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_at(path)(e)),
    };
    content
        .trim()
        .parse::<u64>()
        .map(|n| Some(ImageIndex(n)))
        .map_err(|_| BundleError::CorruptMarker {
            path: path.to_path_buf(),
            content,
        })
}

/// Write a fragment's completion marker. Never overwrites; returns whether
/// this call created it.
pub fn write_marker(fragment: &FragmentRef, last: ImageIndex) -> Result<bool> {
    write_once(&fragment.marker_path(), last.0.to_string().as_bytes())
}

pub fn is_complete(fragment: &FragmentRef) -> bool {
    fragment.marker_path().is_file()
}

/// High water of `fragment`, falling back through earlier fragments.
pub fn fragment_high_water(fragment: &FragmentRef) -> Result<HighWater> {
    let mut current = fragment.clone();
    loop {
        if let Some(index) = read_marker(&current.marker_path())? {
            trace!(fragment = %current.number, index = index.0, "marker");
            return Ok(HighWater::Image(index));
        }
        if let Some(last) = list_images(&current.dir())?.last() {
            trace!(fragment = %current.number, index = last.index.0, "working images");
            return Ok(HighWater::Image(last.index));
        }
        match current.previous() {
            Some(prev) => current = prev,
            None => return Ok(HighWater::Empty),
        }
    }
}

/// High water of a whole bundle.
pub fn last_image_number(bundle: &BundleRef) -> Result<HighWater> {
    let last = last_fragment_number(bundle)?;
    if last.is_none() {
        let images = list_images(&bundle.live_dir())?;
        return Ok(images.last().map(|i| i.index).into());
    }
    fragment_high_water(&bundle.fragment(last))
}
