//! Path construction for bundles and fragments.
//!
//! All paths derive from a node root plus (device, label, fragment); nothing
//! else in the crate joins path components by hand.

use pp_common::{ArtifactName, DeviceId, FragmentNumber, Label};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A bundle on one storage node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BundleRef {
    pub root: PathBuf,
    pub device: DeviceId,
    pub label: Label,
}

impl BundleRef {
    pub fn new(root: impl Into<PathBuf>, device: DeviceId, label: Label) -> Self {
        BundleRef {
            root: root.into(),
            device,
            label,
        }
    }

    /// `{root}/{device}`, home of archives and markers.
    pub fn device_dir(&self) -> PathBuf {
        self.root.join(self.device.as_str())
    }

    /// `{root}/{device}/{label}`, where live images land.
    pub fn live_dir(&self) -> PathBuf {
        self.device_dir().join(self.label.as_str())
    }

    pub fn fragment(&self, number: FragmentNumber) -> FragmentRef {
        FragmentRef {
            bundle: self.clone(),
            number,
        }
    }

    /// The same bundle on another node.
    pub fn on_node(&self, root: impl Into<PathBuf>) -> BundleRef {
        BundleRef::new(root, self.device.clone(), self.label.clone())
    }
}

impl fmt::Display for BundleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.live_dir().display())
    }
}

/// One fragment of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FragmentRef {
    pub bundle: BundleRef,
    pub number: FragmentNumber,
}

impl FragmentRef {
    /// Working directory `{root}/{device}/{label}/p{N}`.
    pub fn dir(&self) -> PathBuf {
        self.bundle
            .live_dir()
            .join(ArtifactName::fragment_dir(self.number).file_name())
    }

    pub fn archive_name(&self) -> String {
        ArtifactName::archive(&self.bundle.label, &self.bundle.device, self.number).file_name()
    }

    pub fn marker_name(&self) -> String {
        ArtifactName::marker(&self.bundle.label, &self.bundle.device, self.number).file_name()
    }

    pub fn archive_path(&self) -> PathBuf {
        self.bundle.device_dir().join(self.archive_name())
    }

    pub fn marker_path(&self) -> PathBuf {
        self.bundle.device_dir().join(self.marker_name())
    }

    /// Where this fragment's archive lives under another node root.
    pub fn archive_path_on(&self, root: &Path) -> PathBuf {
        root.join(self.bundle.device.as_str())
            .join(self.archive_name())
    }

    /// Where this fragment's marker lives under another node root.
    pub fn marker_path_on(&self, root: &Path) -> PathBuf {
        root.join(self.bundle.device.as_str())
            .join(self.marker_name())
    }

    /// The preceding fragment, or `None` at fragment 0.
    pub fn previous(&self) -> Option<FragmentRef> {
        self.number.prev().map(|n| self.bundle.fragment(n))
    }
}

impl fmt::Display for FragmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bundle, self.number)
    }
}
