//! Bundle, fragment, and image identity types.
//!
//! A bundle is identified by (device, label, storage node). Fragments within a
//! bundle are numbered from 1; images carry a monotonically increasing index.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the capturing device (one top-level directory per node).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Device ids become path components and the middle segment of archive
    /// names, so they must be non-empty and free of `.` and `/`.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(['.', '/', '\\'])
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId(s.to_string())
    }
}

/// Capture session label, usually a `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub String);

impl Label {
    pub fn new(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    /// Today's date in local time, the label used when none is given.
    pub fn today() -> Self {
        Label(chrono::Local::now().format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_string())
    }
}

/// Fragment ("part") number within a bundle.
///
/// `0` is reserved for "no fragment yet"; real fragments start at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FragmentNumber(pub u32);

impl FragmentNumber {
    pub const NONE: FragmentNumber = FragmentNumber(0);
    pub const FIRST: FragmentNumber = FragmentNumber(1);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn next(self) -> Self {
        FragmentNumber(self.0 + 1)
    }

    /// The preceding fragment, or `None` when already at 0.
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(FragmentNumber)
    }
}

impl fmt::Display for FragmentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl From<u32> for FragmentNumber {
    fn from(n: u32) -> Self {
        FragmentNumber(n)
    }
}

/// Index embedded in an image file name (`image000042.jpg` → 42).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageIndex(pub u64);

impl fmt::Display for ImageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ImageIndex {
    fn from(n: u64) -> Self {
        ImageIndex(n)
    }
}
