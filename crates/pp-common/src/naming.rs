//! On-disk artifact naming.
//!
//! Every file and directory name the bundle layer reads or writes goes through
//! [`ArtifactName`], so the conventions live in exactly one place:
//!
//! ```text
//! {node}/{device}/{label}.{device}.p{N}.tar.gz     archive
//! {node}/{device}/.{label}.{device}.p{N}.done      completion marker
//! {node}/{device}/{label}/p{N}/                    fragment working directory
//! {node}/{device}/{label}/image{000042}.jpg        live image
//! ```
//!
//! Device ids never contain `.`, so an archive stem splits unambiguously from
//! the right: `p{N}`, then the device, and the remainder is the label.

use crate::id::{DeviceId, FragmentNumber, ImageIndex, Label};
use regex::Regex;
use std::sync::OnceLock;

/// Suffix of fragment archives.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Suffix of completion markers (which are also dot-prefixed).
pub const MARKER_SUFFIX: &str = ".done";

/// Image file prefix.
pub const IMAGE_PREFIX: &str = "image";

/// Image file extension, including the dot.
pub const IMAGE_EXTENSION: &str = ".jpg";

/// Zero-padding width of image indices when formatting.
pub const IMAGE_INDEX_WIDTH: usize = 6;

static LABEL_TOKEN: OnceLock<Regex> = OnceLock::new();

fn label_token() -> &'static Regex {
    LABEL_TOKEN.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid label regex"))
}

/// A parsed artifact name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactName {
    /// `{label}.{device}.p{N}.tar.gz`
    Archive {
        label: Label,
        device: DeviceId,
        fragment: FragmentNumber,
    },
    /// `.{label}.{device}.p{N}.done`
    Marker {
        label: Label,
        device: DeviceId,
        fragment: FragmentNumber,
    },
    /// `p{N}`
    FragmentDir { fragment: FragmentNumber },
    /// `image{index}.jpg`
    Image { index: ImageIndex },
}

impl ArtifactName {
    pub fn archive(label: &Label, device: &DeviceId, fragment: FragmentNumber) -> Self {
        ArtifactName::Archive {
            label: label.clone(),
            device: device.clone(),
            fragment,
        }
    }

    pub fn marker(label: &Label, device: &DeviceId, fragment: FragmentNumber) -> Self {
        ArtifactName::Marker {
            label: label.clone(),
            device: device.clone(),
            fragment,
        }
    }

    pub fn fragment_dir(fragment: FragmentNumber) -> Self {
        ArtifactName::FragmentDir { fragment }
    }

    pub fn image(index: ImageIndex) -> Self {
        ArtifactName::Image { index }
    }

    /// Parse a bare file or directory name (no path separators).
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(inner) = name
            .strip_prefix('.')
            .and_then(|s| s.strip_suffix(MARKER_SUFFIX))
        {
            let (label, device, fragment) = split_stem(inner)?;
            return Some(ArtifactName::Marker {
                label,
                device,
                fragment,
            });
        }

        if let Some(stem) = name.strip_suffix(ARCHIVE_SUFFIX) {
            if stem.starts_with('.') {
                return None;
            }
            let (label, device, fragment) = split_stem(stem)?;
            return Some(ArtifactName::Archive {
                label,
                device,
                fragment,
            });
        }

        if let Some(digits) = name
            .strip_prefix(IMAGE_PREFIX)
            .and_then(|s| s.strip_suffix(IMAGE_EXTENSION))
        {
            return parse_digits(digits).map(|n| ArtifactName::Image {
                index: ImageIndex(n),
            });
        }

        let digits = name.strip_prefix('p')?;
        let n = parse_digits(digits)?;
        let fragment = FragmentNumber(u32::try_from(n).ok()?);
        Some(ArtifactName::FragmentDir { fragment })
    }

    /// The canonical file or directory name.
    pub fn file_name(&self) -> String {
        match self {
            ArtifactName::Archive {
                label,
                device,
                fragment,
            } => format!("{}.{}.p{}{}", label, device, fragment.0, ARCHIVE_SUFFIX),
            ArtifactName::Marker {
                label,
                device,
                fragment,
            } => format!(".{}.{}.p{}{}", label, device, fragment.0, MARKER_SUFFIX),
            ArtifactName::FragmentDir { fragment } => format!("p{}", fragment.0),
            ArtifactName::Image { index } => format!(
                "{}{:0width$}{}",
                IMAGE_PREFIX,
                index.0,
                IMAGE_EXTENSION,
                width = IMAGE_INDEX_WIDTH
            ),
        }
    }

    /// Fragment number for archives, markers, and fragment directories.
    pub fn fragment(&self) -> Option<FragmentNumber> {
        match self {
            ArtifactName::Archive { fragment, .. }
            | ArtifactName::Marker { fragment, .. }
            | ArtifactName::FragmentDir { fragment } => Some(*fragment),
            ArtifactName::Image { .. } => None,
        }
    }

    pub fn image_index(&self) -> Option<ImageIndex> {
        match self {
            ArtifactName::Image { index } => Some(*index),
            _ => None,
        }
    }

    /// The marker that belongs to an archive (same label, device, fragment).
    pub fn marker_for_archive(&self) -> Option<ArtifactName> {
        match self {
            ArtifactName::Archive {
                label,
                device,
                fragment,
            } => Some(ArtifactName::marker(label, device, *fragment)),
            _ => None,
        }
    }
}

/// Extract a `YYYY-MM-DD` token from anywhere in a file name.
pub fn extract_label(name: &str) -> Option<Label> {
    label_token().find(name).map(|m| Label(m.as_str().to_string()))
}

fn split_stem(stem: &str) -> Option<(Label, DeviceId, FragmentNumber)> {
    let (rest, part) = stem.rsplit_once('.')?;
    let n = parse_digits(part.strip_prefix('p')?)?;
    let fragment = FragmentNumber(u32::try_from(n).ok()?);
    let (label, device) = rest.rsplit_once('.')?;
    if label.is_empty() || device.is_empty() {
        return None;
    }
    Some((Label::new(label), DeviceId::new(device), fragment))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
