//! Bundle discovery on a storage node.

use pp_common::{extract_label, ArtifactName, DeviceId, FragmentNumber, Label};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;
use crate::layout::BundleRef;
use crate::store::{list_entries, list_images, BundleStore};

/// Bundles found on one node, keyed by device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeCatalog {
    pub devices: BTreeMap<DeviceId, BTreeSet<Label>>,
}

impl NodeCatalog {
    pub fn bundle_count(&self) -> usize {
        self.devices.values().map(BTreeSet::len).sum()
    }

    /// Every (device, label) pair as a bundle rooted at `store`.
    pub fn bundles(&self, store: &BundleStore) -> Vec<BundleRef> {
        self.devices
            .iter()
            .flat_map(|(device, labels)| {
                labels
                    .iter()
                    .map(move |label| store.bundle(device.clone(), label.clone()))
            })
            .collect()
    }
}

/// One archive of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub fragment: FragmentNumber,
    pub path: PathBuf,
    pub marker: PathBuf,
    pub complete: bool,
}

/// Bundles with at least one archive, optionally filtered.
///
/// Every device directory is listed even when it holds no matching
/// archives, so a listing shows which devices a node knows about.
pub fn list_bundles(
    store: &BundleStore,
    device: Option<&DeviceId>,
    label: Option<&Label>,
) -> Result<NodeCatalog> {
    let mut catalog = NodeCatalog::default();

    for dev in store.devices()? {
        if device.is_some_and(|d| d != &dev) {
            continue;
        }
        let dev_dir = store.root().join(dev.as_str());
        let labels = catalog.devices.entry(dev.clone()).or_default();

        for entry in list_entries(&dev_dir)? {
            if entry.is_dir {
                continue;
            }
            let Some(found) = archive_label(&entry.name) else {
                continue;
            };
            if label.is_some_and(|l| l != &found) {
                continue;
            }
            labels.insert(found);
        }
    }

    debug!(root = %store.root().display(), bundles = catalog.bundle_count(), "catalog");
    Ok(catalog)
}

/// Like [`list_bundles`], plus labels whose live directory still holds
/// images or fragment directories.
pub fn list_bundles_with_backlog(
    store: &BundleStore,
    device: Option<&DeviceId>,
    label: Option<&Label>,
) -> Result<NodeCatalog> {
    let mut catalog = list_bundles(store, device, label)?;

    for (dev, labels) in catalog.devices.iter_mut() {
        let dev_dir = store.root().join(dev.as_str());
        for entry in list_entries(&dev_dir)? {
            if !entry.is_dir || entry.name.starts_with('.') {
                continue;
            }
            let candidate = Label::new(entry.name.clone());
            if label.is_some_and(|l| l != &candidate) {
                continue;
            }
            let has_images = !list_images(&entry.path)?.is_empty();
            let has_fragments = list_entries(&entry.path)?.iter().any(|e| {
                e.is_dir && matches!(ArtifactName::parse(&e.name), Some(ArtifactName::FragmentDir { .. }))
            });
            if has_images || has_fragments {
                labels.insert(candidate);
            }
        }
    }

    Ok(catalog)
}

/// Archives of exactly this bundle, sorted by fragment number.
pub fn list_archives(bundle: &BundleRef, only_completed: bool) -> Result<Vec<ArchiveEntry>> {
    let mut archives = Vec::new();

    for entry in list_entries(&bundle.device_dir())? {
        if entry.is_dir {
            continue;
        }
        let Some(ArtifactName::Archive {
            label,
            device,
            fragment,
        }) = ArtifactName::parse(&entry.name)
        else {
            continue;
        };
        if label != bundle.label || device != bundle.device {
            continue;
        }
        let fragment_ref = bundle.fragment(fragment);
        let marker = fragment_ref.marker_path();
        let complete = marker.is_file();
        if only_completed && !complete {
            continue;
        }
        archives.push(ArchiveEntry {
            fragment,
            path: entry.path,
            marker,
            complete,
        });
    }

    archives.sort_by_key(|a| a.fragment);
    Ok(archives)
}

/// Union of fragment numbers from archive names and working directories.
pub fn list_fragment_numbers(bundle: &BundleRef) -> Result<BTreeSet<FragmentNumber>> {
    let mut numbers: BTreeSet<FragmentNumber> = list_archives(bundle, false)?
        .into_iter()
        .map(|a| a.fragment)
        .collect();

    for entry in list_entries(&bundle.live_dir())? {
        if !entry.is_dir {
            continue;
        }
        if let Some(ArtifactName::FragmentDir { fragment }) = ArtifactName::parse(&entry.name) {
            numbers.insert(fragment);
        }
    }
    Ok(numbers)
}

/// Label of an archive file name: typed parse first, then any date token.
fn archive_label(name: &str) -> Option<Label> {
    match ArtifactName::parse(name) {
        Some(ArtifactName::Archive { label, .. }) => Some(label),
        Some(_) => None,
        None if name.ends_with(pp_common::naming::ARCHIVE_SUFFIX) => extract_label(name),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_archive_label_fallback() {
        assert_eq!(
            archive_label("2024-01-01.pp1.p1.tar.gz"),
            Some(Label::from("2024-01-01"))
        );
        assert_eq!(
            archive_label("old-2023-05-06.tar.gz"),
            Some(Label::from("2023-05-06"))
        );
        assert_eq!(archive_label(".2024-01-01.pp1.p1.done"), None);
        assert_eq!(archive_label("random.tar.gz"), None);
    }

    #[test]
    fn test_list_bundles_filters() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("pp1/2024-01-01.pp1.p1.tar.gz"));
        touch(&tmp.path().join("pp1/2024-01-02.pp1.p1.tar.gz"));
        touch(&tmp.path().join("pp2/2024-01-01.pp2.p1.tar.gz"));
        fs::create_dir_all(tmp.path().join("pp3")).unwrap();
        let store = BundleStore::new(tmp.path());

        let all = list_bundles(&store, None, None).unwrap();
        assert_eq!(all.bundle_count(), 3);
        assert!(all.devices[&DeviceId::from("pp3")].is_empty());

        let one = list_bundles(&store, Some(&DeviceId::from("pp1")), Some(&Label::from("2024-01-02"))).unwrap();
        assert_eq!(one.bundle_count(), 1);
        assert_eq!(one.devices.len(), 1);
        assert_eq!(
            one.bundles(&store)[0].live_dir(),
            tmp.path().join("pp1/2024-01-02")
        );
    }

    #[test]
    fn test_list_archives_is_strict_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let store = BundleStore::new(tmp.path());
        let bundle = store.bundle(DeviceId::from("pp1"), Label::from("2024-01-01"));

        touch(&tmp.path().join("pp1/2024-01-01.pp1.p10.tar.gz"));
        touch(&tmp.path().join("pp1/2024-01-01.pp1.p2.tar.gz"));
        touch(&tmp.path().join("pp1/.2024-01-01.pp1.p2.done"));
        touch(&tmp.path().join("pp1/2024-01-011.pp1.p1.tar.gz"));
        touch(&tmp.path().join("pp1/2024-01-01.pp9.p1.tar.gz"));

        let all = list_archives(&bundle, false).unwrap();
        let numbers: Vec<u32> = all.iter().map(|a| a.fragment.0).collect();
        assert_eq!(numbers, vec![2, 10]);
        assert!(all[0].complete);
        assert!(!all[1].complete);

        let done = list_archives(&bundle, true).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].fragment, FragmentNumber(2));
    }

    #[test]
    fn test_fragment_numbers_union() {
        let tmp = TempDir::new().unwrap();
        let store = BundleStore::new(tmp.path());
        let bundle = store.bundle(DeviceId::from("pp1"), Label::from("2024-01-01"));

        touch(&tmp.path().join("pp1/2024-01-01.pp1.p1.tar.gz"));
        fs::create_dir_all(bundle.live_dir().join("p1")).unwrap();
        fs::create_dir_all(bundle.live_dir().join("p4")).unwrap();
        fs::create_dir_all(bundle.live_dir().join("tmp")).unwrap();

        let numbers: Vec<u32> = list_fragment_numbers(&bundle)
            .unwrap()
            .into_iter()
            .map(|n| n.0)
            .collect();
        assert_eq!(numbers, vec![1, 4]);
    }

    #[test]
    fn test_backlog_includes_unarchived_labels() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("pp1/2024-01-01.pp1.p1.tar.gz"));
        touch(&tmp.path().join("pp1/2024-01-03/image000001.jpg"));
        fs::create_dir_all(tmp.path().join("pp1/2024-01-04/p2")).unwrap();
        fs::create_dir_all(tmp.path().join("pp1/empty-label")).unwrap();
        let store = BundleStore::new(tmp.path());

        let plain = list_bundles(&store, None, None).unwrap();
        assert_eq!(plain.bundle_count(), 1);

        let backlog = list_bundles_with_backlog(&store, None, None).unwrap();
        let labels: Vec<_> = backlog.devices[&DeviceId::from("pp1")]
            .iter()
            .map(|l| l.as_str().to_string())
            .collect();
        assert_eq!(labels, vec!["2024-01-01", "2024-01-03", "2024-01-04"]);
    }
}
