//! Moving archives between storage nodes.
//!
//! Two flows live here: `zip` (seal + archive one fragment, optionally
//! writing or relaying the archive to another node) and `fetch` (copy or
//! move a node's archives and markers onto another node).

use pp_common::{DeviceId, FragmentNumber, Label};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::archiver::{archive_fragment, ArchiveOutcome};
use crate::catalog::{list_archives, list_bundles};
use crate::codec::ArchiveCodec;
use crate::error::Result;
use crate::fragment::{next_fragment_number, seal_batch};
use crate::layout::{BundleRef, FragmentRef};
use crate::mount::MountProbe;
use crate::store::BundleStore;
use crate::transfer::{Transfer, TransferOutcome, LOCAL_FAILURE_CODE};

/// Where a freshly written archive should end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveDestination {
    /// Next to the bundle on its own node.
    Local,
    /// Written straight into `{root}/{device}/` of another node.
    Direct(PathBuf),
    /// Written locally, then archive and marker are moved to another node
    /// through the transfer primitive.
    Relay(PathBuf),
}

/// Inputs of one `zip` run.
#[derive(Debug, Clone)]
pub struct ZipRequest {
    pub bundle: BundleRef,
    /// Re-archive this fragment instead of sealing a new one.
    pub part: Option<FragmentNumber>,
    pub max_files: usize,
    pub destination: ArchiveDestination,
    /// Refuse to touch a destination that is not a mounted filesystem.
    pub verify_mount: bool,
}

/// A single file handed to the transfer primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub path: PathBuf,
    pub dest_dir: PathBuf,
    pub outcome: TransferOutcome,
}

/// Where the archive of a `zip` run ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    Local,
    Direct { root: PathBuf },
    /// Direct destination was not mounted; archive written locally.
    FellBack { root: PathBuf },
    Relayed { root: PathBuf, transfers: Vec<TransferRecord> },
    /// Relay destination was not mounted; nothing was transferred.
    RelaySkipped { root: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZipReport {
    pub fragment: FragmentRef,
    /// Live images were moved into a new fragment during this run.
    pub sealed: bool,
    pub archived: Option<ArchiveOutcome>,
    pub placement: Placement,
}

impl ZipReport {
    /// A relay transfer ran and failed.
    pub fn transfer_failed(&self) -> bool {
        match &self.placement {
            Placement::Relayed { transfers, .. } => transfers.iter().any(|t| !t.outcome.success()),
            _ => false,
        }
    }
}

/// Inputs of one `fetch` run.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub device: Option<DeviceId>,
    pub label: Option<Label>,
    /// Only archives that have a completion marker.
    pub only_completed: bool,
    /// Remove sources after a successful transfer.
    pub remove_source: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub bundles: usize,
    pub archives: usize,
    pub markers: usize,
    pub failures: Vec<TransferRecord>,
}

impl FetchReport {
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Archive placement and fetch, parameterised over the three collaborators.
pub struct Distributor<'a> {
    codec: &'a dyn ArchiveCodec,
    transfer: &'a dyn Transfer,
    probe: &'a dyn MountProbe,
}

impl<'a> Distributor<'a> {
    pub fn new(codec: &'a dyn ArchiveCodec, transfer: &'a dyn Transfer, probe: &'a dyn MountProbe) -> Self {
        Self {
            codec,
            transfer,
            probe,
        }
    }

    /// Seal (unless `part` is given) and archive one fragment.
    pub fn zip(&self, request: &ZipRequest) -> Result<ZipReport> {
        let bundle = &request.bundle;
        let (number, sealed) = match request.part {
            Some(part) => (part, false),
            None => {
                let next = next_fragment_number(bundle)?;
                let sealed = seal_batch(bundle, next, request.max_files)?;
                if !sealed {
                    info!(bundle = %bundle, "no images to move");
                }
                (next, sealed)
            }
        };
        let fragment = bundle.fragment(number);

        let (archive_path, mut placement) = match &request.destination {
            ArchiveDestination::Local | ArchiveDestination::Relay(_) => {
                (fragment.archive_path(), Placement::Local)
            }
            ArchiveDestination::Direct(root) => {
                if self.mount_ok(root, request.verify_mount) {
                    (
                        fragment.archive_path_on(root),
                        Placement::Direct { root: root.clone() },
                    )
                } else {
                    warn!(root = %root.display(), "destination not mounted; writing archive locally");
                    (
                        fragment.archive_path(),
                        Placement::FellBack { root: root.clone() },
                    )
                }
            }
        };

        let archived = archive_fragment(self.codec, &fragment, &archive_path)?;
        let Some(outcome) = archived else {
            warn!(fragment = %fragment, "no images found");
            return Ok(ZipReport {
                fragment,
                sealed,
                archived: None,
                placement: Placement::Local,
            });
        };

        if let ArchiveDestination::Relay(root) = &request.destination {
            placement = if self.mount_ok(root, request.verify_mount) {
                let transfers = self.relay(&outcome, root);
                Placement::Relayed {
                    root: root.clone(),
                    transfers,
                }
            } else {
                warn!(root = %root.display(), "relay destination not mounted; archive kept locally");
                Placement::RelaySkipped { root: root.clone() }
            };
        }

        Ok(ZipReport {
            fragment,
            sealed,
            archived: Some(outcome),
            placement,
        })
    }

    /// Copy (or move) every matching archive and its marker from one node to
    /// another. A file or bundle that cannot be transferred is recorded in
    /// [`FetchReport::failures`] and the run moves on.
    pub fn fetch(&self, request: &FetchRequest) -> Result<FetchReport> {
        let source = BundleStore::new(&request.source);
        let catalog = list_bundles(&source, request.device.as_ref(), request.label.as_ref())?;
        let bundles = catalog.bundles(&source);
        let mut report = FetchReport {
            bundles: bundles.len(),
            ..Default::default()
        };
        info!(
            source = %request.source.display(),
            dest = %request.dest.display(),
            bundles = bundles.len(),
            "fetching bundles"
        );

        for bundle in &bundles {
            let dest_dir = request.dest.join(bundle.device.as_str());
            if let Some(failure) = prepare_dir(&bundle.device_dir(), &dest_dir) {
                report.failures.push(failure);
                continue;
            }

            let archives = match list_archives(bundle, request.only_completed) {
                Ok(archives) => archives,
                Err(e) => {
                    warn!(bundle = %bundle, error = %e, "cannot list archives");
                    report
                        .failures
                        .push(local_failure(&bundle.device_dir(), &dest_dir, e.to_string()));
                    continue;
                }
            };

            for archive in archives {
                let record = self.send(&archive.path, &dest_dir, request.remove_source);
                if !record.outcome.success() {
                    report.failures.push(record);
                    continue;
                }
                report.archives += 1;

                if archive.marker.is_file() {
                    let record = self.send(&archive.marker, &dest_dir, request.remove_source);
                    if record.outcome.success() {
                        report.markers += 1;
                    } else {
                        report.failures.push(record);
                    }
                }
            }
        }

        info!(
            archives = report.archives,
            markers = report.markers,
            failures = report.failures.len(),
            "fetch finished"
        );
        Ok(report)
    }

    fn mount_ok(&self, root: &Path, verify: bool) -> bool {
        !verify || self.probe.is_mounted(root)
    }

    fn relay(&self, outcome: &ArchiveOutcome, root: &Path) -> Vec<TransferRecord> {
        let dest_dir = root.join(outcome.fragment.bundle.device.as_str());
        if let Some(failure) = prepare_dir(&outcome.archive, &dest_dir) {
            return vec![failure];
        }

        let mut transfers = vec![self.send(&outcome.archive, &dest_dir, true)];
        if transfers[0].outcome.success() {
            transfers.push(self.send(&outcome.marker, &dest_dir, true));
        } else {
            warn!(archive = %outcome.archive.display(), "relay failed; marker left in place");
        }
        transfers
    }

    fn send(&self, path: &Path, dest_dir: &Path, remove_source: bool) -> TransferRecord {
        let outcome = self
            .transfer
            .transfer(path, dest_dir, remove_source)
            .unwrap_or_else(|e| TransferOutcome::failed(LOCAL_FAILURE_CODE, e.to_string(), Duration::ZERO));
        if outcome.success() {
            info!(path = %path.display(), dest = %dest_dir.display(), remove_source, "transferred");
        } else {
            warn!(
                path = %path.display(),
                exit_code = outcome.exit_code,
                stderr = %outcome.stderr.trim(),
                "transfer failed"
            );
        }
        TransferRecord {
            path: path.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            outcome,
        }
    }
}

/// Create `dest_dir`; on failure, the record to report for `source`.
fn prepare_dir(source: &Path, dest_dir: &Path) -> Option<TransferRecord> {
    match std::fs::create_dir_all(dest_dir) {
        Ok(()) => None,
        Err(e) => {
            warn!(dest = %dest_dir.display(), error = %e, "cannot create destination directory");
            Some(local_failure(
                source,
                dest_dir,
                format!("create {}: {}", dest_dir.display(), e),
            ))
        }
    }
}

fn local_failure(path: &Path, dest_dir: &Path, stderr: String) -> TransferRecord {
    TransferRecord {
        path: path.to_path_buf(),
        dest_dir: dest_dir.to_path_buf(),
        outcome: TransferOutcome::failed(LOCAL_FAILURE_CODE, stderr, Duration::ZERO),
    }
}
