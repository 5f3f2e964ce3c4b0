//! Orphan sweep: bring every bundle on a node to "all archived".
//!
//! For each bundle with backlog, fragments left behind by an interrupted run
//! are finished first (missing markers recovered, residual images archived),
//! then the live directory is sealed and archived until it is empty.
//!
//! Archives written straight to another node are looked up on the `peers`
//! roots, so an interrupted direct write is recovered instead of archived a
//! second time locally.

use pp_common::{DeviceId, FragmentNumber};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::archiver::{archive_fragment, recover_from, ArchiveOutcome};
use crate::catalog::{list_bundles_with_backlog, list_fragment_numbers};
use crate::codec::ArchiveCodec;
use crate::error::Result;
use crate::fragment::{next_fragment_number, seal_batch};
use crate::layout::{BundleRef, FragmentRef};
use crate::store::BundleStore;
use crate::tracker::is_complete;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleSweep {
    pub bundle: BundleRef,
    /// Fragments whose marker was rebuilt from the archive.
    pub recovered: Vec<FragmentNumber>,
    pub archived: Vec<ArchiveOutcome>,
    pub error: Option<String>,
}

impl BundleSweep {
    fn new(bundle: BundleRef) -> Self {
        Self {
            bundle,
            recovered: Vec::new(),
            archived: Vec::new(),
            error: None,
        }
    }

    pub fn did_work(&self) -> bool {
        !self.recovered.is_empty() || !self.archived.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub bundles: Vec<BundleSweep>,
}

impl SweepReport {
    pub fn did_work(&self) -> bool {
        self.bundles.iter().any(BundleSweep::did_work)
    }

    pub fn failures(&self) -> usize {
        self.bundles.iter().filter(|b| b.error.is_some()).count()
    }
}

/// Sweep every bundle with backlog on `store`.
///
/// `peers` are the other node roots an archive may have been written to.
/// Per-bundle failures are recorded and the sweep moves on, except
/// [`crate::BundleError::FragmentExists`], which aborts the whole run.
pub fn sweep(
    codec: &dyn ArchiveCodec,
    store: &BundleStore,
    peers: &[PathBuf],
    device: Option<&DeviceId>,
    max_files: usize,
) -> Result<SweepReport> {
    let catalog = list_bundles_with_backlog(store, device, None)?;
    let mut report = SweepReport::default();

    for bundle in catalog.bundles(store) {
        let mut entry = BundleSweep::new(bundle.clone());
        match sweep_bundle(codec, &bundle, peers, max_files, &mut entry) {
            Ok(()) => {}
            Err(e) if e.is_hard_stop() => return Err(e),
            Err(e) => {
                error!(bundle = %bundle, error = %e, "sweep failed for bundle");
                entry.error = Some(e.to_string());
            }
        }
        report.bundles.push(entry);
    }

    info!(
        root = %store.root().display(),
        bundles = report.bundles.len(),
        failures = report.failures(),
        "sweep finished"
    );
    Ok(report)
}

fn sweep_bundle(
    codec: &dyn ArchiveCodec,
    bundle: &BundleRef,
    peers: &[PathBuf],
    max_files: usize,
    entry: &mut BundleSweep,
) -> Result<()> {
    for number in list_fragment_numbers(bundle)? {
        let fragment = bundle.fragment(number);
        if completed_elsewhere(&fragment, peers) {
            debug!(fragment = %fragment, "archive and marker already relayed");
            continue;
        }
        let archive = locate_archive(&fragment, peers);
        if recover_from(codec, &fragment, &archive)?.is_some() {
            entry.recovered.push(number);
        } else if let Some(outcome) = archive_fragment(codec, &fragment, &archive)? {
            entry.archived.push(outcome);
        }
    }

    loop {
        let next = next_fragment_number(bundle)?;
        if !seal_batch(bundle, next, max_files)? {
            break;
        }
        let fragment = bundle.fragment(next);
        match archive_fragment(codec, &fragment, &fragment.archive_path())? {
            Some(outcome) => entry.archived.push(outcome),
            None => break,
        }
    }
    Ok(())
}

/// The local archive when present, else the first copy on a peer node,
/// else the local path (nothing archived yet).
fn locate_archive(fragment: &FragmentRef, peers: &[PathBuf]) -> PathBuf {
    let local = fragment.archive_path();
    if local.is_file() {
        return local;
    }
    peers
        .iter()
        .map(|peer| fragment.archive_path_on(peer))
        .find(|path| path.is_file())
        .unwrap_or(local)
}

/// A relayed fragment: no local marker, but a peer holds archive and marker.
fn completed_elsewhere(fragment: &FragmentRef, peers: &[PathBuf]) -> bool {
    !is_complete(fragment)
        && peers.iter().any(|peer| {
            fragment.archive_path_on(peer).is_file() && fragment.marker_path_on(peer).is_file()
        })
}
