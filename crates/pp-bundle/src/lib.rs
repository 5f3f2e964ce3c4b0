//! Image bundle lifecycle for photopi.
//!
//! A bundle is the set of JPEG images one device captured under one label,
//! stored below a storage node root:
//!
//! ```text
//! {root}/{device}/{label}/image000001.jpg         live images
//! {root}/{device}/{label}/p{n}/                   sealed fragment n
//! {root}/{device}/{label}.{device}.p{n}.tar.gz    archive of fragment n
//! {root}/{device}/.{label}.{device}.p{n}.done     completion marker
//! ```
//!
//! The marker holds the highest image index archived so far and is the
//! authority on fragment completion. Operations:
//! - [`seal_batch`]: move the oldest live images into a new fragment
//! - [`archive_fragment`] / [`recover`]: archive a fragment and mark it done
//! - [`Distributor`]: `zip` (seal + archive + place) and `fetch` between nodes
//! - [`expand_bundle`]: reassemble all archives into one flat directory
//! - [`sweep`]: finish every bundle on a node after interrupted runs
//!
//! # Example
//!
//! ```no_run
//! use pp_bundle::{ArchiveDestination, AssumeMounted, Distributor, LocalTransfer, TarGzCodec, ZipRequest};
//! use pp_common::{DeviceId, Label};
//!
//! let bundle = pp_bundle::BundleStore::new("/srv/photos")
//!     .bundle(DeviceId::from("pp1"), Label::from("2024-05-01"));
//! let codec = TarGzCodec::new();
//! let report = Distributor::new(&codec, &LocalTransfer, &AssumeMounted(true))
//!     .zip(&ZipRequest {
//!         bundle,
//!         part: None,
//!         max_files: 1000,
//!         destination: ArchiveDestination::Local,
//!         verify_mount: false,
//!     })
//!     .unwrap();
//! println!("{:?}", report.archived);
//! ```

pub mod archiver;
pub mod catalog;
pub mod codec;
pub mod distribute;
pub mod error;
pub mod expand;
pub mod fragment;
pub mod layout;
pub mod mount;
pub mod store;
pub mod sweep;
pub mod tracker;
pub mod transfer;

pub use archiver::{archive_fragment, recover, ArchiveOutcome};
pub use catalog::{list_archives, list_bundles, list_bundles_with_backlog, ArchiveEntry, NodeCatalog};
pub use codec::{ArchiveCodec, TarGzCodec};
pub use distribute::{
    ArchiveDestination, Distributor, FetchReport, FetchRequest, Placement, TransferRecord, ZipReport,
    ZipRequest,
};
pub use error::{BundleError, Result};
pub use expand::{expand_bundle, ExpandReport, ExtractionFailure, PlacementFailure};
pub use fragment::{last_fragment_number, next_fragment_number, seal_batch, DEFAULT_MAX_FILES};
pub use layout::{BundleRef, FragmentRef};
pub use mount::{AssumeMounted, FsMountProbe, MountProbe};
pub use store::BundleStore;
pub use sweep::{sweep, BundleSweep, SweepReport};
pub use tracker::{fragment_high_water, is_complete, last_image_number, read_marker, HighWater};
pub use transfer::{LocalTransfer, RsyncTransfer, Transfer, TransferOutcome};
