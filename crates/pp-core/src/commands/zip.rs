//! `photopi zip`: seal and archive one fragment.

use pp_bundle::{
    last_image_number, ArchiveDestination, BundleRef, BundleStore, Distributor, FsMountProbe, HighWater,
    LocalTransfer, Placement, RsyncTransfer, TarGzCodec, Transfer, ZipReport, ZipRequest,
};
use pp_common::{Error, FragmentNumber, Result};
use serde::Serialize;

use super::{resolve_device, resolve_label, resolve_max_files, resolve_node, Context};
use crate::cli::ZipArgs;
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::output::Report;

#[derive(Debug, Serialize)]
pub struct ZipCommandReport {
    pub node: String,
    pub bundle: BundleRef,
    #[serde(flatten)]
    pub zip: ZipReport,
    /// Bundle high water mark after this run.
    pub last_image_number: HighWater,
}

pub fn run(ctx: &Context, args: &ZipArgs) -> Result<ZipCommandReport> {
    let resolved = ctx.config()?;
    let config = &resolved.config;
    let (node, root) = resolve_node(args.bundle.node.as_deref(), config)?;
    let device = resolve_device(args.bundle.device.as_deref(), config)?;
    let label = resolve_label(args.bundle.label.as_deref())?;
    let max_files = resolve_max_files(args.max_files, config)?;

    let part = match args.part {
        Some(0) => return Err(Error::InvalidArgument("--part starts at 1".to_string())),
        other => other.map(FragmentNumber),
    };

    let destination = match &args.dest {
        None => ArchiveDestination::Local,
        Some(name) => {
            let dest_root = config.node_path(name)?.to_path_buf();
            if dest_root == root {
                ArchiveDestination::Local
            } else if args.relay {
                ArchiveDestination::Relay(dest_root)
            } else {
                ArchiveDestination::Direct(dest_root)
            }
        }
    };

    let bundle = BundleStore::new(&root).bundle(device, label);
    let codec = TarGzCodec::new();
    let rsync = RsyncTransfer::new();
    let transfer: &dyn Transfer = if args.rsync { &rsync } else { &LocalTransfer };

    let zip = Distributor::new(&codec, transfer, &FsMountProbe).zip(&ZipRequest {
        bundle: bundle.clone(),
        part,
        max_files,
        destination,
        verify_mount: args.verify_mount,
    })?;
    let last_image_number = last_image_number(&bundle)?;

    log_event!(
        ctx.log,
        INFO,
        event_names::ZIP_FINISHED,
        Stage::Archive,
        "zip finished",
        fragment = zip.fragment.number.0,
        archived = zip.archived.is_some(),
        last_image = last_image_number.to_legacy()
    );

    Ok(ZipCommandReport {
        node,
        bundle,
        zip,
        last_image_number,
    })
}

fn describe(placement: &Placement) -> String {
    match placement {
        Placement::Local => "local".to_string(),
        Placement::Direct { root } => format!("written to {}", root.display()),
        Placement::FellBack { root } => format!("{} not mounted, written locally", root.display()),
        Placement::Relayed { root, transfers } => {
            let ok = transfers.iter().filter(|t| t.outcome.success()).count();
            format!("relayed to {} ({}/{} transfers ok)", root.display(), ok, transfers.len())
        }
        Placement::RelaySkipped { root } => format!("{} not mounted, relay skipped", root.display()),
    }
}

impl Report for ZipCommandReport {
    fn command(&self) -> &'static str {
        "zip"
    }

    fn exit_code(&self) -> ExitCode {
        if self.zip.transfer_failed() {
            ExitCode::PartialFail
        } else {
            ExitCode::from_work(self.zip.archived.is_some())
        }
    }

    fn summary(&self) -> String {
        match &self.zip.archived {
            Some(outcome) => format!(
                "zip {}/{} {}: archived {} images, last image {} ({})",
                self.bundle.device,
                self.bundle.label,
                self.zip.fragment.number,
                outcome.images,
                self.last_image_number.to_legacy(),
                describe(&self.zip.placement)
            ),
            None => format!(
                "zip {}/{}: nothing to archive, last image {}",
                self.bundle.device,
                self.bundle.label,
                self.last_image_number.to_legacy()
            ),
        }
    }

    fn markdown(&self) -> String {
        let mut out = String::from("# photopi zip\n\n");
        out.push_str(&format!("- Node: {}\n", self.node));
        out.push_str(&format!("- Bundle: {}/{}\n", self.bundle.device, self.bundle.label));
        out.push_str(&format!("- Fragment: {}\n", self.zip.fragment.number));
        out.push_str(&format!("- Sealed: {}\n", if self.zip.sealed { "yes" } else { "no" }));
        match &self.zip.archived {
            Some(outcome) => {
                out.push_str(&format!("- Archive: {}\n", outcome.archive.display()));
                out.push_str(&format!("- Images: {}\n", outcome.images));
                if outcome.resumed {
                    out.push_str("- Resumed an interrupted fragment\n");
                }
                out.push_str(&format!("- Placement: {}\n", describe(&self.zip.placement)));
            }
            None => out.push_str("- Nothing to archive\n"),
        }
        out.push_str(&format!(
            "- Last image: {}\n",
            self.last_image_number.to_legacy()
        ));
        out
    }
}
