//! `photopi expand`: reassemble a bundle into one directory.

use pp_bundle::{expand_bundle, BundleRef, BundleStore, ExpandReport, TarGzCodec};
use pp_common::Result;
use serde::Serialize;

use super::{resolve_device, resolve_label, resolve_node, Context};
use crate::cli::ExpandArgs;
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::output::Report;

#[derive(Debug, Serialize)]
pub struct ExpandCommandReport {
    pub node: String,
    pub bundle: BundleRef,
    #[serde(flatten)]
    pub expand: ExpandReport,
}

pub fn run(ctx: &Context, args: &ExpandArgs) -> Result<ExpandCommandReport> {
    let resolved = ctx.config()?;
    let config = &resolved.config;
    let (node, root) = resolve_node(args.bundle.node.as_deref(), config)?;
    let device = resolve_device(args.bundle.device.as_deref(), config)?;
    let label = resolve_label(args.bundle.label.as_deref())?;

    let dest = match &args.dest {
        Some(dest) => dest.clone(),
        None => config
            .swap_path()?
            .join(device.as_str())
            .join(label.as_str()),
    };

    let bundle = BundleStore::new(&root).bundle(device, label);
    let expand = expand_bundle(&TarGzCodec::new(), &bundle, &dest)?;

    log_event!(
        ctx.log,
        INFO,
        event_names::EXPAND_FINISHED,
        Stage::Expand,
        "expand finished",
        placed = expand.placed,
        duplicates = expand.duplicates.len(),
        failures = expand.extraction_failures.len(),
        placement_failures = expand.placement_failures.len()
    );

    Ok(ExpandCommandReport {
        node,
        bundle,
        expand,
    })
}

impl Report for ExpandCommandReport {
    fn command(&self) -> &'static str {
        "expand"
    }

    fn exit_code(&self) -> ExitCode {
        if !self.expand.success() {
            ExitCode::PartialFail
        } else {
            ExitCode::from_work(self.expand.placed > 0)
        }
    }

    fn summary(&self) -> String {
        format!(
            "expand {}/{}: {} archives, {} placed, {} duplicates, {} already present, {} failed -> {}",
            self.bundle.device,
            self.bundle.label,
            self.expand.archives,
            self.expand.placed,
            self.expand.duplicates.len(),
            self.expand.already_present,
            self.expand.extraction_failures.len() + self.expand.placement_failures.len(),
            self.expand.destination.display()
        )
    }

    fn markdown(&self) -> String {
        let e = &self.expand;
        let mut out = String::from("# photopi expand\n\n");
        out.push_str(&format!("- Bundle: {}/{} on {}\n", self.bundle.device, self.bundle.label, self.node));
        out.push_str(&format!("- Destination: {}\n", e.destination.display()));
        out.push_str(&format!("- Archives: {}\n", e.archives));
        out.push_str(&format!("- Extracted: {}\n", e.extracted));
        out.push_str(&format!("- Placed: {}\n", e.placed));
        out.push_str(&format!("- Already present: {}\n", e.already_present));
        out.push_str(&format!("- Empty skipped: {}\n", e.empty_skipped));

        if !e.duplicates.is_empty() {
            out.push_str("\n## Duplicates (left in staging)\n\n");
            for path in &e.duplicates {
                out.push_str(&format!("- {}\n", path.display()));
            }
        }
        if !e.extraction_failures.is_empty() {
            out.push_str("\n## Extraction failures\n\n");
            for failure in &e.extraction_failures {
                out.push_str(&format!("- {}: {}\n", failure.archive.display(), failure.message));
            }
        }
        if !e.placement_failures.is_empty() {
            out.push_str("\n## Placement failures (left in staging)\n\n");
            for failure in &e.placement_failures {
                out.push_str(&format!("- {}: {}\n", failure.file.display(), failure.message));
            }
        }
        out
    }
}
