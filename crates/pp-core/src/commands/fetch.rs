//! `photopi fetch`: copy or move archives between nodes.

use pp_bundle::{
    Distributor, FetchReport, FetchRequest, FsMountProbe, LocalTransfer, RsyncTransfer, TarGzCodec,
    Transfer,
};
use pp_common::{Error, Result};
use serde::Serialize;

use super::{parse_device, parse_label, resolve_node, Context};
use crate::cli::FetchArgs;
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::output::Report;

#[derive(Debug, Serialize)]
pub struct FetchCommandReport {
    pub src: String,
    pub dest: String,
    pub moved: bool,
    #[serde(flatten)]
    pub fetch: FetchReport,
}

pub fn run(ctx: &Context, args: &FetchArgs) -> Result<FetchCommandReport> {
    let resolved = ctx.config()?;
    let config = &resolved.config;
    let (src, src_root) = resolve_node(Some(&args.src), config)?;
    let (dest, dest_root) = resolve_node(args.dest.as_deref(), config)?;
    if src_root == dest_root {
        return Err(Error::InvalidArgument(format!(
            "source and destination are the same node: {}",
            src_root.display()
        )));
    }

    let request = FetchRequest {
        source: src_root,
        dest: dest_root,
        device: args.device.as_deref().map(parse_device).transpose()?,
        label: args.label.as_deref().map(parse_label).transpose()?,
        only_completed: args.done,
        remove_source: args.move_sources,
    };

    let codec = TarGzCodec::new();
    let rsync = RsyncTransfer::new();
    let transfer: &dyn Transfer = if args.rsync { &rsync } else { &LocalTransfer };
    let fetch = Distributor::new(&codec, transfer, &FsMountProbe).fetch(&request)?;

    log_event!(
        ctx.log,
        INFO,
        event_names::FETCH_FINISHED,
        Stage::Transfer,
        "fetch finished",
        archives = fetch.archives,
        markers = fetch.markers,
        failures = fetch.failures.len()
    );

    Ok(FetchCommandReport {
        src,
        dest,
        moved: args.move_sources,
        fetch,
    })
}

impl Report for FetchCommandReport {
    fn command(&self) -> &'static str {
        "fetch"
    }

    fn exit_code(&self) -> ExitCode {
        if !self.fetch.success() {
            ExitCode::PartialFail
        } else {
            ExitCode::from_work(self.fetch.archives > 0)
        }
    }

    fn summary(&self) -> String {
        format!(
            "fetch {} -> {}: {} {} archives, {} markers, {} failures",
            self.src,
            self.dest,
            if self.moved { "moved" } else { "copied" },
            self.fetch.archives,
            self.fetch.markers,
            self.fetch.failures.len()
        )
    }

    fn markdown(&self) -> String {
        let mut out = String::from("# photopi fetch\n\n");
        out.push_str(&format!("- From: {}\n- To: {}\n", self.src, self.dest));
        out.push_str(&format!("- Mode: {}\n", if self.moved { "move" } else { "copy" }));
        out.push_str(&format!("- Bundles: {}\n", self.fetch.bundles));
        out.push_str(&format!("- Archives: {}\n", self.fetch.archives));
        out.push_str(&format!("- Markers: {}\n", self.fetch.markers));
        if !self.fetch.failures.is_empty() {
            out.push_str("\n## Failed transfers\n\n");
            for failure in &self.fetch.failures {
                out.push_str(&format!(
                    "- {} (exit {}): {}\n",
                    failure.path.display(),
                    failure.outcome.exit_code,
                    failure.outcome.stderr.trim()
                ));
            }
        }
        out
    }
}
