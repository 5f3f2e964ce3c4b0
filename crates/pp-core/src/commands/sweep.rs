//! `photopi sweep`: finish every interrupted bundle on the storage nodes.
//!
//! Without `--node` every configured node is swept. The other nodes act as
//! peers, so an archive written straight to another node still counts.

use pp_bundle::{sweep, BundleStore, SweepReport, TarGzCodec};
use pp_common::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::{parse_device, resolve_max_files, Context};
use crate::cli::SweepArgs;
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::output::{md_table, Report};

#[derive(Debug, Serialize)]
pub struct NodeSweep {
    pub node: String,
    pub root: PathBuf,
    #[serde(flatten)]
    pub sweep: SweepReport,
}

#[derive(Debug, Serialize)]
pub struct SweepCommandReport {
    pub nodes: Vec<NodeSweep>,
}

impl SweepCommandReport {
    fn failures(&self) -> usize {
        self.nodes.iter().map(|n| n.sweep.failures()).sum()
    }

    fn did_work(&self) -> bool {
        self.nodes.iter().any(|n| n.sweep.did_work())
    }
}

pub fn run(ctx: &Context, args: &SweepArgs) -> Result<SweepCommandReport> {
    let resolved = ctx.config()?;
    let config = &resolved.config;
    let device = args.device.as_deref().map(parse_device).transpose()?;
    let max_files = resolve_max_files(args.max_files, config)?;

    let all: Vec<(String, PathBuf)> = config
        .storage_nodes
        .iter()
        .map(|(name, root)| (name.to_string(), root.to_path_buf()))
        .collect();
    let targets: Vec<(String, PathBuf)> = match &args.node {
        Some(name) => vec![(name.clone(), config.node_path(name)?.to_path_buf())],
        None => all.clone(),
    };

    let codec = TarGzCodec::new();
    let mut nodes = Vec::with_capacity(targets.len());
    for (node, root) in targets {
        let peers: Vec<PathBuf> = all
            .iter()
            .filter(|(_, peer)| peer != &root)
            .map(|(_, peer)| peer.clone())
            .collect();

        let report = sweep(&codec, &BundleStore::new(&root), &peers, device.as_ref(), max_files)?;

        log_event!(
            ctx.log,
            INFO,
            event_names::SWEEP_FINISHED,
            Stage::Sweep,
            "sweep finished",
            node = node.as_str(),
            bundles = report.bundles.len(),
            failures = report.failures()
        );
        nodes.push(NodeSweep {
            node,
            root,
            sweep: report,
        });
    }

    Ok(SweepCommandReport { nodes })
}

impl Report for SweepCommandReport {
    fn command(&self) -> &'static str {
        "sweep"
    }

    fn exit_code(&self) -> ExitCode {
        if self.failures() > 0 {
            ExitCode::PartialFail
        } else {
            ExitCode::from_work(self.did_work())
        }
    }

    fn summary(&self) -> String {
        let bundles = self.nodes.iter().flat_map(|n| &n.sweep.bundles);
        let (mut count, mut archived, mut recovered) = (0, 0, 0);
        for b in bundles {
            count += 1;
            archived += b.archived.len();
            recovered += b.recovered.len();
        }
        format!(
            "sweep {} node(s): {} bundles, {} fragments archived, {} markers recovered, {} failures",
            self.nodes.len(),
            count,
            archived,
            recovered,
            self.failures()
        )
    }

    fn markdown(&self) -> String {
        let mut out = String::from("# photopi sweep\n\n");
        let rows: Vec<Vec<String>> = self
            .nodes
            .iter()
            .flat_map(|n| n.sweep.bundles.iter().map(move |b| (n.node.as_str(), b)))
            .map(|(node, b)| {
                vec![
                    node.to_string(),
                    b.bundle.device.to_string(),
                    b.bundle.label.to_string(),
                    b.archived.len().to_string(),
                    b.recovered.len().to_string(),
                    b.error.clone().unwrap_or_default(),
                ]
            })
            .collect();
        if rows.is_empty() {
            out.push_str("Nothing to sweep.\n");
            return out;
        }
        out.push_str(&md_table(
            &["Node", "Device", "Label", "Archived", "Recovered", "Error"],
            &rows,
        ));
        out
    }
}
