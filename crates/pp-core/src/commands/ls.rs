//! `photopi ls`: catalog listing across storage nodes.

use pp_bundle::{last_image_number, list_archives, list_bundles, ArchiveEntry, BundleRef, BundleStore, HighWater, NodeCatalog};
use pp_common::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::{parse_device, parse_label, Context};
use crate::cli::LsArgs;
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, Stage};
use crate::output::{md_table, Report};

#[derive(Debug, Serialize)]
pub struct NodeListing {
    pub node: String,
    pub root: PathBuf,
    pub exists: bool,
    #[serde(flatten)]
    pub catalog: NodeCatalog,
}

/// Archives of the one bundle that matched the filters.
#[derive(Debug, Serialize)]
pub struct BundleDetail {
    pub node: String,
    pub bundle: BundleRef,
    pub archives: Vec<ArchiveEntry>,
    pub last_image_number: HighWater,
}

#[derive(Debug, Serialize)]
pub struct LsReport {
    pub nodes: Vec<NodeListing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BundleDetail>,
}

pub fn run(ctx: &Context, args: &LsArgs) -> Result<LsReport> {
    let resolved = ctx.config()?;
    let config = &resolved.config;
    let device = args.device.as_deref().map(parse_device).transpose()?;
    let label = args.label.as_deref().map(parse_label).transpose()?;

    let nodes: Vec<(String, PathBuf)> = match &args.node {
        Some(name) => vec![(name.clone(), config.node_path(name)?.to_path_buf())],
        None => config
            .storage_nodes
            .iter()
            .map(|(name, root)| (name.to_string(), root.to_path_buf()))
            .collect(),
    };

    let mut listings = Vec::with_capacity(nodes.len());
    for (node, root) in nodes {
        let store = BundleStore::new(&root);
        let catalog = list_bundles(&store, device.as_ref(), label.as_ref())?;
        listings.push(NodeListing {
            node,
            exists: root.is_dir(),
            root,
            catalog,
        });
    }

    let matches: Vec<(&str, BundleRef)> = listings
        .iter()
        .flat_map(|l| {
            l.catalog
                .bundles(&BundleStore::new(&l.root))
                .into_iter()
                .map(move |b| (l.node.as_str(), b))
        })
        .collect();

    let bundle = match matches.as_slice() {
        [(node, bundle)] => Some(BundleDetail {
            node: node.to_string(),
            archives: list_archives(bundle, false)?,
            last_image_number: last_image_number(bundle)?,
            bundle: bundle.clone(),
        }),
        _ => None,
    };

    log_event!(
        ctx.log,
        INFO,
        event_names::CATALOG_LISTED,
        Stage::Catalog,
        "catalog listed",
        nodes = listings.len(),
        bundles = matches.len()
    );

    Ok(LsReport {
        nodes: listings,
        bundle,
    })
}

impl LsReport {
    fn bundle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.catalog.bundle_count()).sum()
    }
}

impl Report for LsReport {
    fn command(&self) -> &'static str {
        "ls"
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::Clean
    }

    fn summary(&self) -> String {
        let mut line = format!("ls: {} nodes, {} bundles", self.nodes.len(), self.bundle_count());
        if let Some(detail) = &self.bundle {
            line.push_str(&format!(
                ", {} archives for {}/{} (last image {})",
                detail.archives.len(),
                detail.bundle.device,
                detail.bundle.label,
                detail.last_image_number.to_legacy()
            ));
        }
        line
    }

    fn markdown(&self) -> String {
        let mut out = String::from("# photopi ls\n");
        for node in &self.nodes {
            out.push_str(&format!("\n## {} ({})\n\n", node.node, node.root.display()));
            if !node.exists {
                out.push_str("_not present_\n");
                continue;
            }
            let rows: Vec<Vec<String>> = node
                .catalog
                .devices
                .iter()
                .map(|(device, labels)| {
                    let labels: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
                    vec![device.to_string(), labels.join(", ")]
                })
                .collect();
            out.push_str(&md_table(&["Device", "Labels"], &rows));
        }

        if let Some(detail) = &self.bundle {
            out.push_str(&format!(
                "\n## Archives of {} on {}\n\n",
                detail.bundle.label, detail.node
            ));
            let rows: Vec<Vec<String>> = detail
                .archives
                .iter()
                .map(|a| {
                    vec![
                        a.fragment.to_string(),
                        a.path.display().to_string(),
                        if a.complete { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            out.push_str(&md_table(&["Fragment", "Archive", "Complete"], &rows));
            out.push_str(&format!(
                "\nLast image: {}\n",
                detail.last_image_number.to_legacy()
            ));
        }
        out
    }
}
