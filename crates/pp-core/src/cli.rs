//! Command line definition.

use clap::{Args, Parser, Subcommand};
use pp_common::OutputFormat;
use std::path::PathBuf;

use crate::logging::LogFormat;

/// photopi - fragment, archive, and distribute camera image bundles
#[derive(Parser, Debug)]
#[command(name = "photopi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Path to photopi.yaml (overrides PHOTOPI_CONFIG and the search path)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List bundles on storage nodes
    Ls(LsArgs),

    /// Seal the next fragment of a bundle and archive it
    Zip(ZipArgs),

    /// Reassemble a bundle's archives into one image directory
    Expand(ExpandArgs),

    /// Copy or move archives and markers between nodes
    Fetch(FetchArgs),

    /// Archive every leftover image and fragment on a node
    Sweep(SweepArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

/// Bundle selection shared by most commands.
#[derive(Args, Debug, Clone, Default)]
pub struct BundleSelector {
    /// Storage node name (default: configured default node)
    #[arg(long)]
    pub node: Option<String>,

    /// Device id
    #[arg(long)]
    pub device: Option<String>,

    /// Bundle label
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct LsArgs {
    /// Only this node (default: every configured node)
    #[arg(long)]
    pub node: Option<String>,

    /// Only this device
    #[arg(long)]
    pub device: Option<String>,

    /// Only this label
    #[arg(long)]
    pub label: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ZipArgs {
    #[command(flatten)]
    pub bundle: BundleSelector,

    /// Re-archive this fragment instead of sealing a new one
    #[arg(long)]
    pub part: Option<u32>,

    /// Images per fragment (default: max_files from config)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Node that receives the archive
    #[arg(long)]
    pub dest: Option<String>,

    /// Archive locally, then move archive and marker to --dest
    #[arg(long, requires = "dest")]
    pub relay: bool,

    /// Use rsync for relayed transfers
    #[arg(long, requires = "relay")]
    pub rsync: bool,

    /// Only write to --dest when it is a mounted filesystem
    #[arg(long)]
    pub verify_mount: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub bundle: BundleSelector,

    /// Destination directory (default: <swap node>/<device>/<label>)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Source node
    #[arg(long)]
    pub src: String,

    /// Destination node (default: configured default node)
    #[arg(long)]
    pub dest: Option<String>,

    /// Only this device
    #[arg(long)]
    pub device: Option<String>,

    /// Only this label
    #[arg(long)]
    pub label: Option<String>,

    /// Only archives that have a completion marker
    #[arg(long)]
    pub done: bool,

    /// Remove sources after a successful transfer
    #[arg(long = "move")]
    pub move_sources: bool,

    /// Transfer with rsync instead of an in-process copy
    #[arg(long)]
    pub rsync: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    /// Storage node name (default: configured default node)
    #[arg(long)]
    pub node: Option<String>,

    /// Only this device
    #[arg(long)]
    pub device: Option<String>,

    /// Images per fragment (default: max_files from config)
    #[arg(long)]
    pub max_files: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where it came from
    Show,
    /// Validate the configuration
    Validate,
}
