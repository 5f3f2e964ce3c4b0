//! Structured event vocabulary.
//!
//! Command-level events carry the run id and a stage so a JSONL log of a
//! cron-driven run can be grouped and filtered without parsing messages.

use serde::{Deserialize, Serialize};

/// Stages of the bundle lifecycle, as seen from the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Bundle and archive discovery.
    Catalog,
    /// Sealing and archiving a fragment.
    Archive,
    /// Reassembly of archives.
    Expand,
    /// Moving archives between nodes.
    Transfer,
    /// Finishing interrupted bundles.
    Sweep,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Catalog => "catalog",
            Stage::Archive => "archive",
            Stage::Expand => "expand",
            Stage::Transfer => "transfer",
            Stage::Sweep => "sweep",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";
    pub const RUN_FAILED: &str = "run.failed";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    // Commands
    pub const CATALOG_LISTED: &str = "catalog.listed";
    pub const ZIP_FINISHED: &str = "zip.finished";
    pub const EXPAND_FINISHED: &str = "expand.finished";
    pub const FETCH_FINISHED: &str = "fetch.finished";
    pub const SWEEP_FINISHED: &str = "sweep.finished";
}

/// Correlation fields shared by every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub command: &'static str,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, command: &'static str) -> Self {
        LogContext {
            run_id: run_id.into(),
            command,
        }
    }
}
