//! `photopi config show|validate`.

use pp_common::Result;
use pp_config::{ConfigError, ConfigSource, PhotopiConfig};
use serde::Serialize;
use std::path::PathBuf;

use super::Context;
use crate::exit_codes::ExitCode;
use crate::output::{md_table, Report};

#[derive(Debug, Serialize)]
pub struct ConfigShowReport {
    pub path: PathBuf,
    pub source: ConfigSource,
    pub sha256: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    pub config: PhotopiConfig,
}

/// Show the resolved file even when it does not validate.
pub fn show(ctx: &Context) -> Result<ConfigShowReport> {
    let resolved = ctx.load_config()?;
    let problem = resolved.validate().err().map(|e| e.to_string());
    Ok(ConfigShowReport {
        valid: problem.is_none(),
        problem,
        path: resolved.path,
        source: resolved.source,
        sha256: resolved.sha256,
        config: resolved.config,
    })
}

impl Report for ConfigShowReport {
    fn command(&self) -> &'static str {
        "config show"
    }

    fn exit_code(&self) -> ExitCode {
        if self.valid {
            ExitCode::Clean
        } else {
            ExitCode::ConfigError
        }
    }

    fn summary(&self) -> String {
        format!(
            "config: {} ({}), {} nodes, {}",
            self.path.display(),
            self.source,
            self.config.storage_nodes.len(),
            if self.valid { "valid" } else { "INVALID" }
        )
    }

    fn markdown(&self) -> String {
        let c = &self.config;
        let mut out = String::from("# photopi config\n\n");
        out.push_str(&format!("- File: {} ({})\n", self.path.display(), self.source));
        out.push_str(&format!("- SHA-256: {}\n", self.sha256));
        out.push_str(&format!("- Device: {}\n", c.device_id));
        out.push_str(&format!("- Default node: {}\n", c.default_node));
        out.push_str(&format!("- Swap node: {}\n", c.swap_node));
        out.push_str(&format!("- Max files: {}\n", c.max_files));
        if let Some(problem) = &self.problem {
            out.push_str(&format!("- Problem: {}\n", problem));
        }
        out.push_str("\n## Storage nodes\n\n");
        let rows: Vec<Vec<String>> = c
            .storage_nodes
            .iter()
            .map(|(name, path)| vec![name.to_string(), path.display().to_string()])
            .collect();
        out.push_str(&md_table(&["Node", "Path"], &rows));
        out
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigValidateReport {
    pub path: PathBuf,
    pub source: ConfigSource,
    pub nodes: usize,
}

/// Fails with the validation error when the configuration is invalid.
pub fn validate(ctx: &Context) -> Result<ConfigValidateReport> {
    let resolved = ctx.load_config()?;
    resolved.validate().map_err(ConfigError::from)?;
    Ok(ConfigValidateReport {
        nodes: resolved.config.storage_nodes.len(),
        path: resolved.path,
        source: resolved.source,
    })
}

impl Report for ConfigValidateReport {
    fn command(&self) -> &'static str {
        "config validate"
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::Clean
    }

    fn summary(&self) -> String {
        format!("config validate: OK ({})", self.path.display())
    }

    fn markdown(&self) -> String {
        format!(
            "# Configuration Validation\n\nStatus: valid\nFile: {} ({})\nStorage nodes: {}\n",
            self.path.display(),
            self.source,
            self.nodes
        )
    }
}
