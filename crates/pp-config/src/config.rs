//! The `photopi.yaml` model.
//!
//! ```yaml
//! device_id: pp1
//! default_node: local
//! swap_node: swap
//! max_files: 1000
//! storage_nodes:
//!   local: /var/lib/photopi
//!   swap: /srv/swap
//! ```
//!
//! Unknown keys are ignored so camera settings can share the same file.

use pp_common::DeviceId;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::nodes::StorageNodes;

pub const DEFAULT_NODE: &str = "local";
pub const DEFAULT_SWAP_NODE: &str = "swap";
pub const DEFAULT_MAX_FILES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotopiConfig {
    /// Device used when a command is not given one explicitly.
    #[serde(default)]
    pub device_id: String,

    #[serde(default = "default_node")]
    pub default_node: String,

    /// Node that expand writes into by default.
    #[serde(default = "default_swap_node")]
    pub swap_node: String,

    /// Images per fragment.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    #[serde(default)]
    pub storage_nodes: StorageNodes,
}

fn default_node() -> String {
    DEFAULT_NODE.to_string()
}

fn default_swap_node() -> String {
    DEFAULT_SWAP_NODE.to_string()
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

impl PhotopiConfig {
    /// Parse YAML content; `origin` is only used in error messages.
    pub fn from_yaml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content, path)
    }

    pub fn device(&self) -> DeviceId {
        DeviceId::new(self.device_id.clone())
    }

    pub fn node_path(&self, name: &str) -> Result<&Path, ConfigError> {
        self.storage_nodes.resolve(name)
    }

    pub fn default_node_path(&self) -> Result<&Path, ConfigError> {
        self.node_path(&self.default_node)
    }

    pub fn swap_path(&self) -> Result<&Path, ConfigError> {
        self.node_path(&self.swap_node)
    }
}
