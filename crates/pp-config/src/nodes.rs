//! Named storage nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Mapping from node name to the base directory of that node.
///
/// Passed explicitly to every operation that needs to resolve a node; there
/// is no process-global node table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageNodes(BTreeMap<String, PathBuf>);

impl StorageNodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and embedding.
    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.0.insert(name.into(), path.into());
        self
    }

    /// Base directory of `name`, or [`ConfigError::UnknownNode`].
    pub fn resolve(&self, name: &str) -> Result<&Path, ConfigError> {
        self.0
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| ConfigError::UnknownNode {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Nodes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
