//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration file found; searched: {}", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),

    #[error("unknown storage node: {name}")]
    UnknownNode { name: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ConfigError> for pp_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownNode { name } => pp_common::Error::UnknownNode { name },
            other => pp_common::Error::Config(other.to_string()),
        }
    }
}
