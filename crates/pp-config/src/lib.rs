//! photopi configuration loading and validation.
//!
//! This crate provides:
//! - The typed `photopi.yaml` model and its storage node map
//! - Config resolution (CLI → env → working dir → XDG → home → /etc)
//! - Semantic validation

pub mod config;
pub mod error;
pub mod nodes;
pub mod resolve;
pub mod validate;

pub use config::PhotopiConfig;
pub use error::ConfigError;
pub use nodes::StorageNodes;
pub use resolve::{load_config, ConfigSource, ResolvedConfig, SearchPaths};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Configuration file name looked up in every search location.
pub const CONFIG_FILENAME: &str = "photopi.yaml";
