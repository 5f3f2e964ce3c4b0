//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → `PHOTOPI_CONFIG` → `./photopi.yaml` →
//! XDG config dir → `~/.photopi.yaml` → `/etc/photopi.yaml`. The first file
//! that exists wins; there are no built-in defaults for storage nodes, so
//! finding nothing is an error.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::config::PhotopiConfig;
use crate::error::ConfigError;
use crate::validate::{validate_config, ValidationResult};
use crate::CONFIG_FILENAME;

/// Environment variable holding an explicit config path.
pub const ENV_CONFIG_PATH: &str = "PHOTOPI_CONFIG";

/// Application name for XDG directories.
const APP_NAME: &str = "photopi";

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Explicitly provided via `--config`.
    CliArgument,

    /// Set via `PHOTOPI_CONFIG`.
    Environment,

    /// `./photopi.yaml`.
    WorkingDir,

    /// Found in the XDG config directory.
    XdgConfig,

    /// `~/.photopi.yaml`.
    HomeDir,

    /// `/etc/photopi.yaml`.
    SystemConfig,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::WorkingDir => write!(f, "working directory"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::HomeDir => write!(f, "home directory"),
            ConfigSource::SystemConfig => write!(f, "system config"),
        }
    }
}

/// The locations consulted when no `--config` is given.
///
/// Captured once from the process environment so resolution itself is a pure
/// function of this struct.
#[derive(Debug, Clone)]
pub struct SearchPaths {
    pub env_path: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub xdg_config_dir: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub system_dir: PathBuf,
}

impl SearchPaths {
    pub fn from_env() -> Self {
        SearchPaths {
            env_path: std::env::var_os(ENV_CONFIG_PATH)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            working_dir: PathBuf::from("."),
            xdg_config_dir: dirs::config_dir(),
            home_dir: dirs::home_dir(),
            system_dir: PathBuf::from("/etc"),
        }
    }

    /// Candidate files in resolution order, excluding the CLI argument.
    pub fn candidates(&self) -> Vec<(PathBuf, ConfigSource)> {
        let mut out = Vec::new();
        if let Some(path) = &self.env_path {
            out.push((path.clone(), ConfigSource::Environment));
        }
        out.push((
            self.working_dir.join(CONFIG_FILENAME),
            ConfigSource::WorkingDir,
        ));
        if let Some(dir) = &self.xdg_config_dir {
            out.push((
                dir.join(APP_NAME).join(CONFIG_FILENAME),
                ConfigSource::XdgConfig,
            ));
        }
        if let Some(home) = &self.home_dir {
            out.push((
                home.join(format!(".{}", CONFIG_FILENAME)),
                ConfigSource::HomeDir,
            ));
        }
        out.push((
            self.system_dir.join(CONFIG_FILENAME),
            ConfigSource::SystemConfig,
        ));
        out
    }

    /// Pick the configuration file to load.
    ///
    /// An explicit CLI path must exist; it never falls through to the
    /// search locations.
    pub fn resolve(&self, cli_path: Option<&Path>) -> Result<(PathBuf, ConfigSource), ConfigError> {
        if let Some(path) = cli_path {
            if path.is_file() {
                return Ok((path.to_path_buf(), ConfigSource::CliArgument));
            }
            return Err(ConfigError::NotFound {
                searched: vec![path.to_path_buf()],
            });
        }

        let candidates = self.candidates();
        if let Some((path, source)) = candidates.iter().find(|(p, _)| p.is_file()) {
            return Ok((path.clone(), *source));
        }

        Err(ConfigError::NotFound {
            searched: candidates.into_iter().map(|(p, _)| p).collect(),
        })
    }
}

/// A loaded configuration plus where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub config: PhotopiConfig,
    pub path: PathBuf,
    pub source: ConfigSource,
    /// SHA-256 of the raw file content.
    pub sha256: String,
}

impl ResolvedConfig {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_config(&self.config)
    }
}

/// Resolve, read, and parse the configuration (without validating it).
pub fn load_config(
    cli_path: Option<&Path>,
    search: &SearchPaths,
) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = search.resolve(cli_path)?;
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = PhotopiConfig::from_yaml_str(&content, &path)?;

    Ok(ResolvedConfig {
        config,
        path,
        source,
        sha256: hash_content(&content),
    })
}

/// Compute SHA-256 hash of content.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_search(root: &Path) -> SearchPaths {
        SearchPaths {
            env_path: None,
            working_dir: root.join("cwd"),
            xdg_config_dir: Some(root.join("xdg")),
            home_dir: Some(root.join("home")),
            system_dir: root.join("etc"),
        }
    }

    #[test]
    fn test_config_source_display() {
        assert_eq!(ConfigSource::CliArgument.to_string(), "CLI argument");
        assert_eq!(ConfigSource::HomeDir.to_string(), "home directory");
        assert_eq!(ConfigSource::SystemConfig.to_string(), "system config");
    }

    #[test]
    fn test_candidate_order() {
        let root = Path::new("/r");
        let mut search = empty_search(root);
        search.env_path = Some(PathBuf::from("/env/photopi.yaml"));

        let sources: Vec<_> = search.candidates().into_iter().map(|(_, s)| s).collect();
        assert_eq!(
            sources,
            vec![
                ConfigSource::Environment,
                ConfigSource::WorkingDir,
                ConfigSource::XdgConfig,
                ConfigSource::HomeDir,
                ConfigSource::SystemConfig,
            ]
        );
        assert_eq!(
            search.candidates()[3].0,
            PathBuf::from("/r/home/.photopi.yaml")
        );
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_content("a"), hash_content("a"));
        assert_ne!(hash_content("a"), hash_content("b"));
        assert_eq!(hash_content("").len(), 64);
    }
}
