//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::config::PhotopiConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &PhotopiConfig) -> ValidationResult<()> {
    if config.device_id.is_empty() {
        return Err(ValidationError::MissingField("device_id".to_string()));
    }
    if !config.device().is_valid() {
        return Err(ValidationError::InvalidValue {
            field: "device_id".to_string(),
            message: format!(
                "must not contain '.', '/' or '\\', got {:?}",
                config.device_id
            ),
        });
    }

    if config.max_files == 0 {
        return Err(ValidationError::InvalidValue {
            field: "max_files".to_string(),
            message: "must be > 0".to_string(),
        });
    }

    if config.storage_nodes.is_empty() {
        return Err(ValidationError::SemanticError(
            "storage_nodes must define at least one node".to_string(),
        ));
    }

    for (name, path) in config.storage_nodes.iter() {
        if path.as_os_str().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("storage_nodes.{}", name),
                message: "path must not be empty".to_string(),
            });
        }
    }

    for (field, node) in [
        ("default_node", &config.default_node),
        ("swap_node", &config.swap_node),
    ] {
        if !config.storage_nodes.contains(node) {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("node {:?} is not defined under storage_nodes", node),
            });
        }
    }

    Ok(())
}
