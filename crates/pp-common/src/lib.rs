//! photopi common types, artifact naming, and errors.
//!
//! This crate provides foundational types shared across the photopi crates:
//! - Identity newtypes for devices, labels, fragments, and images
//! - The single naming module that parses and formats on-disk artifact names
//! - The unified error type used at the CLI boundary
//! - Output format selection

pub mod error;
pub mod id;
pub mod naming;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use id::{DeviceId, FragmentNumber, ImageIndex, Label};
pub use naming::{extract_label, ArtifactName};
pub use output::OutputFormat;
