//! photopi core library
//!
//! This library backs the `photopi` binary:
//! - Command line definition (clap)
//! - Command orchestration over pp-bundle
//! - Report rendering (JSON, Markdown, summary)
//! - Exit codes
//! - Structured logging
//!
//! The binary entry point is in `main.rs`.

pub mod cli;
pub mod commands;
pub mod exit_codes;
pub mod logging;
pub mod output;
