//! Command orchestration.
//!
//! Each submodule turns parsed arguments plus the resolved configuration into
//! a [`crate::output::Report`]. [`run`] wires logging context, rendering and
//! exit codes around them.

pub mod config;
pub mod expand;
pub mod fetch;
pub mod ls;
pub mod sweep;
pub mod version;
pub mod zip;

use pp_common::{DeviceId, Error, Label, Result};
use pp_config::{load_config, ConfigError, PhotopiConfig, ResolvedConfig, SearchPaths};
use std::path::PathBuf;

use crate::cli::{Cli, Commands, ConfigCommands, GlobalOpts};
use crate::exit_codes::ExitCode;
use crate::log_event;
use crate::logging::{event_names, generate_run_id, LogContext, Stage};
use crate::output::{render, render_error, Report};

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub global: GlobalOpts,
    pub log: LogContext,
    search: SearchPaths,
}

impl Context {
    pub fn new(global: GlobalOpts, log: LogContext, search: SearchPaths) -> Self {
        Context { global, log, search }
    }

    /// Resolve and parse the configuration without validating it.
    pub fn load_config(&self) -> Result<ResolvedConfig> {
        match load_config(self.global.config.as_deref(), &self.search) {
            Ok(resolved) => {
                let path = resolved.path.display().to_string();
                let source = resolved.source.to_string();
                log_event!(
                    self.log,
                    DEBUG,
                    event_names::CONFIG_LOADED,
                    Stage::Init,
                    "configuration loaded",
                    path = path.as_str(),
                    source = source.as_str()
                );
                Ok(resolved)
            }
            Err(e) => {
                log_event!(self.log, ERROR, event_names::CONFIG_ERROR, Stage::Init, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Resolved configuration that passed validation.
    pub fn config(&self) -> Result<ResolvedConfig> {
        let resolved = self.load_config()?;
        resolved.validate().map_err(ConfigError::from)?;
        Ok(resolved)
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Ls(_) => "ls",
        Commands::Zip(_) => "zip",
        Commands::Expand(_) => "expand",
        Commands::Fetch(_) => "fetch",
        Commands::Sweep(_) => "sweep",
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => "config show",
            ConfigCommands::Validate => "config validate",
        },
        Commands::Version => "version",
    }
}

/// Run a parsed command line against the process environment.
pub fn run(cli: &Cli) -> ExitCode {
    run_with(cli, SearchPaths::from_env())
}

/// Run a parsed command line with explicit config search paths.
pub fn run_with(cli: &Cli, search: SearchPaths) -> ExitCode {
    let name = command_name(&cli.command);
    let ctx = Context::new(cli.global.clone(), LogContext::new(generate_run_id(), name), search);
    log_event!(ctx.log, DEBUG, event_names::RUN_STARTED, Stage::Init, "run started");

    let result = match &cli.command {
        Commands::Ls(args) => ls::run(&ctx, args).and_then(|r| emit(&ctx, &r)),
        Commands::Zip(args) => zip::run(&ctx, args).and_then(|r| emit(&ctx, &r)),
        Commands::Expand(args) => expand::run(&ctx, args).and_then(|r| emit(&ctx, &r)),
        Commands::Fetch(args) => fetch::run(&ctx, args).and_then(|r| emit(&ctx, &r)),
        Commands::Sweep(args) => sweep::run(&ctx, args).and_then(|r| emit(&ctx, &r)),
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => config::show(&ctx).and_then(|r| emit(&ctx, &r)),
            ConfigCommands::Validate => config::validate(&ctx).and_then(|r| emit(&ctx, &r)),
        },
        Commands::Version => emit(&ctx, &version::VersionReport::current()),
    };

    match result {
        Ok(code) => {
            log_event!(
                ctx.log,
                DEBUG,
                event_names::RUN_FINISHED,
                Stage::Init,
                "run finished",
                exit_code = code.as_i32()
            );
            code
        }
        Err(e) => {
            let code = ExitCode::for_error(&e);
            log_event!(
                ctx.log,
                ERROR,
                event_names::RUN_FAILED,
                Stage::Init,
                &e.to_string(),
                error_code = e.code()
            );
            eprintln!("{}", render_error(&e, name, ctx.global.format, &ctx.log.run_id));
            code
        }
    }
}

fn emit<R: Report>(ctx: &Context, report: &R) -> Result<ExitCode> {
    let out = render(report, ctx.global.format, &ctx.log.run_id)?;
    println!("{}", out);
    Ok(report.exit_code())
}

// ============================================================================
// Argument resolution shared by commands
// ============================================================================

/// Validate a device id given on the command line.
pub(crate) fn parse_device(value: &str) -> Result<DeviceId> {
    let device = DeviceId::new(value);
    if device.is_valid() {
        Ok(device)
    } else {
        Err(Error::InvalidArgument(format!(
            "device id must be non-empty and contain no '.' or '/': {:?}",
            value
        )))
    }
}

/// Validate a label given on the command line.
pub(crate) fn parse_label(value: &str) -> Result<Label> {
    if value.is_empty() || value.starts_with('.') || value.contains(['/', '\\']) {
        return Err(Error::InvalidArgument(format!("invalid label: {:?}", value)));
    }
    Ok(Label::new(value))
}

/// `--device`, falling back to the configured device id.
pub(crate) fn resolve_device(arg: Option<&str>, config: &PhotopiConfig) -> Result<DeviceId> {
    match arg {
        Some(value) => parse_device(value),
        None if config.device_id.is_empty() => Err(Error::InvalidArgument(
            "no --device given and no device_id configured".to_string(),
        )),
        None => parse_device(&config.device_id),
    }
}

/// `--label`, falling back to today's date.
pub(crate) fn resolve_label(arg: Option<&str>) -> Result<Label> {
    match arg {
        Some(value) => parse_label(value),
        None => Ok(Label::today()),
    }
}

/// `--node`, falling back to the configured default node.
pub(crate) fn resolve_node(arg: Option<&str>, config: &PhotopiConfig) -> Result<(String, PathBuf)> {
    let name = arg.unwrap_or(&config.default_node);
    let root = config.node_path(name)?.to_path_buf();
    Ok((name.to_string(), root))
}

pub(crate) fn resolve_max_files(arg: Option<usize>, config: &PhotopiConfig) -> Result<usize> {
    match arg.unwrap_or(config.max_files) {
        0 => Err(Error::InvalidArgument("--max-files must be at least 1".to_string())),
        n => Ok(n),
    }
}
