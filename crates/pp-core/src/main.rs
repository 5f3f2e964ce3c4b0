//! photopi - camera image bundle fragmentation, archival and distribution
//!
//! The main entry point: parses the command line, sets up logging on stderr,
//! runs the command and exits with its code.

use clap::Parser;
use pp_core::cli::Cli;
use pp_core::logging::{init_logging, LogConfig, LogLevel};

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_flags(cli.global.quiet, cli.global.verbose),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let exit_code = pp_core::commands::run(&cli);
    std::process::exit(exit_code.as_i32());
}
