//! CLI help output tests for photopi.
//!
//! These tests verify that all commands and subcommands correctly display
//! their help text without errors.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

fn photopi() -> Command {
    cargo_bin_cmd!("photopi")
}

mod top_level {
    use super::*;

    #[test]
    fn help_flag_works() {
        photopi()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("camera image bundles"));
    }

    #[test]
    fn version_flag_works() {
        photopi()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("photopi"));
    }

    #[test]
    fn help_shows_all_commands() {
        photopi()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ls"))
            .stdout(predicate::str::contains("zip"))
            .stdout(predicate::str::contains("expand"))
            .stdout(predicate::str::contains("fetch"))
            .stdout(predicate::str::contains("sweep"))
            .stdout(predicate::str::contains("config"));
    }

    #[test]
    fn help_shows_global_options() {
        photopi()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--config"))
            .stdout(predicate::str::contains("--format"))
            .stdout(predicate::str::contains("--verbose"))
            .stdout(predicate::str::contains("--log-format"));
    }
}

mod subcommands {
    use super::*;

    #[test]
    fn zip_help_lists_destination_flags() {
        photopi()
            .args(["zip", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--part"))
            .stdout(predicate::str::contains("--max-files"))
            .stdout(predicate::str::contains("--dest"))
            .stdout(predicate::str::contains("--relay"))
            .stdout(predicate::str::contains("--verify-mount"));
    }

    #[test]
    fn fetch_help_lists_flags() {
        photopi()
            .args(["fetch", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--src"))
            .stdout(predicate::str::contains("--done"))
            .stdout(predicate::str::contains("--move"))
            .stdout(predicate::str::contains("--rsync"));
    }

    #[test]
    fn every_subcommand_has_help() {
        for cmd in [
            vec!["ls"],
            vec!["expand"],
            vec!["sweep"],
            vec!["config"],
            vec!["config", "show"],
            vec!["config", "validate"],
            vec!["version"],
        ] {
            let mut args = cmd.clone();
            args.push("--help");
            photopi().args(&args).assert().success();
        }
    }
}
