//! End-to-end CLI tests against real storage nodes in a temp directory.
//!
//! Each test writes its own `photopi.yaml` and drives the `photopi` binary
//! through the full zip, ls, expand, fetch and sweep cycle.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    tmp: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("photopi.yaml");
        fs::write(
            &config,
            format!(
                "device_id: pp1\nmax_files: 10\nstorage_nodes:\n  local: {}\n  swap: {}\n  nas: {}\n",
                tmp.path().join("local").display(),
                tmp.path().join("swap").display(),
                tmp.path().join("nas").display()
            ),
        )
        .unwrap();
        Fixture { tmp, config }
    }

    fn node(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    fn capture(&self, label: &str, first: u64, last: u64) {
        self.capture_on("local", label, first, last);
    }

    fn capture_on(&self, node: &str, label: &str, first: u64, last: u64) {
        let dir = self.node(node).join("pp1").join(label);
        fs::create_dir_all(&dir).unwrap();
        for i in first..=last {
            fs::write(dir.join(format!("image{:06}.jpg", i)), format!("jpeg {}", i)).unwrap();
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("photopi");
        cmd.current_dir(self.tmp.path())
            .env_remove("PHOTOPI_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .arg("-q");
        cmd
    }

    /// Run and parse the JSON envelope on stdout, asserting the exit code.
    fn json(&self, args: &[&str], code: i32) -> Value {
        let output = self.cmd().args(args).assert().code(code).get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }
}

fn archive(root: &Path, label: &str, part: u32) -> PathBuf {
    root.join("pp1").join(format!("{}.pp1.p{}.tar.gz", label, part))
}

fn marker(root: &Path, label: &str, part: u32) -> PathBuf {
    root.join("pp1").join(format!(".{}.pp1.p{}.done", label, part))
}

mod zip {
    use super::*;

    #[test]
    fn zip_archives_one_fragment_per_run() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 25);

        let first = fx.json(&["zip", "--label", "day1"], 1);
        assert_eq!(first["command"], "zip");
        assert_eq!(first["status"], "OK_WORK_DONE");
        assert_eq!(first["result"]["fragment"]["number"], 1);
        assert_eq!(first["result"]["archived"]["images"], 10);
        assert_eq!(first["result"]["last_image_number"], 10);
        assert_eq!(fs::read_to_string(marker(&fx.node("local"), "day1", 1)).unwrap(), "10");

        fx.json(&["zip", "--label", "day1"], 1);
        let third = fx.json(&["zip", "--label", "day1"], 1);
        assert_eq!(third["result"]["archived"]["images"], 5);
        assert_eq!(third["result"]["last_image_number"], 25);

        let done = fx.json(&["zip", "--label", "day1"], 0);
        assert_eq!(done["status"], "OK_CLEAN");
        assert!(done["result"]["archived"].is_null());

        for part in 1..=3 {
            assert!(archive(&fx.node("local"), "day1", part).is_file());
        }
        assert!(!archive(&fx.node("local"), "day1", 4).exists());
    }

    #[test]
    fn zip_direct_destination_keeps_marker_local() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 4);
        fs::create_dir_all(fx.node("nas")).unwrap();

        let report = fx.json(&["zip", "--label", "day1", "--dest", "nas"], 1);
        assert_eq!(report["result"]["placement"]["kind"], "direct");
        assert!(archive(&fx.node("nas"), "day1", 1).is_file());
        assert!(marker(&fx.node("local"), "day1", 1).is_file());
        assert!(!archive(&fx.node("local"), "day1", 1).exists());
    }

    #[test]
    fn zip_relay_moves_archive_and_marker() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 4);
        fs::create_dir_all(fx.node("nas")).unwrap();

        let report = fx.json(&["zip", "--label", "day1", "--dest", "nas", "--relay"], 1);
        assert_eq!(report["result"]["placement"]["kind"], "relayed");
        assert!(archive(&fx.node("nas"), "day1", 1).is_file());
        assert!(marker(&fx.node("nas"), "day1", 1).is_file());
        assert!(!archive(&fx.node("local"), "day1", 1).exists());
        assert!(!marker(&fx.node("local"), "day1", 1).exists());
    }

    #[test]
    fn zip_summary_format() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 3);

        fx.cmd()
            .args(["-f", "summary", "zip", "--label", "day1"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("run-"))
            .stdout(predicate::str::contains("p1"));
    }

    #[test]
    fn corrupt_marker_is_precondition_error() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 3);
        fx.json(&["zip", "--label", "day1"], 1);
        fs::write(marker(&fx.node("local"), "day1", 1), "garbage").unwrap();

        fx.cmd()
            .args(["ls", "--label", "day1"])
            .assert()
            .code(15)
            .stderr(predicate::str::contains("ERR_PRECONDITION"));
    }
}

mod catalog {
    use super::*;

    #[test]
    fn ls_shows_single_bundle_detail() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 12);
        fx.json(&["zip", "--label", "day1"], 1);
        fx.json(&["zip", "--label", "day1"], 1);

        let report = fx.json(&["ls", "--label", "day1"], 0);
        let detail = &report["result"]["bundle"];
        assert_eq!(detail["node"], "local");
        assert_eq!(detail["last_image_number"], 12);
        assert_eq!(detail["archives"].as_array().unwrap().len(), 2);
        assert_eq!(detail["archives"][0]["complete"], true);
    }

    #[test]
    fn ls_on_empty_nodes() {
        let fx = Fixture::new();
        let report = fx.json(&["ls"], 0);
        assert_eq!(report["result"]["nodes"].as_array().unwrap().len(), 3);
        assert!(report["result"].get("bundle").is_none());
    }

    #[test]
    fn ls_markdown_lists_nodes() {
        let fx = Fixture::new();
        fx.cmd()
            .args(["-f", "md", "ls"])
            .assert()
            .success()
            .stdout(predicate::str::contains("local"))
            .stdout(predicate::str::contains("nas"));
    }
}

mod expand {
    use super::*;

    #[test]
    fn expand_reassembles_every_image() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 25);
        for _ in 0..3 {
            fx.json(&["zip", "--label", "day1"], 1);
        }

        let out = fx.tmp.path().join("out");
        let report = fx.json(
            &["expand", "--label", "day1", "--dest", out.to_str().unwrap()],
            1,
        );
        assert_eq!(report["result"]["archives"], 3);
        assert_eq!(report["result"]["placed"], 25);
        assert_eq!(fs::read_to_string(out.join("image000017.jpg")).unwrap(), "jpeg 17");

        let again = fx.json(
            &["expand", "--label", "day1", "--dest", out.to_str().unwrap()],
            0,
        );
        assert_eq!(again["result"]["already_present"], 25);
    }

    #[test]
    fn expand_defaults_to_swap_node() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 3);
        fx.json(&["zip", "--label", "day1"], 1);

        fx.json(&["expand", "--label", "day1"], 1);
        assert!(fx
            .node("swap")
            .join("pp1")
            .join("day1")
            .join("image000002.jpg")
            .is_file());
    }
}

mod fetch {
    use super::*;

    #[test]
    fn fetch_copies_completed_archives() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 15);
        fx.json(&["zip", "--label", "day1"], 1);
        fx.json(&["zip", "--label", "day1"], 1);

        let report = fx.json(&["fetch", "--src", "local", "--dest", "nas", "--done"], 1);
        assert_eq!(report["result"]["archives"], 2);
        assert_eq!(report["result"]["markers"], 2);
        assert_eq!(report["result"]["moved"], false);
        assert!(archive(&fx.node("nas"), "day1", 2).is_file());
        assert!(archive(&fx.node("local"), "day1", 2).is_file());
    }

    #[test]
    fn fetch_move_removes_sources() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 5);
        fx.json(&["zip", "--label", "day1"], 1);

        fx.json(&["fetch", "--src", "local", "--dest", "nas", "--move"], 1);
        assert!(archive(&fx.node("nas"), "day1", 1).is_file());
        assert!(marker(&fx.node("nas"), "day1", 1).is_file());
        assert!(!archive(&fx.node("local"), "day1", 1).exists());
    }

    #[test]
    fn fetch_with_nothing_to_do_is_clean() {
        let fx = Fixture::new();
        let report = fx.json(&["fetch", "--src", "local", "--dest", "nas"], 0);
        assert_eq!(report["result"]["archives"], 0);
    }
}

mod sweep {
    use super::*;

    #[test]
    fn sweep_archives_everything_left() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 23);
        fx.capture("day2", 1, 4);

        let report = fx.json(&["sweep"], 1);
        let nodes = report["result"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 3);
        let local = nodes.iter().find(|n| n["node"] == "local").unwrap();
        assert_eq!(local["bundles"].as_array().unwrap().len(), 2);
        assert!(marker(&fx.node("local"), "day1", 3).is_file());
        assert!(marker(&fx.node("local"), "day2", 1).is_file());

        fx.json(&["sweep"], 0);
    }

    #[test]
    fn sweep_covers_every_node() {
        let fx = Fixture::new();
        fx.capture_on("swap", "day9", 1, 3);

        let report = fx.json(&["sweep"], 1);
        let swap = report["result"]["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .find(|n| n["node"] == "swap")
            .unwrap()
            .clone();
        assert_eq!(swap["bundles"].as_array().unwrap().len(), 1);
        assert!(archive(&fx.node("swap"), "day9", 1).is_file());
        assert!(marker(&fx.node("swap"), "day9", 1).is_file());
        assert!(!fx.node("local").join("pp1").exists());
    }

    #[test]
    fn sweep_single_node_leaves_others() {
        let fx = Fixture::new();
        fx.capture("day1", 1, 2);
        fx.capture_on("swap", "day9", 1, 3);

        let report = fx.json(&["sweep", "--node", "local"], 1);
        assert_eq!(report["result"]["nodes"].as_array().unwrap().len(), 1);
        assert!(marker(&fx.node("local"), "day1", 1).is_file());
        assert!(!archive(&fx.node("swap"), "day9", 1).exists());
    }

    #[test]
    fn sweep_recovers_marker_for_archive_on_other_node() {
        let fx = Fixture::new();
        fx.capture("day3", 1, 4);
        fx.json(&["zip", "--label", "day3", "--dest", "nas"], 1);
        let nas_archive = archive(&fx.node("nas"), "day3", 1);
        assert!(nas_archive.is_file());
        fs::remove_file(marker(&fx.node("local"), "day3", 1)).unwrap();

        fx.json(&["sweep"], 1);
        assert!(marker(&fx.node("local"), "day3", 1).is_file());
        assert!(!archive(&fx.node("local"), "day3", 1).exists());
    }
}

mod config {
    use super::*;

    #[test]
    fn config_show_reports_nodes_and_hash() {
        let fx = Fixture::new();
        let report = fx.json(&["config", "show"], 0);
        assert_eq!(report["result"]["valid"], true);
        assert_eq!(report["result"]["source"], "cli_argument");
        assert_eq!(report["result"]["sha256"].as_str().unwrap().len(), 64);
        assert_eq!(report["result"]["config"]["device_id"], "pp1");
    }

    #[test]
    fn config_validate_counts_nodes() {
        let fx = Fixture::new();
        let report = fx.json(&["config", "validate"], 0);
        assert_eq!(report["result"]["nodes"], 3);
    }

    #[test]
    fn version_reports_name() {
        let fx = Fixture::new();
        let report = fx.json(&["version"], 0);
        assert_eq!(report["result"]["name"], "photopi");
    }
}
