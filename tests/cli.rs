//! CLI interface tests for tilebench.

use assert_cmd::Command;
use predicates::prelude::*;

fn tilebench() -> Command {
    Command::cargo_bin("tilebench").unwrap()
}

mod help_and_version {
    use super::*;

    #[test]
    fn help_displays_subcommands() {
        tilebench()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("tiles"))
            .stdout(predicate::str::contains("uniform"))
            .stdout(predicate::str::contains("report"));
    }

    #[test]
    fn version_displays_version() {
        tilebench()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn tiles_help_shows_options() {
        tilebench()
            .args(["tiles", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--rate"))
            .stdout(predicate::str::contains("--duration"))
            .stdout(predicate::str::contains("--bbox"))
            .stdout(predicate::str::contains("--layergroup"))
            .stdout(predicate::str::contains("--max-workers"));
    }

    #[test]
    fn completions_generate_a_script() {
        tilebench()
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("tilebench"));
    }
}

mod validation {
    use super::*;

    #[test]
    fn rate_zero_is_rejected() {
        tilebench()
            .args(["tiles", "-r", "0"])
            .assert()
            .failure();
    }

    #[test]
    fn inverted_bbox_fails_before_the_attack() {
        tilebench()
            .args(["tiles", "-x", "5,0,2,4", "-d", "1s"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("bounding box"));
    }

    #[test]
    fn malformed_bbox_fails_with_a_message() {
        tilebench()
            .args(["tiles", "-x", "1,2,3", "-d", "1s"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("min_x,min_y,max_x,max_y"));
    }

    #[test]
    fn oversized_bbox_names_the_grid() {
        tilebench()
            .args(["tiles", "-z", "2", "-x", "0,0,9,9", "-d", "1s"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("zoom 2"));
    }

    #[test]
    fn zoom_above_the_grid_limit_is_rejected() {
        tilebench()
            .args(["tiles", "-z", "31"])
            .assert()
            .failure();
    }

    #[test]
    fn report_on_a_missing_file_fails() {
        tilebench()
            .args(["report", "/nonexistent/records.bin"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to open"));
    }
}
