//! End-to-end tests for the boardsel binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn boardsel() -> Command {
    let mut cmd = Command::cargo_bin("boardsel").expect("boardsel binary");
    for var in [
        "GITHUB_OUTPUT",
        "GITHUB_STEP_SUMMARY",
        "CHANGED_FILES",
        "LAST_FAILED_JOBS",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// A repo root with a board mapping and per-board settings as JSON files.
fn create_temp_repo() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    let root = td.path();

    fs::write(
        root.join("boards.json"),
        r#"{
  "raspberry_pi_pico": {"port": "raspberrypi", "alias": false},
  "raspberry_pi_pico_w": {"port": "raspberrypi", "alias": false},
  "adafruit_feather_esp32s3": {"port": "espressif", "alias": false},
  "pico_alias": {"port": "raspberrypi", "alias": true},
  "fomu": {"port": "litex", "alias": false}
}"#,
    )
    .unwrap();
    fs::write(
        root.join("settings.json"),
        r#"{
  "raspberry_pi_pico": {"SRC_SUPERVISOR": "supervisor/shared/usb.c", "SRC_PATTERNS": "busio/%", "CIRCUITPY_WEB_WORKFLOW": "0"},
  "raspberry_pi_pico_w": {"SRC_SUPERVISOR": "supervisor/shared/usb.c", "SRC_PATTERNS": "busio/% socket/%", "CIRCUITPY_WEB_WORKFLOW": "$(CIRCUITPY_WIFI)", "CIRCUITPY_WIFI": "1"},
  "adafruit_feather_esp32s3": {"SRC_SUPERVISOR": "supervisor/shared/usb.c", "SRC_PATTERNS": "socket/%", "CIRCUITPY_WEB_WORKFLOW": "1"},
  "fomu": {"SRC_SUPERVISOR": "", "SRC_PATTERNS": "busio/%", "CIRCUITPY_WEB_WORKFLOW": "0"}
}"#,
    )
    .unwrap();

    td
}

fn matrix(root: &Path) -> Command {
    let mut cmd = boardsel();
    cmd.current_dir(root)
        .arg("matrix")
        .arg("--board-info")
        .arg(root.join("boards.json"))
        .arg("--settings-json")
        .arg(root.join("settings.json"));
    cmd
}

#[test]
fn test_matrix_prints_outputs_without_github_output() {
    let temp = create_temp_repo();

    matrix(temp.path())
        .arg("ports/raspberrypi/common-hal/socket/SSLSocket.c")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"Would set GitHub actions output boards-arm to '["raspberry_pi_pico_w"]'"#,
        ))
        .stdout(predicate::str::contains(
            "Would set GitHub actions output boards-espressif to '[]'",
        ))
        .stdout(predicate::str::contains(
            "Would set GitHub actions output build-doc to 'false'",
        ))
        .stdout(predicate::str::contains("Building boards:\n  raspberry_pi_pico_w\n"));
}

#[test]
fn test_matrix_appends_to_output_file() {
    let temp = create_temp_repo();
    let output = temp.path().join("github_output");

    matrix(temp.path())
        .arg("--output")
        .arg(&output)
        .arg("docs/index.rst")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "boards-aarch=[]\nboards-arm=[]\nboards-riscv=[]\nboards-espressif=[]\nbuild-doc=true\n"
    );
}

#[test]
fn test_matrix_reads_environment_when_no_paths() {
    let temp = create_temp_repo();
    let output = temp.path().join("github_output");

    matrix(temp.path())
        .env("GITHUB_OUTPUT", &output)
        .env("CHANGED_FILES", r#"[\"tests/foo.c\"]"#)
        .env("LAST_FAILED_JOBS", r#"{"build-riscv": ["fomu"]}"#)
        .assert()
        .success();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("boards-riscv=[\"fomu\"]\n"));
    assert!(text.contains("boards-arm=[]\n"));
    assert!(text.contains("build-doc=false\n"));
}

#[test]
fn test_matrix_empty_changed_files_builds_everything() {
    let temp = create_temp_repo();
    let output = temp.path().join("github_output");
    let summary = temp.path().join("summary.md");

    matrix(temp.path())
        .arg("--output")
        .arg(&output)
        .arg("--summary")
        .arg(&summary)
        .env("CHANGED_FILES", "")
        .env("LAST_FAILED_JOBS", "")
        .assert()
        .success();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains(
        "boards-arm=[\"raspberry_pi_pico\",\"raspberry_pi_pico_w\"]\n"
    ));
    assert!(text.contains("boards-riscv=[\"fomu\"]\n"));
    assert!(text.contains("build-doc=true\n"));
    assert!(!text.contains("pico_alias"));

    let md = fs::read_to_string(&summary).unwrap();
    assert!(md.contains("- Mode: build all\n"));
}

#[test]
fn test_matrix_missing_environment_fails() {
    let temp = create_temp_repo();

    matrix(temp.path())
        .env("CHANGED_FILES", "[]")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("LAST_FAILED_JOBS"));
}

#[test]
fn test_matrix_missing_setting_fails() {
    let temp = create_temp_repo();
    fs::write(
        temp.path().join("settings.json"),
        r#"{"raspberry_pi_pico": {"SRC_SUPERVISOR": "", "CIRCUITPY_WEB_WORKFLOW": "0"}}"#,
    )
    .unwrap();

    matrix(temp.path())
        .arg("ports/raspberrypi/common-hal/busio/I2C.c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SRC_PATTERNS"));
}

#[test]
fn test_matrix_uses_config_file_rules() {
    let temp = create_temp_repo();
    fs::write(
        temp.path().join("boardsel.toml"),
        "[rules]\nignore_dirs = [\"locale\"]\n",
    )
    .unwrap();
    let output = temp.path().join("github_output");

    matrix(temp.path())
        .arg("--output")
        .arg(&output)
        .arg("locale/de_DE.po")
        .assert()
        .success();

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.contains("boards-arm=[]\n"));
}

#[test]
fn test_matrix_discovers_boards_from_tree() {
    let temp = create_temp_repo();
    let board_dir = temp.path().join("ports/litex/boards/fomu");
    fs::create_dir_all(&board_dir).unwrap();
    fs::write(board_dir.join("mpconfigboard.mk"), "CIRCUITPY_FULL_BUILD = 0\n").unwrap();

    boardsel()
        .current_dir(temp.path())
        .arg("matrix")
        .arg("--settings-json")
        .arg(temp.path().join("settings.json"))
        .arg("ports/litex/boards/fomu/board.c")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"output boards-riscv to '["fomu"]'"#,
        ));
}

#[test]
fn test_classify_explains_each_path() {
    let temp = create_temp_repo();

    boardsel()
        .current_dir(temp.path())
        .args([
            "classify",
            "ports/nrf/boards/pca10056/board.c",
            "ports/unix/main.c",
            "shared-bindings/busio/I2C.c",
            "py/obj.c",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("ports/nrf/boards/pca10056/board.c: board pca10056"))
        .stdout(predicate::str::contains("ports/unix/main.c: ignored (host port)"))
        .stdout(predicate::str::contains(
            "shared-bindings/busio/I2C.c: depends on board settings (port=*, module=busio)",
        ))
        .stdout(predicate::str::contains("py/obj.c: unclassified: build everything"));
}

#[test]
fn test_classify_requires_paths() {
    boardsel().arg("classify").assert().failure();
}

#[test]
fn test_failed_jobs_reads_stdin() {
    let temp = create_temp_repo();
    let output = temp.path().join("github_output");

    boardsel()
        .current_dir(temp.path())
        .arg("failed-jobs")
        .arg("--output")
        .arg(&output)
        .write_stdin("build-arm (pygamer)\n\nbuild-doc\ntest (ubuntu-latest)\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("build-arm: pygamer"));

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "checkruns={\"build-arm\":[\"pygamer\"],\"build-doc\":[]}\n"
    );
}

#[test]
fn test_failed_jobs_output_feeds_matrix() {
    let temp = create_temp_repo();
    let out = boardsel()
        .args(["failed-jobs", "build-espressif (adafruit_feather_esp32s3)"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let report = stdout
        .lines()
        .find_map(|l| {
            l.strip_prefix("Would set GitHub actions output checkruns to '")
                .and_then(|r| r.strip_suffix('\''))
        })
        .expect("checkruns line");
    let parsed: serde_json::Value = serde_json::from_str(report).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({"build-espressif": ["adafruit_feather_esp32s3"]})
    );

    let output = temp.path().join("github_output");
    matrix(temp.path())
        .arg("--output")
        .arg(&output)
        .env("CHANGED_FILES", r#"["tests/foo.c"]"#)
        .env("LAST_FAILED_JOBS", report)
        .assert()
        .success();
    assert!(
        fs::read_to_string(&output)
            .unwrap()
            .contains("boards-espressif=[\"adafruit_feather_esp32s3\"]\n")
    );
}
