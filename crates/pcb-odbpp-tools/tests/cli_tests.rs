//! CLI integration tests

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use odbpp::Board;
use odbpp::board::{BoardLayer, Track};
use odbpp::geom::Point;
use predicates::prelude::*;

fn board_json() -> String {
    let mut board = Board::new(2);
    board.name = "demo".into();
    let gnd = board.add_net("GND");
    board.tracks.push(Track::segment(
        Point::new(0, 0),
        Point::new(2_000_000, 0),
        200_000,
        BoardLayer::FCu,
        gnd,
    ));
    board.to_json().unwrap()
}

fn pcb_odbpp() -> Command {
    let mut cmd = cargo_bin_cmd!("pcb-odbpp");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn export_writes_job_directory() {
    let temp = TempDir::new().unwrap();
    let board = temp.child("board.json");
    board.write_str(&board_json()).unwrap();
    let out = temp.child("job");

    pcb_odbpp()
        .arg("export")
        .arg(board.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Exported"));

    out.child("matrix/matrix").assert(predicate::path::exists());
    out.child("steps/pcb/layers/f.cu/features")
        .assert(predicate::str::contains("L "));
}

#[test]
fn export_flags_select_units_step_and_archive() {
    let temp = TempDir::new().unwrap();
    let board = temp.child("board.json");
    board.write_str(&board_json()).unwrap();
    let out = temp.child("job");

    pcb_odbpp()
        .args(["export", "--units", "inch", "--step", "main", "--compress", "zip"])
        .arg(board.path())
        .arg("-o")
        .arg(out.path())
        .assert()
        .success();

    temp.child("job.zip").assert(predicate::path::exists());
    out.assert(predicate::path::missing());
}

#[test]
fn export_reads_config_file() {
    let temp = TempDir::new().unwrap();
    let board = temp.child("board.json");
    board.write_str(&board_json()).unwrap();
    let config = temp.child("odb.toml");
    config.write_str("step_name = \"panel\"\nunits = \"inch\"\n").unwrap();
    let out = temp.child("job");

    pcb_odbpp()
        .arg("export")
        .arg(board.path())
        .arg("-o")
        .arg(out.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success();

    out.child("steps/panel/stephdr")
        .assert(predicate::str::contains("UNITS=INCH"));
}

#[test]
fn info_lists_matrix_layers() {
    let temp = TempDir::new().unwrap();
    let board = temp.child("board.json");
    board.write_str(&board_json()).unwrap();

    pcb_odbpp()
        .arg("info")
        .arg(board.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Layer Matrix"))
        .stdout(predicate::str::contains("comp_+_top"))
        .stdout(predicate::str::contains("f.cu"));
}

#[test]
fn info_json_output() {
    let temp = TempDir::new().unwrap();
    let board = temp.child("board.json");
    board.write_str(&board_json()).unwrap();

    let output = pcb_odbpp()
        .args(["info", "--format", "json"])
        .arg(board.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["name"], "demo");
    assert_eq!(info["stats"]["nets"], 1);
    assert_eq!(info["layers"][0]["name"], "comp_+_top");
}

#[test]
fn missing_board_file_fails() {
    let temp = TempDir::new().unwrap();

    pcb_odbpp()
        .arg("info")
        .arg(temp.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}
