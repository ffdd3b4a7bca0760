use std::fs;

use assert_cmd::Command;
use predicates::str::contains;

const BINARY_NAME: &str = "pgncensus";

#[test]
fn help_banner_lists_the_documented_flags() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.arg("--help");
    cmd.assert().success().stdout(
        contains("--minCount")
            .and(contains("--saveCount"))
            .and(contains("--maxPlies"))
            .and(contains("--matchEngine")),
    );
}

#[test]
fn missing_input_target_exits_nonzero() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.assert().failure().code(1);
}

#[test]
fn save_count_without_omit_move_counter_is_rejected() {
    let dir = std::env::temp_dir().join(format!("pgncensus-cli-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.arg("--dir").arg(&dir).arg("--saveCount");
    cmd.assert().failure().code(1).stderr(contains("omitMoveCounter"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn end_to_end_run_produces_the_expected_output_file() {
    let dir = std::env::temp_dir().join(format!("pgncensus-cli-e2e-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("game.pgn"),
        "[Event \"Test\"]\n[Result \"1-0\"]\n\n1. e4 e5 2. Nf3 Nc6 1-0\n",
    )
    .unwrap();
    let output_path = dir.join("out.epd");

    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.arg("--dir")
        .arg(&dir)
        .arg("--maxPlies")
        .arg("4")
        .arg("--minCount")
        .arg("1")
        .arg("-o")
        .arg(&output_path);
    cmd.assert().success();

    let contents = fs::read_to_string(&output_path).expect("output file written");
    assert_eq!(contents.lines().count(), 4);

    let _ = fs::remove_dir_all(&dir);
}
