//! End-to-end tests for the stitch, parse and batch commands.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const DAY_ONE: &str = "\
equip hat iron helm

[1] Noob Cave
Encounter: crate
Round 0: Tester wins initiative!
Round 1: Tester wins the fight!
After Battle: You gain 10 Meat

[2] Noob Cave
Encounter: crate

eat 1 Hell ramen
You gain 6 Adventures
";

const DAY_TWO: &str = "\
[3] The Haunted Pantry
Encounter: Spookyraven Pantry
";

fn alv_binary() -> String {
    env!("CARGO_BIN_EXE_alv").to_string()
}

/// Runs alv with its home directory pointed at `home` so no user config leaks in.
fn alv(home: &Path, args: &[&str]) -> Output {
    Command::new(alv_binary())
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run alv")
}

fn write_daily_logs(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join("Tester_20130521.txt"), DAY_ONE).unwrap();
    std::fs::write(dir.join("Tester_20130522.txt"), DAY_TWO).unwrap();
}

#[test]
fn test_stitch_then_parse_json() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    let out = temp.path().join("out");
    write_daily_logs(&logs);

    let stitched = alv(
        temp.path(),
        &["stitch", logs.to_str().unwrap(), "--out", out.to_str().unwrap()],
    );
    assert!(
        stitched.status.success(),
        "alv stitch should succeed: {}",
        String::from_utf8_lossy(&stitched.stderr)
    );
    let condensed = out.join("Tester-20130521.txt");
    assert!(String::from_utf8_lossy(&stitched.stdout).contains("Tester-20130521.txt"));
    let text = std::fs::read_to_string(&condensed).unwrap();
    assert_eq!(text.matches("===Day 2===").count(), 1);

    let parsed = alv(temp.path(), &["parse", condensed.to_str().unwrap(), "--json"]);
    assert!(
        parsed.status.success(),
        "alv parse should succeed: {}",
        String::from_utf8_lossy(&parsed.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&parsed.stdout).unwrap();
    let summary = &json[0]["summary"];
    assert_eq!(json[0]["log"], "Tester-20130521");
    assert_eq!(summary["total_turns"], 3);
    assert_eq!(summary["days"], 2);
    assert_eq!(summary["adventures_from_consumables"], 6);
    assert_eq!(summary["meat"]["gained"], 10);
}

#[test]
fn test_batch_text_output_and_scratch_cleanup() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    let scratch = temp.path().join("scratch");
    write_daily_logs(&logs);

    let output = Command::new(alv_binary())
        .env("HOME", temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join(".config"))
        .env("ALV_SCRATCH_DIR", &scratch)
        .args(["batch", logs.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "alv batch should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ASCENSION: Tester-20130521"));
    assert!(stdout.contains("Turns: 3 over 2 days"));
    assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
}

#[test]
fn test_batch_keep_leaves_stitched_logs() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    let scratch = temp.path().join("scratch");
    write_daily_logs(&logs);
    let config = temp.path().join("alv.toml");
    std::fs::write(
        &config,
        format!("scratch_dir = {:?}\nworker_threads = 1\n", scratch.to_str().unwrap()),
    )
    .unwrap();

    let output = alv(
        temp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "batch",
            logs.to_str().unwrap(),
            "--keep",
            "--json",
        ],
    );

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["ascensions"].as_array().unwrap().len(), 1);
    assert!(json["failures"].as_array().unwrap().is_empty());
    assert!(scratch.join("Tester-20130521.txt").is_file());
}

#[test]
fn test_parse_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("Nobody-20130521.txt");

    let output = alv(temp.path(), &["parse", missing.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse"), "stderr: {stderr}");
}

#[test]
fn test_stitch_empty_directory_fails() {
    let temp = TempDir::new().unwrap();
    let logs = temp.path().join("logs");
    std::fs::create_dir_all(&logs).unwrap();

    let output = alv(temp.path(), &["stitch", logs.to_str().unwrap()]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no daily session logs"));
}
