//! End-to-end tests of the bsdelta binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn bsdelta(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bsdelta"))
        .args(args)
        .arg("--color=never")
        .current_dir(dir)
        .output()
        .expect("Failed to run bsdelta")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "bsdelta failed: {}\nstdout: {}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
}

fn fixture() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let old: Vec<u8> = (0..20_000u32).map(|i| (i * 31 % 253) as u8).collect();
    let mut new = old.clone();
    new[5000..5005].copy_from_slice(b"HELLO");
    new.extend_from_slice(b"appended tail");
    fs::write(dir.path().join("old.bin"), &old).unwrap();
    fs::write(dir.path().join("new.bin"), &new).unwrap();
    dir
}

#[test]
fn diff_then_patch_roundtrip() {
    let dir = fixture();

    let output = bsdelta(&["diff", "old.bin", "new.bin", "delta.patch"], dir.path());
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Wrote"));

    let output = bsdelta(&["patch", "old.bin", "rebuilt.bin", "delta.patch"], dir.path());
    assert_success(&output);

    let expected = fs::read(dir.path().join("new.bin")).unwrap();
    let rebuilt = fs::read(dir.path().join("rebuilt.bin")).unwrap();
    assert_eq!(rebuilt, expected);
}

#[test]
fn empty_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("empty"), b"").unwrap();
    fs::write(dir.path().join("hello"), b"HELLO").unwrap();

    assert_success(&bsdelta(&["diff", "empty", "hello", "p1"], dir.path()));
    assert_success(&bsdelta(&["patch", "empty", "out1", "p1"], dir.path()));
    assert_eq!(fs::read(dir.path().join("out1")).unwrap(), b"HELLO");

    assert_success(&bsdelta(&["diff", "hello", "empty", "p2"], dir.path()));
    assert_success(&bsdelta(&["patch", "hello", "out2", "p2"], dir.path()));
    assert!(fs::read(dir.path().join("out2")).unwrap().is_empty());
}

#[test]
fn info_json() {
    let dir = fixture();
    assert_success(&bsdelta(&["diff", "old.bin", "new.bin", "delta.patch"], dir.path()));

    let output = bsdelta(&["info", "delta.patch", "--json"], dir.path());
    assert_success(&output);

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let new_len = fs::metadata(dir.path().join("new.bin")).unwrap().len();
    let patch_len = fs::metadata(dir.path().join("delta.patch")).unwrap().len();
    assert_eq!(summary["new_size"], new_len);
    assert_eq!(summary["patch_size"], patch_len);
    assert_eq!(summary["trailing_bytes"], 0);
}

#[test]
fn info_text() {
    let dir = fixture();
    assert_success(&bsdelta(&["diff", "old.bin", "new.bin", "delta.patch"], dir.path()));

    let output = bsdelta(&["info", "delta.patch"], dir.path());
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Records"));
    assert!(stdout.contains("Copied"));
}

#[test]
fn corrupt_patch_fails() {
    let dir = fixture();
    assert_success(&bsdelta(&["diff", "old.bin", "new.bin", "delta.patch"], dir.path()));

    let patch = fs::read(dir.path().join("delta.patch")).unwrap();
    fs::write(dir.path().join("short.patch"), &patch[..patch.len() / 2]).unwrap();

    let output = bsdelta(&["patch", "old.bin", "out.bin", "short.patch"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Corrupt patch"));
    assert!(!dir.path().join("out.bin").exists());
}

#[test]
fn max_output_is_enforced() {
    let dir = fixture();
    assert_success(&bsdelta(&["diff", "old.bin", "new.bin", "delta.patch"], dir.path()));

    let output = bsdelta(
        &["patch", "old.bin", "out.bin", "delta.patch", "--max-output", "100"],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds limit"));
}

#[test]
fn config_file_is_loaded() {
    let dir = fixture();
    fs::write(
        dir.path().join("bsdelta.json"),
        r#"{ "patch": { "max_output_size": 10 } }"#,
    )
    .unwrap();
    assert_success(&bsdelta(&["diff", "old.bin", "new.bin", "delta.patch"], dir.path()));

    let output = bsdelta(
        &["patch", "old.bin", "out.bin", "delta.patch", "--config", "bsdelta.json"],
        dir.path(),
    );
    assert!(!output.status.success());
}

#[test]
fn missing_input_reports_path() {
    let dir = TempDir::new().unwrap();
    let output = bsdelta(&["diff", "nope.bin", "nope2.bin", "p"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope.bin"));
}
