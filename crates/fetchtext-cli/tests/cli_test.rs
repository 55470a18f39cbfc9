//! Integration tests for the `fetchtext` binary.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::{Value, json};
use tempfile::TempDir;

fn fetchtext() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_fetchtext"));
    command.env("RUST_LOG", "error");
    command
}

#[test]
fn test_transform_file() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("batch.json");
    fs::write(
        &input_path,
        json!([
            {"id": 1, "url": "~baGVsbG8="},
            {"id": 2, "url": "ftp://example.com/file.txt"},
            {"id": 3}
        ])
        .to_string(),
    )
    .unwrap();

    let output = fetchtext()
        .current_dir(temp_dir.path())
        .args(["transform", input_path.to_str().unwrap()])
        .output()
        .expect("Failed to run fetchtext");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        records,
        json!([
            {"id": 1, "url": "~baGVsbG8=", "_content": "hello"},
            {"id": 2, "url": "ftp://example.com/file.txt", "_content": null},
            {"id": 3}
        ])
    );
}

#[test]
fn test_transform_stdin_with_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.toml");
    fs::write(&config_path, "source_field = \"data\"\ntarget_field = \"text\"\n").unwrap();

    let mut child = fetchtext()
        .current_dir(temp_dir.path())
        .args(["transform", "-c", config_path.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start fetchtext");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"data": "~bYWJj"}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let records: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records, json!([{"data": "~bYWJj", "text": "abc"}]));
}

#[test]
fn test_transform_invalid_payload_fails() {
    let temp_dir = TempDir::new().unwrap();
    let input_path = temp_dir.path().join("bad.json");
    fs::write(&input_path, "42").unwrap();

    let output = fetchtext()
        .current_dir(temp_dir.path())
        .args(["transform", input_path.to_str().unwrap()])
        .output()
        .expect("Failed to run fetchtext");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_transform_missing_file_fails() {
    let output = fetchtext()
        .args(["transform", "/nonexistent/fetchtext/input.json"])
        .output()
        .expect("Failed to run fetchtext");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read input file"));
}
