//! Command line behavior: exit codes, newest-first policy, output formats.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::{Command, Output};

fn mailcode(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mailcode"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn eml(subject: &str, date: &str, body: &str) -> String {
    format!("Subject: {subject}\r\nDate: {date}\r\nContent-Type: text/plain\r\n\r\n{body}\r\n")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_scan_prefers_newest_message() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("old.eml"),
        eml(
            "Old login",
            "Mon, 3 Mar 2025 09:00:00 +0000",
            "Your verification code is 111983",
        ),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("new.eml"),
        eml(
            "New login",
            "Mon, 3 Mar 2025 09:05:00 +0000",
            "Your verification code is 739204",
        ),
    )
    .unwrap();

    let output = mailcode(dir.path(), &["scan", dir.path().to_str().unwrap()]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "739204");
}

#[test]
fn test_scan_exits_nonzero_without_code() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("invoice.eml");
    std::fs::write(
        &path,
        eml(
            "Invoice #482913 due",
            "Mon, 3 Mar 2025 09:00:00 +0000",
            "Please pay by 5/1/2024",
        ),
    )
    .unwrap();

    let output = mailcode(dir.path(), &["scan", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_scan_json_output() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("messages.json");
    std::fs::write(
        &path,
        r#"[{"subject": "Security code", "body": "Use code: AB12CD to sign in. Ref: 910293847", "id": "m1", "timestamp": 5}]"#,
    )
    .unwrap();

    let output = mailcode(dir.path(), &["--json", "scan", path.to_str().unwrap()]);
    assert!(output.status.success());
    let found: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(found["code"], "AB12CD");
    assert_eq!(found["id"], "m1");
    assert_eq!(found["timestamp"], 5);
}

#[test]
fn test_config_file_overrides_threshold() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("strict.json");
    std::fs::write(&config, r#"{ "accept_min_score": 1000, "weak_context_keywords": [] }"#).unwrap();
    let path = dir.path().join("weak.json");
    std::fs::write(&path, r#"{"subject": "Confirm", "body": "Confirm: 5820 verify"}"#).unwrap();

    let default = mailcode(dir.path(), &["scan", path.to_str().unwrap()]);
    assert!(default.status.success());

    let strict = mailcode(
        dir.path(),
        &["--config", config.to_str().unwrap(), "scan", path.to_str().unwrap()],
    );
    assert_eq!(strict.status.code(), Some(1));
}

#[test]
fn test_explain_lists_candidates() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("otp.json");
    std::fs::write(
        &path,
        r#"{"subject": "Your verification code is 482913", "id": "m9"}"#,
    )
    .unwrap();

    let output = mailcode(dir.path(), &["explain", path.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("m9"));
    assert!(text.contains("accepted: 482913"));
}

#[test]
fn test_patterns_prints_tables() {
    let dir = tempfile::TempDir::new().unwrap();
    let output = mailcode(dir.path(), &["patterns"]);
    assert!(output.status.success());
    let tables: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(tables["context_window"], 80);
    assert_eq!(tables["accept_min_score"], 15);
}

#[test]
fn test_broken_config_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("bad.json");
    std::fs::write(&config, r#"{ "code_patterns": [] }"#).unwrap();

    let output = mailcode(dir.path(), &["--config", config.to_str().unwrap(), "patterns"]);
    assert!(!output.status.success());
}
