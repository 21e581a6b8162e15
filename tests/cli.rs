//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_missing_video_dir_exits_with_usage() {
    Command::cargo_bin("tvdrop")
        .unwrap()
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_flag_exits_with_usage() {
    Command::cargo_bin("tvdrop")
        .unwrap()
        .args(["/tmp/tv", "--no-such-flag"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_succeeds() {
    Command::cargo_bin("tvdrop")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("VIDEO_DIR"));
}

#[test]
fn test_invalid_bind_address_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("tvdrop")
        .unwrap()
        .arg(dir.path())
        .args(["--bind", "not-an-address"])
        .env("RUST_LOG", "off")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid bind address"));
}

/// Bind 100 consecutive loopback ports, retrying from different bases until
/// a fully free window is found.
fn occupy_port_window() -> (u16, Vec<std::net::TcpListener>) {
    for base in (20000u16..60000).step_by(1000) {
        let listeners: Vec<_> = (base..base + 100)
            .map_while(|port| std::net::TcpListener::bind(("127.0.0.1", port)).ok())
            .collect();
        if listeners.len() == 100 {
            return (base, listeners);
        }
    }
    panic!("no free window of 100 loopback ports");
}

#[test]
fn test_no_free_port_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (start, _listeners) = occupy_port_window();
    Command::cargo_bin("tvdrop")
        .unwrap()
        .arg(dir.path())
        .args(["--bind", "127.0.0.1", "--port", &start.to_string()])
        .env("RUST_LOG", "off")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to find available port"));
}
