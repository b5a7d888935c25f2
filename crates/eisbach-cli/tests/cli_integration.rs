//! CLI Integration Tests
//!
//! These tests run the `eisbach` binary and check its argument handling and
//! failure behavior. None of them need a running backend.
//!
//! ```
//! cargo test --package eisbach-cli --test cli_integration
//! ```

use std::process::{Command, Output};

/// Run eisbach with an isolated config directory and return output
fn run_eisbach(args: &[&str]) -> Output {
    let home = tempfile::tempdir().expect("Failed to create temp home");
    Command::new(env!("CARGO_BIN_EXE_eisbach"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_CACHE_HOME", home.path().join(".cache"))
        .env_remove("EISBACH_API_URL")
        .env_remove("EISBACH_LOCALE")
        .output()
        .expect("Failed to run eisbach binary")
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let output = run_eisbach(&["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Eisbach"), "Help should mention Eisbach");
    for command in ["conditions", "watch", "history", "surfers", "predict", "config"] {
        assert!(stdout.contains(command), "Help should list {command} command");
    }
}

#[test]
fn test_version_command() {
    let output = run_eisbach(&["--version"]);

    assert!(output.status.success(), "Version should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "Version output should contain the package version"
    );
}

#[test]
fn test_subcommand_help() {
    let output = run_eisbach(&["surfers", "add", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--count"));
    assert!(stdout.contains("--water-level"));
    assert!(stdout.contains("--timestamp"));
}

// =============================================================================
// Argument Validation Tests
// =============================================================================

#[test]
fn test_predict_rejects_invalid_hour() {
    let output = run_eisbach(&["predict", "--hour", "24"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("24"), "Error should name the rejected hour");
}

#[test]
fn test_history_rejects_unknown_view() {
    let output = run_eisbach(&["history", "--view", "weekly"]);

    assert!(!output.status.success());
}

#[test]
fn test_surfers_add_requires_count() {
    let output = run_eisbach(&["surfers", "add"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--count"));
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_path() {
    let output = run_eisbach(&["config", "path"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.trim().ends_with("config.toml"));
}

#[test]
fn test_config_show_defaults() {
    let output = run_eisbach(&["config", "show"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("api_url = \"http://localhost:8080\""));
    assert!(stdout.contains("alert_threshold = 140.0"));
}

// =============================================================================
// Backend Failure Tests
// =============================================================================

#[test]
fn test_conditions_unreachable_backend_fails() {
    let output = run_eisbach(&[
        "conditions",
        "--api-url",
        "http://127.0.0.1:9",
        "--no-cache",
        "--quiet",
    ]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty(), "No output on failure");
}

#[test]
fn test_invalid_api_url_fails() {
    let output = run_eisbach(&["surfers", "list", "--api-url", "not a url", "--quiet"]);

    assert!(!output.status.success());
}
