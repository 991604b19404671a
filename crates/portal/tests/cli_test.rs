//! Integration tests for the `portal` CLI binary.
//!
//! Argument parsing, config handling and error exit codes run without a
//! server; data commands run against a wiremock portal.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `portal` binary with env isolation.
///
/// Clears all `PORTAL_*` env vars and points every config and data
/// directory into `home`, so tests never touch the real configuration.
fn portal_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("portal");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("PORTAL_URL")
        .env_remove("PORTAL_BASE_URL")
        .env_remove("PORTAL_CONFIG")
        .env_remove("PORTAL_OUTPUT")
        .env_remove("PORTAL_TIMEOUT")
        .env_remove("PORTAL_ACCESS_CODE");
    cmd
}

/// A command pointed at `server`, with its state in `home/state`.
fn portal_at(home: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = portal_cmd(home);
    cmd.arg("--url")
        .arg(server.uri())
        .arg("--data-dir")
        .arg(home.join("state"));
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn unix_now() -> i64 {
    i64::try_from(SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()).unwrap()
}

/// Write a signed-in session into the state directory.
fn seed_session(home: &Path) {
    let login = json!({
        "userToken": "user-1",
        "authToken": "auth-1",
        "expirationTime": unix_now() + 3600,
    });
    let storage = json!({ "portal-login": login.to_string() });
    let dir = home.join("state");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("storage.json"), storage.to_string()).unwrap();
}

fn stored_keys(home: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(home.join("state").join("storage.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

async fn mount_environment(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "eventName": "Example Event",
            "portalTitle": "Example Title",
            "seniorTitle": "Example Senior",
            "timezone": "Europe/London",
            "year": 2019
        })))
        .mount(server)
        .await;
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(query_param("authToken", "auth-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "userToken": "user-1",
            "authToken": "auth-1",
            "expirationTime": unix_now() + 7200,
            "abilities": []
        })))
        .mount(server)
        .await;
}

fn event_body(version: &str) -> serde_json::Value {
    json!({
        "success": true,
        "version": version,
        "events": [{
            "id": "e1",
            "title": "Info Desk",
            "sessions": [{ "location": "l1", "startTime": 1_560_000_000, "endTime": 1_560_007_200 }]
        }],
        "locations": [{ "id": "l1", "name": "Main Hall", "floor": 0 }],
        "floors": [{ "id": 0, "name": "Ground" }],
        "volunteers": [{
            "userToken": "user-1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "shifts": [{
                "type": "event",
                "event": "e1",
                "startTime": 1_560_000_000,
                "endTime": 1_560_007_200
            }]
        }]
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = portal_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("volunteer portal")
            .and(predicate::str::contains("schedule"))
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("portal"));
}

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path())
        .arg("nonexistent")
        .assert()
        .code(2);
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef portal"));
}

#[test]
fn test_completions_fish() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path())
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete -c portal"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_flag() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("custom.toml");
    portal_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_config_init_then_show() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("portal.toml");

    portal_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "init", "--base-url", "https://portal.test/api"])
        .assert()
        .success();

    portal_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://portal.test/api"));

    // A second init needs --force.
    portal_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "init", "--base-url", "https://other.test"])
        .assert()
        .code(2);
}

#[test]
fn test_config_set_endpoint_rejects_unknown_names() {
    let home = TempDir::new().unwrap();
    let file = home.path().join("portal.toml");

    portal_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "set-endpoint", "event", "https://mock.test/event.json"])
        .assert()
        .success();
    let raw = std::fs::read_to_string(&file).unwrap();
    assert!(raw.contains("https://mock.test/event.json"), "{raw}");

    let output = portal_cmd(home.path())
        .arg("--config")
        .arg(&file)
        .args(["config", "set-endpoint", "schedule", "https://mock.test/s"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("unknown endpoint"));
}

#[test]
fn test_config_show_reads_environment() {
    let home = TempDir::new().unwrap();
    portal_cmd(home.path())
        .env("PORTAL_BASE_URL", "https://env.test/api")
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://env.test/api"));
}

#[test]
fn test_missing_base_url_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    let output = portal_cmd(home.path()).arg("environment").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("portal config init"));
}

#[test]
fn test_error_banner_follows_config_color() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("portal.toml");
    std::fs::write(&config, "[defaults]\ncolor = \"always\"\n").unwrap();

    let output = portal_cmd(home.path())
        .arg("--config")
        .arg(&config)
        .arg("environment")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("\u{1b}["));
}

// ── Clock ───────────────────────────────────────────────────────────

#[test]
fn test_clock_offset_persists() {
    let home = TempDir::new().unwrap();
    let data_dir = home.path().join("state");

    portal_cmd(home.path())
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["clock", "offset", "--", "-2h"])
        .assert()
        .success();

    portal_cmd(home.path())
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["clock", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"offset_seconds\": -7200"));

    portal_cmd(home.path())
        .arg("--data-dir")
        .arg(&data_dir)
        .args(["clock", "reset"])
        .assert()
        .success();
    assert_eq!(stored_keys(home.path()), json!({}));
}

// ── Data commands ───────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_environment_json() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_environment(&server).await;

    portal_at(home.path(), &server)
        .args(["environment", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Example Event").and(predicate::str::contains("2019")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_environment_not_found_is_a_connection_error() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = portal_at(home.path(), &server)
        .arg("environment")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("Unable to load the portal environment"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_environment_wrong_shape_is_a_protocol_error() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/environment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "fruit": "banana" })))
        .mount(&server)
        .await;

    let output = portal_at(home.path(), &server)
        .arg("environment")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(9));
    assert!(combined_output(&output).contains("EnvironmentData.success"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_requires_sign_in() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_environment(&server).await;

    let output = portal_at(home.path(), &server)
        .arg("whoami")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("portal login"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_stores_session() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_environment(&server).await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "userToken": "user-1",
            "authToken": "auth-1",
            "expirationTime": unix_now() + 7200,
            "abilities": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v1")))
        .mount(&server)
        .await;

    portal_at(home.path(), &server)
        .args(["login", "--email", "ada@example.com", "--access-code", "8765"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Signed in as ada@example.com"));

    let keys = stored_keys(home.path());
    assert!(keys["portal-login"].as_str().unwrap().contains("auth-1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_schedule_lists_shifts() {
    let home = TempDir::new().unwrap();
    seed_session(home.path());
    let server = MockServer::start().await;
    mount_environment(&server).await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("authToken", "auth-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v1")))
        .mount(&server)
        .await;

    portal_at(home.path(), &server)
        .args(["schedule", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Info Desk")
                .and(predicate::str::contains("Main Hall"))
                .and(predicate::str::contains("\"status\": \"done\"")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_session_is_forgotten() {
    let home = TempDir::new().unwrap();
    seed_session(home.path());
    let server = MockServer::start().await;
    mount_environment(&server).await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let output = portal_at(home.path(), &server)
        .arg("schedule")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stored_keys(home.path()), json!({}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_once_reports_update() {
    let home = TempDir::new().unwrap();
    seed_session(home.path());
    let server = MockServer::start().await;
    mount_environment(&server).await;
    mount_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v1")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("v2")))
        .mount(&server)
        .await;

    portal_at(home.path(), &server)
        .args(["watch", "--once"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Schedule updated: v1 -> v2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_clears_session() {
    let home = TempDir::new().unwrap();
    seed_session(home.path());
    let server = MockServer::start().await;

    portal_at(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stderr(predicate::str::contains("Signed out"));
    assert_eq!(stored_keys(home.path()), json!({}));
}
