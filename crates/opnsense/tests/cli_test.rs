//! Integration tests for the `opnsense` CLI binary.
//!
//! Argument parsing, config handling, and exit codes are checked without a
//! firewall; the remaining tests run the binary against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `opnsense` binary with env isolation.
///
/// Clears all `OPNSENSE_*` env vars and points the config file into a
/// scratch directory so tests never touch the user's real configuration.
fn opnsense_cmd(config_dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("opnsense");
    cmd.env("OPNSENSE_CONFIG", config_dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("OPNSENSE_PROFILE")
        .env_remove("OPNSENSE_ENDPOINT")
        .env_remove("OPNSENSE_API_KEY")
        .env_remove("OPNSENSE_API_SECRET")
        .env_remove("OPNSENSE_OUTPUT")
        .env_remove("OPNSENSE_INSECURE")
        .env_remove("OPNSENSE_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Command wired to a mock firewall through flags.
fn against(server: &MockServer, dir: &Path) -> assert_cmd::Command {
    let mut cmd = opnsense_cmd(dir);
    cmd.args([
        "--endpoint",
        &server.uri(),
        "--api-key",
        "key",
        "--api-secret",
        "secret",
    ]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = TempDir::new().unwrap();
    let output = opnsense_cmd(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_resource_commands() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("aliases")
            .and(predicate::str::contains("rules"))
            .and(predicate::str::contains("one-to-one"))
            .and(predicate::str::contains("npt"))
            .and(predicate::str::contains("templates")),
    );
}

#[test]
fn test_version_flag() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opnsense"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
    opnsense_cmd(dir.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let dir = TempDir::new().unwrap();
    let output = opnsense_cmd(dir.path()).arg("foobar").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("foobar"));
}

// ── Connection setup errors ─────────────────────────────────────────

#[test]
fn test_list_without_config_points_at_init() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["aliases", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config init"));
}

#[test]
fn test_missing_credentials_is_an_auth_error() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["--endpoint", "https://fw.lan", "aliases", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("API key"));
}

#[test]
fn test_non_http_endpoint_is_rejected() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["-e", "ftp://fw.lan", "--api-key", "k", "--api-secret", "s"])
        .args(["rules", "list"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_profile_fails() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["--profile", "nope", "groups", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_set_then_show_masks_secrets() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["config", "set", "endpoint", "https://fw.lan"])
        .assert()
        .success();
    opnsense_cmd(dir.path())
        .args(["config", "set", "api_key", "hunter2"])
        .assert()
        .success();

    assert!(dir.path().join("config.toml").exists());

    opnsense_cmd(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#"endpoint = "https://fw.lan""#)
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );

    opnsense_cmd(dir.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_unknown_key_is_usage_error() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["config", "set", "site", "default"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_use_missing_profile() {
    let dir = TempDir::new().unwrap();
    opnsense_cmd(dir.path())
        .args(["config", "use", "lab"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lab"));
}

#[test]
fn test_profile_from_config_file_is_used() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "default_profile = \"lab\"\n\n[profiles.lab]\nendpoint = \"https://lab.fw\"\n",
    )
    .unwrap();

    // The profile has no credentials, so resolution stops at the key.
    opnsense_cmd(dir.path())
        .args(["categories", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("lab"));
}

// ── Against a mock firewall ─────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_aliases_list_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/firewall/alias/searchItem"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rows": [{"uuid": "a-1", "name": "web", "type": "Host(s)", "enabled": "1"}],
            "total": 1
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = against(&server, dir.path())
        .args(["-o", "json", "aliases", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["uuid"], "a-1");
    assert_eq!(rows[0]["name"], "web");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_missing_alias_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/firewall/alias/getItem/gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    against(&server, dir.path())
        .args(["aliases", "get", "gone"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("aliases list"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_create_exits_with_validation_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/firewall/category/addItem"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "failed",
            "validations": {"category.name": "A category with this name already exists."}
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let payload = dir.path().join("category.json");
    std::fs::write(&payload, r#"{"name": "web"}"#).unwrap();

    against(&server, dir.path())
        .args(["categories", "create", "--from-file"])
        .arg(&payload)
        .assert()
        .code(6)
        .stderr(predicate::str::contains("category.name"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delete_requires_yes_without_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/firewall/filter/delRule/r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "deleted"})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    against(&server, dir.path())
        .args(["rules", "delete", "r-1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_apply_failure_warns_but_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/firewall/alias/addItem"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"result": "saved", "uuid": "a-7"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/firewall/alias/reconfigure"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "failed"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/firewall/alias/getItem/a-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alias": {
                "enabled": "1",
                "name": "dns",
                "type": {"host": {"value": "Host(s)", "selected": 1}},
                "content": {
                    "1.1.1.1": {"value": "1.1.1.1", "selected": 1},
                    "9.9.9.9": {"value": "9.9.9.9", "selected": 1}
                },
                "description": ""
            }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    against(&server, dir.path())
        .args(["-o", "plain", "aliases", "create", "--name", "dns"])
        .args(["--content", "9.9.9.9,1.1.1.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a-7"))
        .stderr(predicate::str::contains("warning").and(predicate::str::contains("failed")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_forbidden_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/firewall/npt/searchRule"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    against(&server, dir.path())
        .args(["npt", "list"])
        .assert()
        .code(3);
}
