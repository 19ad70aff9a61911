//! CLI tests against the built binary.
//!
//! Each test writes its own config file and clears the `SITEBRIDGE_*`
//! environment, so nothing from the developer's machine leaks in.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OVERRIDE_VARS: [&str; 8] = [
    "SITEBRIDGE_CONFIG",
    "SITEBRIDGE_EXPORT_IDENTIFIER",
    "SITEBRIDGE_EXPORT_SECRET",
    "SITEBRIDGE_EXPORT_BASE_URL",
    "SITEBRIDGE_TRACKING_IDENTIFIER",
    "SITEBRIDGE_TRACKING_SECRET",
    "SITEBRIDGE_TRACKING_BASE_URL",
    "SITEBRIDGE_TIMEOUT_SECS",
];

/// Run the CLI binary with a config file and a clean environment.
fn run_cli(config: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sitebridge"));
    cmd.arg("--config").arg(config).args(args);
    for var in OVERRIDE_VARS {
        cmd.env_remove(var);
    }
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect failure, returning stderr.
fn run_cli_failure(config: &Path, args: &[&str]) -> String {
    let output = run_cli(config, args);
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Run the CLI and expect success, returning stdout.
fn run_cli_success(config: &Path, args: &[&str]) -> String {
    let output = run_cli(config, args);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn write_config(dir: &Path, value: Value) -> std::path::PathBuf {
    let path = dir.join("config.json");
    std::fs::write(&path, value.to_string()).unwrap();
    path
}

const TRACKING_LOGIN_PAGE: &str = r#"<html><h1>Connexion</h1><form>
<input type="hidden" name="YII_CSRF_TOKEN" value="t"/></form></html>"#;

async fn mount_tracking(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/fr/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRACKING_LOGIN_PAGE))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/fr/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "PHPSESSID=s1; Path=/")
                .set_body_string("<html>Mon compte</html>"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/fr/superMarket/GetUserOrderDetails"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"success":true,"orderId":555}"#),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/fr/orders/getTrackOrderData"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"delivered"}"#))
        .mount(server)
        .await;
}

fn tracking_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    write_config(
        dir,
        json!({
            "tracking": {
                "email": "bob@example.com",
                "password": "hunter2",
                "base_url": server.uri(),
            },
            "timeout_secs": 5
        }),
    )
}

#[test]
fn test_missing_credentials_fail_before_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), json!({}));

    for args in [&["export"][..], &["token"][..], &["status"][..]] {
        let stderr = run_cli_failure(&config, args);
        assert!(
            stderr.contains("missing credentials for target"),
            "stderr for {:?}: {}",
            args,
            stderr
        );
    }
}

#[test]
fn test_malformed_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{ nope").unwrap();

    let stderr = run_cli_failure(&config, &["status"]);
    assert!(stderr.contains("Failed to load config"));
}

#[test]
fn test_unknown_export_kind_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), json!({}));

    let output = run_cli(&config, &["export", "--kind", "meals"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("meals"));
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), json!({}));

    let stdout = run_cli_success(&config, &["--help"]);
    for command in ["login", "token", "export", "status", "watch"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_prints_order_json() {
    let server = MockServer::start().await;
    mount_tracking(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = tracking_config(dir.path(), &server);

    let stdout = run_cli_success(&config, &["status"]);
    let status: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(status["order_id"], "555");
    assert_eq!(status["details"]["status"], "delivered");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_never_prints_cookie_values() {
    let server = MockServer::start().await;
    mount_tracking(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = tracking_config(dir.path(), &server);

    let output = run_cli(&config, &["login", "--target", "tracking"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["target"], "tracking");
    assert_eq!(report["cookies"], json!(["PHPSESSID"]));
    assert!(!stdout.contains("s1\""));
    assert!(!stdout.contains("hunter2"));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("hunter2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_stops_after_count() {
    let server = MockServer::start().await;
    mount_tracking(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = tracking_config(dir.path(), &server);

    let stdout = run_cli_success(&config, &["watch", "--interval", "1", "--count", "2"]);
    let polls: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(polls.len(), 2);
    assert_eq!(polls[1]["status"]["order_id"], "555");
}

#[test]
fn test_version_carries_package_version() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), json!({}));

    let stdout = run_cli_success(&config, &["--version"]);
    let version = stdout.trim().strip_prefix("sitebridge ").unwrap();
    assert!(
        version == env!("CARGO_PKG_VERSION")
            || version.starts_with(concat!(env!("CARGO_PKG_VERSION"), "+")),
        "unexpected version: {version}"
    );
}
