#![allow(deprecated)]
//! CLI contract: exit codes, config round-trips, and offline judging.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn judgeline(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("judgeline").unwrap();
    cmd.env_remove("JUDGELINE_CONFIG")
        .env_remove("JUDGELINE_REGISTRATION_TOKEN")
        .env("RUST_LOG", "warn")
        .arg("--config")
        .arg(config);
    cmd
}

#[test]
fn version_prints_package_version() {
    let dir = tempfile::tempdir().unwrap();
    judgeline(&dir.path().join("config.yaml"))
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn info_lists_builtin_adapters() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "serverAddr: http://judge.local\nrunnerId: r-1\n").unwrap();

    judgeline(&config)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://judge.local"))
        .stdout(predicate::str::contains("r-1"))
        .stdout(predicate::str::contains("dummy"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn daemon_without_credentials_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let storage = dir.path().join("storage");
    std::fs::write(
        &config,
        format!("serverAddr: http://127.0.0.1:9\nstoragePath: {}\n", storage.display()),
    )
    .unwrap();

    judgeline(&config)
        .arg("daemon")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("judgeline register"));
}

#[test]
fn daemon_rejects_zero_concurrency_in_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "concurrency: 0\n").unwrap();

    judgeline(&config).arg("daemon").assert().code(2);
}

#[test]
fn local_judge_runs_dummy_adapter() {
    let dir = tempfile::tempdir().unwrap();
    let problem_config = dir.path().join("problem.json");
    std::fs::write(
        &problem_config,
        json!({ "judge": { "adapter": "dummy", "config": { "ping": "hi" } } }).to_string(),
    )
    .unwrap();
    std::fs::write(dir.path().join("p.zip"), "").unwrap();
    std::fs::write(dir.path().join("s.zip"), "").unwrap();

    let output = judgeline(&dir.path().join("config.yaml"))
        .arg("judge")
        .arg("--problem-config")
        .arg(&problem_config)
        .arg("--problem-data")
        .arg(dir.path().join("p.zip"))
        .arg("--solution-data")
        .arg(dir.path().join("s.zip"))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["result"]["score"], 100.0);
    assert_eq!(report["result"]["status"], "AC");
    assert!(report["details"]["summary"].as_str().unwrap().contains("`hi`"));
}

#[test]
fn local_judge_unknown_adapter_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let problem_config = dir.path().join("problem.yaml");
    std::fs::write(&problem_config, "judge:\n  adapter: nope\n").unwrap();

    judgeline(&dir.path().join("config.yaml"))
        .args(["judge", "--problem-data", "p", "--solution-data", "s", "--problem-config"])
        .arg(&problem_config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("judge adapter not found: nope"));
}

#[tokio::test(flavor = "multi_thread")]
async fn register_writes_credentials_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/runner/register"))
        .and(body_partial_json(json!({
            "name": "ci-runner",
            "labels": ["default"],
            "registrationToken": "reg-token"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "runnerId": "r-42", "runnerKey": "k-42" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let uri = server.uri();

    let register = {
        let config = config.clone();
        move || {
            judgeline(&config)
                .args(["register", "--server", &uri, "--token", "reg-token", "--name", "ci-runner"])
                .assert()
                .success();
        }
    };
    tokio::task::spawn_blocking(register.clone()).await.unwrap();
    // Second run sees the stored key and does not call the server again.
    tokio::task::spawn_blocking(register).await.unwrap();

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains("runnerId: r-42"));
    assert!(saved.contains("runnerKey: k-42"));
    assert!(saved.contains(&server.uri()));
}

#[tokio::test(flavor = "multi_thread")]
async fn register_with_bad_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/runner/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid registration token"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    let uri = server.uri();

    let output = tokio::task::spawn_blocking({
        let config = config.clone();
        move || {
            judgeline(&config)
                .args(["register", "--server", &uri, "--token", "bad"])
                .output()
                .unwrap()
        }
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid registration token"));
    assert!(!config.exists());
}
