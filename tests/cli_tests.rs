//! Exit status and output of the `bintray_upload` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "super-secret-api-key";

fn plugin() -> Command {
    let mut cmd = Command::cargo_bin("bintray_upload").unwrap();
    cmd.env_remove("PLUGIN_CONFIG")
        .env_remove("DRONE_WORKSPACE")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_missing_fields_are_all_reported() {
    let document = json!({
        "workspace": { "path": "/tmp" },
        "vargs": {
            "username": "ci-bot",
            "api_key": API_KEY,
            "artifacts": [{ "file": "dist/app.zip", "package": "app", "target": "app.zip" }],
        },
    });

    plugin()
        .write_stdin(document.to_string())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Cannot process package app - Missing argument(s):"))
        .stdout(predicate::str::contains("owner not defined in yaml config"))
        .stdout(predicate::str::contains("repository not defined in yaml config"))
        .stdout(predicate::str::contains("version not defined in yaml config"))
        .stdout(predicate::str::contains(API_KEY).not());
}

#[test]
fn test_malformed_document_fails() {
    plugin()
        .write_stdin("{ this is not json")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Can't parse plugin config"));
}

#[test]
fn test_missing_config_file_fails() {
    plugin()
        .args(["--config", "/nonexistent/bintray.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Can't read plugin config"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_run_with_debug_output_is_redacted() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "message": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    std::fs::write(workspace.path().join("app.zip"), b"zip").unwrap();
    let config = workspace.path().join("bintray.json");
    let document = json!({
        "username": "ci-bot",
        "api_key": API_KEY,
        "host": server.uri(),
        "artifacts": [{
            "file": "app.zip", "owner": "acme", "repository": "generic",
            "package": "app", "version": "1.0", "target": "app.zip",
        }],
    });
    std::fs::write(&config, document.to_string()).unwrap();

    plugin()
        .arg("--config")
        .arg(&config)
        .arg("--workspace")
        .arg(workspace.path())
        .arg("--debug")
        .assert()
        .success()
        .stdout(predicate::str::contains("Publishing 1 artifacts to Bintray for user ci-bot"))
        .stdout(predicate::str::contains("Uploading file 1 app.zip to"))
        .stdout(predicate::str::contains("Authorization: Basic xxxxxxxxxx"))
        .stdout(predicate::str::contains("Result: success"))
        .stdout(predicate::str::contains(API_KEY).not());

    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_upload_dumps_redacted_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "message": "This resource requires authentication" })),
        )
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    std::fs::write(workspace.path().join("app.zip"), b"zip").unwrap();
    let document = json!({
        "workspace": { "path": workspace.path() },
        "vargs": {
            "username": "ci-bot",
            "api_key": API_KEY,
            "host": server.uri(),
            "branch": "feature-x",
            "artifacts": [{
                "file": "app.zip", "owner": "acme", "repository": "generic",
                "package": "app", "version": "1.0", "target": "app.zip",
            }],
        },
    });

    let assert = plugin()
        .write_stdin(document.to_string())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("on branch feature-x"))
        .stdout(predicate::str::contains(
            "Error 401 Unauthorized - This resource requires authentication",
        ))
        .stdout(predicate::str::contains("Failing request:"))
        .stdout(predicate::str::contains(
            "PUT /content/acme/generic/app/1.0/test/feature-x/app.zip HTTP/1.1",
        ))
        .stdout(predicate::str::contains("Authorization: Basic xxxxxxxxxx"))
        .stdout(predicate::str::contains(API_KEY).not());

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let reason = stdout.find("Error 401 Unauthorized").unwrap();
    let dump = stdout.find("Failing request:").unwrap();
    assert!(reason < dump, "reason must come before the request dump:\n{}", stdout);
    assert_eq!(stdout.matches("Error 401 Unauthorized").count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unexpected_message_prints_result_and_request() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "queued for review" })))
        .mount(&server)
        .await;

    let workspace = tempfile::tempdir().unwrap();
    std::fs::write(workspace.path().join("app.zip"), b"zip").unwrap();
    let document = json!({
        "workspace": { "path": workspace.path() },
        "vargs": {
            "username": "ci-bot",
            "api_key": API_KEY,
            "host": server.uri(),
            "artifacts": [{
                "file": "app.zip", "owner": "acme", "repository": "generic",
                "package": "app", "version": "1.0", "target": "app.zip",
            }],
        },
    });

    plugin()
        .write_stdin(document.to_string())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Result: queued for review"))
        .stdout(predicate::str::contains("Request was:"))
        .stdout(predicate::str::contains("Authorization: Basic xxxxxxxxxx"))
        .stdout(predicate::str::contains(API_KEY).not());
}

#[test]
fn test_directory_artifact_is_reported_as_io_error() {
    let workspace = tempfile::tempdir().unwrap();
    std::fs::create_dir(workspace.path().join("dist")).unwrap();
    let document = json!({
        "workspace": { "path": workspace.path() },
        "vargs": {
            "username": "ci-bot",
            "api_key": API_KEY,
            "host": "http://127.0.0.1:9",
            "artifacts": [{
                "file": "dist", "owner": "acme", "repository": "generic",
                "package": "app", "version": "1.0", "target": "app.zip",
            }],
        },
    });

    plugin()
        .write_stdin(document.to_string())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Unable to open input file"))
        .stdout(predicate::str::contains("not a regular file"))
        .stdout(predicate::str::contains("Failing request").not());
}
