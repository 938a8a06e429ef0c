//! CLI integration tests for the flowbridge binary.
//!
//! Uses `assert_cmd` to spawn the binary against fixtures laid out in a
//! temp directory, verifying exit codes and output content.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ENV_TEST: &str = r#"
connect:
  instance_id: abc-123
  instance_arn: arn:aws:connect:us-east-1:123456789012:instance/abc-123
  region: us-east-1
tokens:
  Queue:
    Sales: arn:aws:connect:us-east-1:123456789012:instance/abc-123/queue/q-1
  Lambda:
    Router: arn:aws:lambda:us-east-1:123456789012:function:router
"#;

const TEMPLATE: &str = r#"{
  "name": "inbound-sales",
  "type": "CONTACT_FLOW",
  "content": {
    "StartAction": "start",
    "Actions": [
      {"Identifier": "start", "Type": "MessageParticipant",
       "Transitions": {"NextAction": "q"}},
      {"Identifier": "q", "Type": "TransferContactToQueue",
       "Parameters": {"QueueId": "${Queue.Sales}"},
       "Transitions": {"NextAction": "l"}},
      {"Identifier": "l", "Type": "InvokeLambdaFunction",
       "Parameters": {"LambdaFunctionARN": "${Lambda.Router}"},
       "Transitions": {"NextAction": "end"}},
      {"Identifier": "end", "Type": "DisconnectParticipant",
       "Transitions": {}}
    ]
  }
}"#;

fn flowbridge() -> Command {
    Command::cargo_bin("flowbridge").unwrap()
}

fn workspace(dir: &Path) {
    fs::create_dir_all(dir.join("flows")).unwrap();
    fs::create_dir_all(dir.join("environments")).unwrap();
    fs::write(dir.join("flows/sales.json"), TEMPLATE).unwrap();
    fs::write(dir.join("environments/test.yaml"), ENV_TEST).unwrap();
}

#[test]
fn help_exits_0_with_description() {
    flowbridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Contact-flow promotion toolchain"));
}

#[test]
fn normalize_rewrites_a_noisy_export_in_place() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("export.json");
    fs::write(
        &file,
        r#"{"name":"f","Version":"3","content":{"Metadata":{"position":{"x":123,"y":456}}}}"#,
    )
    .unwrap();

    flowbridge()
        .args(["normalize", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("normalized"));

    let out = fs::read_to_string(&file).unwrap();
    assert!(!out.contains("Version"));
    assert!(out.contains("120"));
    assert!(out.contains("460"));
}

#[test]
fn normalize_directory_processes_every_json_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.json"), r#"{"Version":"1","keep":true}"#).unwrap();
    fs::write(dir.path().join("b.json"), r#"{"Status":"SAVED","keep":true}"#).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    flowbridge()
        .args(["normalize", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.json").and(predicate::str::contains("b.json")));
}

#[test]
fn render_writes_one_artifact_per_template() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());
    let out = dir.path().join("rendered");

    flowbridge()
        .current_dir(dir.path())
        .args(["render", "--env", "test", "--output", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("sales.json"));

    let rendered = fs::read_to_string(out.join("sales.json")).unwrap();
    assert!(rendered.contains("instance/abc-123/queue/q-1"));
    assert!(!rendered.contains("${"));
}

#[test]
fn render_fails_nonzero_on_missing_token() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());
    fs::write(
        dir.path().join("flows/broken.json"),
        r#"{"name":"b","type":"CONTACT_FLOW","content":{"v":"${NonExistent.Token}"}}"#,
    )
    .unwrap();

    flowbridge()
        .current_dir(dir.path())
        .args(["render", "--env", "test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NonExistent.Token"));
}

#[test]
fn render_unknown_environment_fails() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());

    flowbridge()
        .current_dir(dir.path())
        .args(["render", "--env", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn validate_passes_a_consistent_workspace() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());

    flowbridge()
        .current_dir(dir.path())
        .args(["validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn validate_fails_on_missing_token_naming_the_environment() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());
    fs::write(
        dir.path().join("flows/new.json"),
        r#"{"name":"n","type":"CONTACT_FLOW","content":{"v":"${Queue.NewQueue}"}}"#,
    )
    .unwrap();

    flowbridge()
        .current_dir(dir.path())
        .args(["validate"])
        .assert()
        .failure()
        .stdout(
            predicate::str::contains("Queue.NewQueue").and(predicate::str::contains("'test'")),
        );
}

#[test]
fn validate_warnings_do_not_change_exit_code() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());
    // Unrecognized category: warning only.
    fs::write(
        dir.path().join("environments/test.yaml"),
        format!("{}  Custom:\n    Thing: some-value\n", ENV_TEST),
    )
    .unwrap();
    fs::write(
        dir.path().join("flows/custom.json"),
        r#"{"name":"c","type":"CONTACT_FLOW","content":{"v":"${Custom.Thing}"}}"#,
    )
    .unwrap();

    flowbridge()
        .current_dir(dir.path())
        .args(["validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("warning"));
}

#[test]
fn validate_json_output_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());

    let output = flowbridge()
        .current_dir(dir.path())
        .args(["validate", "--output", "json"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["passed"], serde_json::json!(true));
}

#[test]
fn instance_mismatch_blocks_validation() {
    let dir = TempDir::new().unwrap();
    workspace(dir.path());
    let bad_env = ENV_TEST.replace(
        "instance/abc-123/queue/q-1",
        "instance/other-999/queue/q-1",
    );
    fs::write(dir.path().join("environments/test.yaml"), bad_env).unwrap();

    flowbridge()
        .current_dir(dir.path())
        .args(["validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("other-999"));
}
