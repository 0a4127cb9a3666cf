//! Binary-level tests for the hipchat-notify CLI

mod common;

use common::{MockServer, Response, TestCommand, TestEnvironment};

const FAILED_RUN: &str = r##"{
    "result": "FAILURE",
    "job_display_name": "demo",
    "display_name": "#7",
    "url": "job/demo/7/",
    "duration_ms": 65000,
    "previous": { "result": "SUCCESS", "job_display_name": "demo", "display_name": "#6" }
}"##;

const PASSING_RUN: &str = r##"{
    "result": "SUCCESS",
    "job_display_name": "demo",
    "display_name": "#8",
    "previous": { "result": "SUCCESS" }
}"##;

fn config_for(server: &MockServer) -> String {
    format!(
        r#"
[hipchat]
server = "{}"
room = "ops"
build_server_url = "https://ci.example.com"

[proxy]
mode = "none"
"#,
        server.base_url()
    )
}

#[test]
fn test_help_lists_commands() {
    TestCommand::new()
        .arg("--help")
        .expect_success()
        .stdout_contains("send")
        .stdout_contains("event")
        .stdout_contains("config")
        .done();
}

#[test]
fn test_config_show_masks_secrets() {
    let env = TestEnvironment::with_config(
        r#"
[hipchat]
room = "ops"
auth_token = "supersecret"

[credentials]
hipchat-ci = "alsosecret"
"#,
    );

    env.command()
        .args(["config", "show"])
        .expect_success()
        .stdout_contains("********")
        .stdout_contains("room = \"ops\"")
        .stdout_lacks("supersecret")
        .stdout_lacks("alsosecret")
        .done();
}

#[test]
fn test_config_path_reports_project_file() {
    let env = TestEnvironment::with_config("[hipchat]\nroom = \"ops\"\n");

    env.command()
        .args(["config", "path"])
        .expect_success()
        .stdout_contains(".hipchat")
        .done();
}

#[test]
fn test_config_path_without_file() {
    let env = TestEnvironment::new();

    env.command()
        .args(["config", "path"])
        .expect_success()
        .stdout_contains("built-in defaults")
        .done();
}

#[test]
fn test_invalid_config_is_rejected() {
    let env = TestEnvironment::with_config("[hipchat]\nserver = \"\"\n");

    env.command()
        .args(["config", "show"])
        .expect_failure()
        .stderr_contains("hipchat.server must not be empty")
        .done();
}

#[test]
fn test_event_dry_run_prints_payload() {
    let env = TestEnvironment::with_config("[hipchat]\nroom = \"ops\"\nbuild_server_url = \"https://ci.example.com\"\n");
    let run = env.write_file("run.json", FAILED_RUN);

    env.command()
        .args(["event", "completed", "--dry-run", "--run"])
        .arg(run.to_string_lossy())
        .expect_success()
        .stdout_contains("Category: FAILURE")
        .stdout_contains("\"color\": \"red\"")
        .stdout_contains("after 1 min 5 sec")
        .stdout_contains("https://ci.example.com/job/demo/7/")
        .done();
}

#[test]
fn test_event_dry_run_disabled_category() {
    let env = TestEnvironment::with_config("[hipchat]\nroom = \"ops\"\n");
    let run = env.write_file("run.json", PASSING_RUN);

    env.command()
        .args(["event", "completed", "--dry-run", "--run"])
        .arg(run.to_string_lossy())
        .expect_success()
        .stdout_contains("Notifications for SUCCESS are disabled")
        .done();
}

#[test]
fn test_event_rejects_missing_run_file() {
    let env = TestEnvironment::with_config("[hipchat]\nroom = \"ops\"\n");

    env.command()
        .args(["event", "started", "--run", "does-not-exist.json"])
        .expect_failure()
        .stderr_contains("Failed to read run file")
        .done();
}

#[test]
fn test_event_completed_publishes() {
    let server = MockServer::start(|_| Response::v2_sent());
    let config = format!("{}\n[credentials]\nci = \"stored\"\n", config_for(&server))
        .replace("room = \"ops\"", "room = \"ops\"\ncredential_id = \"ci\"");
    let env = TestEnvironment::with_config(&config);
    let run = env.write_file("run.json", FAILED_RUN);

    env.command()
        .args(["event", "completed", "--run"])
        .arg(run.to_string_lossy())
        .expect_success()
        .done();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("authorization"), Some("Bearer stored"));
    let body = requests[0].json();
    assert_eq!(body["color"], "red");
    assert_eq!(body["notify"], true);
}

#[test]
fn test_event_without_token_skips_delivery() {
    let server = MockServer::start(|_| Response::v2_sent());
    let env = TestEnvironment::with_config(&config_for(&server));
    let run = env.write_file("run.json", FAILED_RUN);

    env.command()
        .args(["event", "completed", "--run"])
        .arg(run.to_string_lossy())
        .expect_success()
        .done();

    assert!(server.requests().is_empty());
}

#[test]
fn test_send_uses_token_from_environment() {
    let server = MockServer::start(|_| Response::v2_sent());
    let env = TestEnvironment::with_config(&config_for(&server));

    env.command()
        .env("HIPCHAT_TOKEN", "env-token")
        .args(["send", "Release cut", "--color", "purple", "--no-notify"])
        .expect_success()
        .stdout_contains("Message sent to ops")
        .done();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("authorization"), Some("Bearer env-token"));
    let body = requests[0].json();
    assert_eq!(body["message"], "Release cut");
    assert_eq!(body["color"], "purple");
    assert_eq!(body["notify"], false);
}

#[test]
fn test_send_v1_to_room_override() {
    let server = MockServer::start(|_| Response::v1_sent());
    let env = TestEnvironment::with_config(&config_for(&server));

    env.command()
        .args(["send", "hi", "--v1", "--room", "42", "--token", "cli-token", "--color", "green"])
        .expect_success()
        .stdout_contains("Message sent to 42")
        .done();

    let requests = server.requests();
    assert_eq!(requests[0].path(), "/v1/rooms/message");
    assert_eq!(requests[0].query(), Some("auth_token=cli-token"));
    assert_eq!(
        requests[0].body_str(),
        "from=Build+Server&room_id=42&message=hi&color=green&notify=0"
    );
}

#[test]
fn test_send_blank_message() {
    let env = TestEnvironment::with_config("[hipchat]\nroom = \"ops\"\n");

    env.command()
        .args(["send", "  "])
        .expect_success()
        .stdout_contains("Nothing sent")
        .done();

    env.command()
        .args(["send", "  ", "--fail-on-error"])
        .expect_failure()
        .stderr_contains("message")
        .done();
}

#[test]
fn test_send_failure_is_reported_only_on_request() {
    let server = MockServer::start(|_| Response::new(401).body("Unauthorized"));
    let env = TestEnvironment::with_config(&config_for(&server));

    env.command()
        .args(["send", "hi", "--token", "bad"])
        .expect_success()
        .stdout_contains("Nothing sent")
        .done();

    env.command()
        .args(["send", "hi", "--token", "bad", "--fail-on-error"])
        .expect_failure()
        .stderr_contains("Failed to send HipChat message")
        .done();
}
