use assert_cmd::Command;
use predicates::str::{contains, starts_with};

fn docchat(state_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("docchat"));
    cmd.env("DOCCHAT_DIR", state_dir.path())
        .env_remove("DOCCHAT_SERVER")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("docchat"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("DocChat"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("docchat"));
    cmd.arg("--version").assert().success();
}

#[test]
fn test_cli_completions() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(starts_with("_docchat"));
}

#[test]
fn test_session_show_without_session() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state)
        .args(["--format", "json", "session", "show"])
        .assert()
        .success()
        .stdout(contains("\"session_id\": null"));
}

#[test]
fn test_session_clear_is_idempotent() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state)
        .args(["session", "clear"])
        .assert()
        .success()
        .stdout(contains("No active session"));
}

#[test]
fn test_docs_url_is_percent_encoded() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state)
        .args([
            "--server",
            "http://rag.example.com:8000/",
            "docs",
            "url",
            "annual report.pdf",
        ])
        .assert()
        .success()
        .stdout(contains(
            "http://rag.example.com:8000/documents/view/annual%20report.pdf",
        ));
}

#[test]
fn test_invalid_server_url_is_reported() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state)
        .args(["--server", "localhost:8000", "docs", "url", "a.pdf"])
        .assert()
        .failure()
        .stderr(contains("Invalid server URL"));
}

#[test]
fn test_upload_missing_file_fails() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state)
        .args([
            "--server",
            "http://127.0.0.1:9",
            "docs",
            "upload",
            "/definitely/not/here.pdf",
        ])
        .assert()
        .failure()
        .stderr(contains("File not found"));
}

#[test]
fn test_ask_requires_question() {
    let state = tempfile::tempdir().unwrap();
    docchat(&state).arg("ask").assert().failure();
}

#[test]
fn test_json_chat_writes_only_json_lines() {
    let state = tempfile::tempdir().unwrap();
    let output = docchat(&state)
        .args(["--server", "http://127.0.0.1:9", "--format", "json", "chat"])
        .write_stdin("/new\n/session\n/upload\n/bogus\n/help\n/exit\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let commands: Vec<String> = stdout
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line)
                .unwrap_or_else(|_| panic!("not a JSON line: {line}"));
            value["command"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(commands, ["new_chat", "session", "notice", "notice", "help"]);
}
