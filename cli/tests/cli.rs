use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("--server-command"));
}

#[test]
fn test_version() {
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_call_arguments_fail_before_connecting() {
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .args(["call", "echo", "--arguments", "[1, 2]"])
        .env_remove("MCP_CHAT_CONFIG")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a JSON object"));
}

#[test]
fn test_missing_server_command_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("mcp-chat")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("MCP_CHAT_CONFIG")
        .args(["tools", "--server-command", "mcp-chat-no-such-server-binary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mcp-chat-no-such-server-binary"));
}
