use std::fs;

use crate::common::{run_rewind, sandbox, stdout_of, write_case};

#[tokio::test]
async fn unknown_subcommand_prints_usage_hint_and_fails() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["frobnicate"], &[]).await;

    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("Error: unknown command \"frobnicate\""),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("Run 'rewind --help' for usage."),
        "stdout: {stdout}"
    );
}

#[tokio::test]
async fn unknown_flag_prints_usage_hint_and_fails() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["--definitely-not-a-flag"], &[]).await;

    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("Run 'rewind --help' for usage."),
        "stdout: {stdout}"
    );
}

#[tokio::test]
async fn version_flag_reports_the_build_version() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["--version"], &[]).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("rewind"), "stdout: {stdout}");
    assert!(stdout.contains("dev"), "stdout: {stdout}");
}

#[tokio::test]
async fn bare_invocation_prints_help_and_succeeds() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &[], &[]).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Usage:"), "stdout: {stdout}");
}

#[tokio::test]
async fn login_prints_the_device_authorization_url() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["login"], &[]).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("/auth/github/device?client_id="),
        "stdout: {stdout}"
    );
}

#[tokio::test]
async fn installation_identity_persists_across_runs() {
    let sandbox = sandbox();

    let first = run_rewind(&sandbox, &["login"], &[]).await;
    assert_eq!(first.status.code(), Some(0));
    let store_path = sandbox.home.path().join("installation.toml");
    let stored = fs::read_to_string(&store_path).expect("identity store exists");

    let second = run_rewind(&sandbox, &["login"], &[]).await;
    assert_eq!(second.status.code(), Some(0));
    let stored_again = fs::read_to_string(&store_path).expect("identity store still exists");

    assert_eq!(stored, stored_again);
    assert!(stdout_of(&second).contains("installation_id="));
}

#[tokio::test]
async fn passing_suite_reports_full_success() {
    let sandbox = sandbox();
    let suite = sandbox.work.path().join("suite");
    fs::create_dir(&suite).expect("can create suite directory");
    write_case(&suite, "01-create.toml", "create user", "/api/users", true);
    write_case(&suite, "02-list.toml", "list users", "/api/users", true);

    let output = run_rewind(&sandbox, &["test", "--path", "suite"], &[]).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Running tests..."), "stdout: {stdout}");
    assert!(stdout.contains("TEST EXECUTION SUMMARY"), "stdout: {stdout}");
    assert!(
        stdout.contains("Success Rate         : 100.00%"),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("Unique Endpoints     : 1"),
        "stdout: {stdout}"
    );
}

#[tokio::test]
async fn failing_suite_exits_nonzero_with_summary() {
    let sandbox = sandbox();
    let suite = sandbox.work.path().join("suite");
    fs::create_dir(&suite).expect("can create suite directory");
    write_case(&suite, "01-create.toml", "create user", "/api/users", true);
    write_case(&suite, "02-delete.toml", "delete user", "/api/users/1", false);

    let output = run_rewind(&sandbox, &["test", "--path", "suite"], &[]).await;

    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("Failed Tests         : 1"),
        "stdout: {stdout}"
    );
    assert!(
        stdout.contains("Success Rate         : 50.00%"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("| Status: FAILED"), "stdout: {stdout}");
}

#[tokio::test]
async fn test_without_a_path_fails_with_guidance() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["test"], &[]).await;

    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn baseline_cleanup_removes_the_log_file() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["login"], &[]).await;

    assert_eq!(output.status.code(), Some(0));
    assert!(
        !sandbox.work.path().join("rewind-logs.txt").exists(),
        "log file should be deleted on normal teardown"
    );
}

#[tokio::test]
async fn container_marker_leaves_transient_files_to_the_supervisor() {
    let sandbox = sandbox();

    let output = run_rewind(&sandbox, &["login"], &[("REWIND_IN_DOCKER", "true")]).await;

    assert_eq!(output.status.code(), Some(0));
    assert!(
        sandbox.work.path().join("rewind-logs.txt").exists(),
        "log file must remain when the supervisor owns cleanup"
    );
}
