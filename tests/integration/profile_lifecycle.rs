use std::fs;

use tokio::process::Command;

use crate::common::{run_rewind, sandbox, stderr_of, stdout_of, BINARY_PATH};

#[tokio::test]
async fn heap_profile_is_written_on_normal_exit() {
    let sandbox = sandbox();
    let profile = sandbox.work.path().join("heap.json");

    let output = run_rewind(
        &sandbox,
        &["login"],
        &[("HEAP_PROFILE", profile.to_str().expect("utf-8 path"))],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    let raw = fs::read_to_string(&profile).expect("heap profile exists");
    let report: serde_json::Value = serde_json::from_str(&raw).expect("heap profile is JSON");
    assert_eq!(report["kind"], "heap");
}

#[tokio::test]
async fn cpu_profile_is_written_on_normal_exit() {
    let sandbox = sandbox();
    let profile = sandbox.work.path().join("cpu.json");

    let output = run_rewind(
        &sandbox,
        &["login"],
        &[("CPU_PROFILE", profile.to_str().expect("utf-8 path"))],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    let raw = fs::read_to_string(&profile).expect("cpu profile exists");
    let report: serde_json::Value = serde_json::from_str(&raw).expect("cpu profile is JSON");
    assert_eq!(report["kind"], "cpu");
}

#[tokio::test]
async fn failed_profile_start_does_not_abort_the_run() {
    let sandbox = sandbox();
    let profile = sandbox.work.path().join("missing-dir").join("cpu.json");

    let output = run_rewind(
        &sandbox,
        &["login"],
        &[("CPU_PROFILE", profile.to_str().expect("utf-8 path"))],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    assert!(!profile.exists(), "no half-open profile may remain");
}

#[tokio::test]
async fn identity_failure_still_drains_registered_cleanup() {
    let sandbox = sandbox();
    let profile = sandbox.work.path().join("heap.json");

    // No REWIND_HOME and no HOME: identity resolution must fail after the
    // heap-profile action was registered.
    let output = Command::new(BINARY_PATH)
        .arg("login")
        .current_dir(sandbox.work.path())
        .env_remove("REWIND_IN_DOCKER")
        .env_remove("REWIND_CONFIG")
        .env_remove("CPU_PROFILE")
        .env_remove("REWIND_HOME")
        .env_remove("HOME")
        .env("HEAP_PROFILE", profile.to_str().expect("utf-8 path"))
        .output()
        .await
        .expect("rewind binary should run");

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr_of(&output).contains("failed to get installation id"),
        "stderr: {}",
        stderr_of(&output)
    );
    assert!(
        profile.exists(),
        "heap profile must still be written by the cleanup chain"
    );
}

#[tokio::test]
async fn logger_failure_exits_before_any_cleanup_registration() {
    use std::os::unix::fs::PermissionsExt;

    if rewind::bootstrap::elevation::current_euid() == 0 {
        // Root writes into read-only directories; the scenario cannot be
        // reproduced in that environment.
        return;
    }

    let sandbox = sandbox();
    let profile = sandbox.work.path().join("heap.json");
    fs::set_permissions(sandbox.work.path(), fs::Permissions::from_mode(0o555))
        .expect("can make working directory read-only");

    let output = run_rewind(
        &sandbox,
        &["login"],
        &[("HEAP_PROFILE", profile.to_str().expect("utf-8 path"))],
    )
    .await;

    fs::set_permissions(sandbox.work.path(), fs::Permissions::from_mode(0o755))
        .expect("can restore permissions");

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stdout_of(&output).contains("Failed to start the logger"),
        "stdout: {}",
        stdout_of(&output)
    );
    assert!(
        !profile.exists(),
        "no cleanup action may run when the logger never initialized"
    );
}
