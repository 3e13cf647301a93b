use std::{fs, path::Path, process::Output};

use tempfile::TempDir;
use tokio::process::Command;

pub const BINARY_PATH: &str = env!("CARGO_BIN_EXE_rewind");

/// Isolated home + working directory for one spawned invocation.
pub struct Sandbox {
    pub home: TempDir,
    pub work: TempDir,
}

pub fn sandbox() -> Sandbox {
    Sandbox {
        home: TempDir::new().expect("can create home directory"),
        work: TempDir::new().expect("can create working directory"),
    }
}

/// Spawn the binary inside the sandbox with a scrubbed environment.
pub async fn run_rewind(sandbox: &Sandbox, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = Command::new(BINARY_PATH);
    command
        .args(args)
        .current_dir(sandbox.work.path())
        .env_remove("REWIND_IN_DOCKER")
        .env_remove("REWIND_CONFIG")
        .env_remove("CPU_PROFILE")
        .env_remove("HEAP_PROFILE")
        .env("REWIND_HOME", sandbox.home.path());
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().await.expect("rewind binary should run")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Write one recorded case file; `passed` controls whether the observed
/// snapshot matches the expectation.
pub fn write_case(dir: &Path, file: &str, name: &str, endpoint: &str, passed: bool) {
    let observed_status = if passed { 200 } else { 500 };
    fs::write(
        dir.join(file),
        format!(
            "name = \"{name}\"\nendpoint = \"{endpoint}\"\n\n\
             [expected]\nstatus = 200\nbody = \"ok\"\n\n\
             [observed]\nstatus = {observed_status}\nbody = \"ok\"\n"
        ),
    )
    .expect("can write case file");
}
