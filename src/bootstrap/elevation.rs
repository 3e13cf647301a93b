//! Decide whether the invocation needs root, and re-exec through sudo.
//!
//! The decision is a pure function so it can be tested without spawning
//! anything; the relaunch itself hands the terminal, stdio, and exit code to
//! the elevated child.

use std::process::{Command, ExitCode};

use tracing::{error, info};

/// Arguments that manipulate a container workload and therefore need the
/// privileges of the container engine.
const CONTAINER_FLAGS: [&str; 2] = ["--container-name", "--compose-file"];

/// Does this invocation have to re-exec with elevated privileges before any
/// other bootstrap step runs?
pub fn requires_elevation(args: &[String], euid: u32, in_docker: bool) -> bool {
    if euid == 0 || in_docker {
        return false;
    }
    args.iter().any(|arg| is_container_flag(arg))
}

fn is_container_flag(arg: &str) -> bool {
    CONTAINER_FLAGS
        .iter()
        .any(|flag| arg == *flag || (arg.starts_with(flag) && arg[flag.len()..].starts_with('=')))
}

pub fn current_euid() -> u32 {
    unsafe { libc::geteuid() }
}

/// Re-run the same invocation under `sudo -E`, wait for it, and hand back its
/// exit code. The calling process must not run any further bootstrap steps.
pub fn reexec_with_sudo(argv: &[String]) -> ExitCode {
    info!(
        target: "rewind::elevation",
        "re-executing with elevated privileges for container access"
    );
    match Command::new("sudo").arg("-E").args(argv).status() {
        Ok(status) => match status.code() {
            Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
            None => {
                error!(
                    target: "rewind::elevation",
                    "elevated process terminated by signal"
                );
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!(
                target: "rewind::elevation",
                %err,
                "failed to launch elevated process"
            );
            ExitCode::FAILURE
        }
    }
}
