//! Process bootstrap: the ordered startup sequence, the recovery boundary,
//! and exit-code derivation.
//!
//! The sequence is strict: logger, elevation gate, diagnostics, cleanup
//! registration, recovery guard, umask, crash reporting, configuration,
//! identity, auth, dispatch, ownership restore. Earlier fatal failures
//! short-circuit later steps; cleanup actions already registered still run.

use std::{
    env,
    panic::{catch_unwind, AssertUnwindSafe},
    path::{Path, PathBuf},
    process::ExitCode,
};

use tracing::{error, info, warn};

use crate::{
    cli,
    config::Config,
    platform::{auth::AuthService, identity::IdentityStore},
    support::{errors::DispatchError, fs as fsutil, telemetry},
};

pub mod cleanup;
pub mod crash;
pub mod diagnostics;
pub mod elevation;

use cleanup::CleanupStack;

/// Build-injected version, stamped into `--version` output and crash events.
pub const VERSION: &str = match option_env!("REWIND_VERSION") {
    Some(version) => version,
    None => "dev",
};

/// Marker set when the process runs under the bundled container image; the
/// supervisor owns the transient files, so baseline cleanup is skipped.
pub const IN_DOCKER_ENV: &str = "REWIND_IN_DOCKER";

const TRANSIENT_COMPOSE_FILE: &str = "docker-compose-tmp.yaml";

/// Immutable run context, frozen once identity resolution succeeds and
/// threaded into everything that runs after it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub version: &'static str,
    pub installation_id: String,
    pub api_server_url: String,
    pub github_client_id: String,
    pub path: PathBuf,
    pub cmd_used: String,
}

impl ExecutionContext {
    fn freeze(config: &Config) -> Self {
        Self {
            version: VERSION,
            installation_id: config.installation_id.clone(),
            api_server_url: config.api_server_url.clone(),
            github_client_id: config.github_client_id.clone(),
            path: config.path.clone(),
            cmd_used: config.test.cmd_used.clone(),
        }
    }
}

/// Run the whole bootstrap sequence and produce the process exit code.
pub fn run() -> ExitCode {
    let argv: Vec<String> = env::args().collect();

    // Logger first: every later step reports through it. Its failure is the
    // one error that goes to stdout.
    let log_handle = match telemetry::init() {
        Ok(handle) => handle,
        Err(err) => {
            println!("Failed to start the logger for the CLI: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    info!(target: "rewind::bootstrap", version = VERSION, "starting rewind");

    let in_docker = env::var(IN_DOCKER_ENV).is_ok_and(|value| value == "true");
    let cli_args = argv.get(1..).unwrap_or_default();
    if elevation::requires_elevation(cli_args, elevation::current_euid(), in_docker) {
        // Hand off entirely: the elevated child runs the real bootstrap, so
        // this process must not touch profiling, config, or identity.
        return elevation::reexec_with_sudo(&argv);
    }

    let mut cleanup = CleanupStack::new();

    if let Some(path) = profile_path(diagnostics::CPU_PROFILE_ENV) {
        match diagnostics::CpuProfileSession::start(path) {
            Ok(session) => {
                cleanup.defer("cpu-profile-stop", move || {
                    if let Err(err) = session.stop() {
                        warn!(
                            target: "rewind::diagnostics",
                            %err,
                            "could not write CPU profile"
                        );
                    }
                });
            }
            Err(err) => {
                warn!(
                    target: "rewind::diagnostics",
                    %err,
                    "could not start CPU profile"
                );
            }
        }
    }

    if let Some(path) = profile_path(diagnostics::HEAP_PROFILE_ENV) {
        cleanup.defer("heap-profile", move || {
            if let Err(err) = diagnostics::write_heap_profile(&path) {
                warn!(
                    target: "rewind::diagnostics",
                    %err,
                    "could not write heap profile"
                );
            }
        });
    }

    if in_docker {
        info!(
            target: "rewind::bootstrap",
            "running inside a container; transient-file cleanup left to the supervisor"
        );
    } else {
        let handle = log_handle.clone();
        cleanup.defer("baseline-files", move || {
            handle.close();
            fsutil::remove_file_if_exists(handle.path());
            fsutil::remove_file_if_exists(Path::new(TRANSIENT_COMPOSE_FILE));
        });
    }

    // Recovery boundary around the main sequence: a panic past this point is
    // logged and becomes a failing exit, after the cleanup chain drains.
    let outcome = catch_unwind(AssertUnwindSafe(|| run_main(&argv, &mut cleanup)));
    cleanup.run();

    match outcome {
        Ok(code) => code,
        Err(payload) => {
            let message = crash::payload_message(payload.as_ref());
            error!(
                target: "rewind::bootstrap",
                message = %message,
                "recovered from unexpected fault"
            );
            ExitCode::FAILURE
        }
    }
}

/// Steps guarded by the recovery boundary: umask, crash reporting, config,
/// identity, auth, dispatch, ownership restore.
fn run_main(argv: &[String], cleanup: &mut CleanupStack) -> ExitCode {
    // The mask drops to zero so files created by an elevated run stay
    // reachable for the invoking user.
    let old_mask = fsutil::lower_umask();
    cleanup.defer("umask-restore", move || fsutil::restore_umask(old_mask));

    if let Some(dsn) = crash::CRASH_REPORT_DSN {
        if let Err(err) = crash::init(dsn, VERSION) {
            warn!(target: "rewind::bootstrap", %err, "crash reporting unavailable");
        }
    }

    let mut config = match Config::build(argv.join(" ")) {
        Ok(config) => config,
        Err(err) => {
            error!(target: "rewind::bootstrap", %err, "failed to build configuration");
            return ExitCode::FAILURE;
        }
    };

    let store = match IdentityStore::from_env() {
        Ok(store) => store,
        Err(err) => {
            error!(target: "rewind::bootstrap", %err, "failed to get installation id");
            return ExitCode::FAILURE;
        }
    };
    config.installation_id = match store.installation_id() {
        Ok(id) => id,
        Err(err) => {
            error!(target: "rewind::bootstrap", %err, "failed to get installation id");
            return ExitCode::FAILURE;
        }
    };

    let ctx = ExecutionContext::freeze(&config);
    let auth = AuthService::new(
        ctx.api_server_url.clone(),
        ctx.installation_id.clone(),
        ctx.github_client_id.clone(),
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(target: "rewind::bootstrap", %err, "failed to start the async runtime");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(cli::execute(argv, &config, &auth)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(DispatchError::Unrecognized { message }) => {
            println!("Error: {message}");
            println!("Run 'rewind --help' for usage.");
            ExitCode::FAILURE
        }
        // Already logged by the dispatch layer.
        Err(DispatchError::Command(_)) => ExitCode::FAILURE,
    };

    if !ctx.path.as_os_str().is_empty() {
        fsutil::restore_path_ownership(&ctx.path);
    }

    code
}

fn profile_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
