//! Command dispatch: parse the invocation and run the selected handler.

use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use clap::error::{ContextKind, ErrorKind};
use clap::{CommandFactory, Parser};
use tracing::{error, info};

use crate::{config::Config, platform::auth::AuthService, support::errors::DispatchError};

pub mod args;
pub mod report;
pub mod suite;

pub use args::{CliCommand, RootArgs, TestArgs};
pub use report::{render_report, TestOutcome, TestSummary};

use suite::CaseFile;

/// Parse `argv` and execute the selected subcommand.
///
/// Help and version requests print here and succeed. Unknown commands and
/// flags come back as [`DispatchError::Unrecognized`] so the bootstrap can
/// print its usage hint; handler failures are logged here and surfaced as
/// [`DispatchError::Command`].
pub async fn execute(
    argv: &[String],
    config: &Config,
    auth: &AuthService,
) -> Result<(), DispatchError> {
    let parsed = match RootArgs::try_parse_from(argv) {
        Ok(parsed) => parsed,
        Err(err) => return handle_parse_error(err),
    };

    match parsed.command {
        None => {
            let _ = RootArgs::command().print_help();
            Ok(())
        }
        Some(CliCommand::Login) => run_login(auth),
        Some(CliCommand::Test(test_args)) => {
            run_test(test_args, config).await.map_err(|err| {
                error!(target: "rewind::cli", error = ?err, "command failed");
                DispatchError::Command(err)
            })
        }
    }
}

fn handle_parse_error(err: clap::Error) -> Result<(), DispatchError> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let _ = err.print();
            Ok(())
        }
        ErrorKind::InvalidSubcommand => Err(DispatchError::Unrecognized {
            message: match err.get(ContextKind::InvalidSubcommand) {
                Some(value) => format!("unknown command \"{value}\""),
                None => err.to_string(),
            },
        }),
        ErrorKind::UnknownArgument => Err(DispatchError::Unrecognized {
            message: match err.get(ContextKind::InvalidArg) {
                Some(value) => format!("unknown flag {value}"),
                None => err.to_string(),
            },
        }),
        _ => Err(DispatchError::Command(err.into())),
    }
}

fn run_login(auth: &AuthService) -> Result<(), DispatchError> {
    info!(target: "rewind::cli", "starting GitHub device login");
    println!("Open the following URL in your browser to authorize this installation:");
    println!("{}", auth.device_authorization_url());
    Ok(())
}

async fn run_test(test_args: TestArgs, config: &Config) -> anyhow::Result<()> {
    let dir: PathBuf = test_args
        .path
        .clone()
        .or_else(|| {
            if config.path.as_os_str().is_empty() {
                None
            } else {
                Some(config.path.clone())
            }
        })
        .ok_or_else(|| {
            anyhow!("no test path configured; pass --path or set `path` in rewind.toml")
        })?;

    let container_name = test_args
        .container_name
        .as_deref()
        .or(config.test.container_name.as_deref());
    if let Some(container) = container_name {
        suite::probe_workload(container)
            .await
            .context("workload probe failed")?;
    }

    let cases = suite::load_cases(&dir).await?;
    info!(
        target: "rewind::cli",
        suite = %dir.display(),
        cases = cases.len(),
        "starting test run"
    );

    println!("Running tests...");
    println!();
    let outcomes: Vec<TestOutcome> = cases.iter().map(CaseFile::evaluate).collect();
    print!("{}", render_report(&outcomes));

    let failed = outcomes.iter().filter(|o| !o.passed).count();
    if failed > 0 {
        return Err(anyhow!("{failed} of {} test cases failed", outcomes.len()));
    }
    info!(target: "rewind::cli", total = outcomes.len(), "test run finished");
    Ok(())
}
