//! Command-line argument definitions for the dispatch tree.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::bootstrap::VERSION;

/// Top-level command line.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rewind",
    author,
    version = VERSION,
    about = "Record and verify API test cases",
    long_about = None
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

/// Subcommands resolved by the dispatch layer.
#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Print the GitHub device-authorization URL for this installation.
    Login,
    /// Verify recorded test cases and print the execution summary.
    Test(TestArgs),
}

/// Arguments for `rewind test`.
#[derive(Debug, Clone, Args)]
pub struct TestArgs {
    /// Directory holding recorded case files (defaults to the configured path).
    #[arg(long = "path")]
    pub path: Option<PathBuf>,
    /// Name of the workload container the cases were recorded against.
    #[arg(long = "container-name")]
    pub container_name: Option<String>,
    /// Compose file that starts the workload.
    #[arg(long = "compose-file")]
    pub compose_file: Option<PathBuf>,
}
