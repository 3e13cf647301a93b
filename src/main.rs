//! Entry point for the rewind CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    rewind::bootstrap::run()
}
