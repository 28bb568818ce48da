//! iconslice - command-line tool for cutting grid sprite sheets into named icons

use std::process::ExitCode;

use iconslice::cli;

fn main() -> ExitCode {
    cli::run()
}
