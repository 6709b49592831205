//! dupsweep - staged duplicate file remover
//!
//! Entry point for the dupsweep CLI application.

use clap::Parser;
use dupsweep::{cli::Cli, error::ExitCode};

fn main() {
    // Argument errors are usage errors: report them and exit successfully
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(ExitCode::Success.as_i32());
        }
    };

    match dupsweep::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;
            eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
