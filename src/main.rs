//! gq - track-log query and photo correlation
//!
//! Entry point for the gq CLI application.

use clap::Parser;
use geoquery::{cli::Cli, error::ExitCode};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match geoquery::run_app(cli) {
        Ok(code) => code.into(),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;
            eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            exit_code.into()
        }
    }
}
