//! # solvegate CLI
//!
//! Command-line front end for the solve orchestration service: run the HTTP
//! service, solve a single spot from the shell, check engine installation,
//! and inspect configuration.
//!
//! ```no_run
//! use std::io;
//! let args = vec!["solvegate", "solve", "--board", "Qs,Jh,2h",
//!                 "--oop-range", "AA,KK", "--ip-range", "AKs,AKo"];
//! let code = solvegate_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```

use clap::Parser;
use std::io::Write;

pub mod cli;
mod commands;
mod error;
pub mod exit_code;
pub mod ui;

use cli::{Commands, SolvegateCli};
use commands::{
    handle_cfg_command, handle_doctor_command, handle_serve_command, handle_solve_command,
};

pub use error::CliError;

const COMMANDS: &[&str] = &["serve", "solve", "doctor", "cfg"];

/// Parses `args` and runs the selected subcommand.
///
/// Returns `0` on success, `2` on any failure and `130` when interrupted.
/// Help and version go to `out`; diagnostics go to `err`.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match SolvegateCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return report_parse_error(e, out, err),
    };

    let result = match cli.cmd {
        Commands::Serve {
            host,
            port,
            engine_path,
        } => handle_serve_command(host, port, engine_path, out),
        Commands::Solve(args) => handle_solve_command(args, out, err),
        Commands::Doctor { engine_path } => handle_doctor_command(engine_path, out, err),
        Commands::Cfg => handle_cfg_command(out, err),
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(CliError::Interrupted(msg)) => {
            let _ = writeln!(err, "Interrupted: {}", msg);
            exit_code::INTERRUPTED
        }
        Err(CliError::Unhealthy(_)) => exit_code::ERROR,
        Err(e) => {
            let _ = ui::write_error(err, &e.to_string());
            exit_code::ERROR
        }
    }
}

fn report_parse_error(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            if write!(out, "{}", e).is_err() {
                return exit_code::ERROR;
            }
            exit_code::SUCCESS
        }
        _ => {
            if writeln!(err, "{}", e).is_err()
                || writeln!(err, "Usage: solvegate <command> [options]\n").is_err()
                || writeln!(err, "Commands:").is_err()
            {
                return exit_code::ERROR;
            }
            for c in COMMANDS {
                if writeln!(err, "  {}", c).is_err() {
                    return exit_code::ERROR;
                }
            }
            let _ = writeln!(err, "\nFor full help, run: solvegate --help");
            exit_code::ERROR
        }
    }
}
