//! # Kittens CLI Library
//!
//! Command-line front end for the Exploding Kittens engine: runs all-agent
//! simulations, shows the resolved configuration and inspects policy tables.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line
//! arguments and executes the appropriate subcommand.
//!
//! ```no_run
//! use std::io;
//! let args = vec!["kittens", "sim", "--games", "10", "--seed", "7"];
//! let code = kittens_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Available Subcommands
//!
//! - `sim`: Play all-agent games and write JSONL records / CSV transitions
//! - `cfg`: Display current configuration settings and their sources
//! - `policy`: Summarize trained policy tables

use clap::Parser;
use std::io::Write;

pub mod cli;
pub mod commands;
mod error;
pub mod exit_code;
pub mod io_utils;
pub mod ui;

use cli::{Commands, KittensCli};
use commands::{SimOptions, handle_cfg_command, handle_policy_command, handle_sim_command};
use kittens_service::settings;

pub use error::CliError;

const COMMANDS: &[&str] = &["sim", "cfg", "policy"];

/// Main entry point for the CLI application.
///
/// Returns the process exit code: `0` for success, `2` for errors.
///
/// ```
/// use std::io;
/// let mut out = Vec::new();
/// let code = kittens_cli::run(["kittens", "--help"], &mut out, &mut io::stderr());
/// assert_eq!(code, 0);
/// ```
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let cli = match KittensCli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => return report_usage(e, out, err),
    };

    let result = match cli.cmd {
        Commands::Cfg => handle_cfg_command(|key| std::env::var(key).ok(), out, err),
        Commands::Policy { dir, state } => match resolve_policy_dir(dir) {
            Ok(dir) => handle_policy_command(&dir, state, out, err),
            Err(e) => Err(e),
        },
        Commands::Sim {
            games,
            players,
            seed,
            output,
            transitions,
            db,
            policy_dir,
        } => {
            let opts = SimOptions {
                games,
                players,
                seed,
                output,
                transitions,
                db,
                policy_dir,
            };
            match settings::load() {
                Ok(resolved) => handle_sim_command(&opts, &resolved.settings, out, err),
                Err(e) => Err(CliError::from(e)),
            }
        }
    };

    match result {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => {
            let _ = writeln!(err, "Error: {}", e);
            exit_code::ERROR
        }
    }
}

fn resolve_policy_dir(dir: Option<std::path::PathBuf>) -> Result<std::path::PathBuf, CliError> {
    match dir {
        Some(d) => Ok(d),
        None => Ok(settings::load()?.settings.policy_dir.into()),
    }
}

fn report_usage(e: clap::Error, out: &mut dyn Write, err: &mut dyn Write) -> i32 {
    use clap::error::ErrorKind;

    // Help and version should print to stdout and exit 0
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        return match write!(out, "{}", e) {
            Ok(()) => exit_code::SUCCESS,
            Err(_) => exit_code::ERROR,
        };
    }

    let _ = writeln!(err, "{}", e);
    let _ = writeln!(err, "Usage: kittens <command> [options]\n");
    let _ = writeln!(err, "Commands:");
    for c in COMMANDS {
        let _ = writeln!(err, "  {}", c);
    }
    let _ = writeln!(err, "\nFor full help, run: kittens --help");
    exit_code::ERROR
}
