//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "kittens",
    version,
    about = "Exploding Kittens simulator and agent tools"
)]
pub struct KittensCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play all-agent games to completion and record them
    Sim {
        /// Number of games to play
        #[arg(long, default_value_t = 1)]
        games: u32,
        /// Seats per game (2-5)
        #[arg(long, default_value_t = 4)]
        players: usize,
        /// Base seed; game i uses seed + i
        #[arg(long)]
        seed: Option<u64>,
        /// JSONL file receiving one record per game
        #[arg(long)]
        output: Option<PathBuf>,
        /// CSV file receiving (s,a,r,sp) agent transitions
        #[arg(long)]
        transitions: Option<PathBuf>,
        /// SQLite database to persist games into instead of memory
        #[arg(long)]
        db: Option<PathBuf>,
        /// Directory holding the policy tables
        #[arg(long)]
        policy_dir: Option<PathBuf>,
    },
    /// Show resolved settings and where each value came from
    Cfg,
    /// Summarize the policy tables in a directory
    Policy {
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Look up one encoded state in every loaded table
        #[arg(long)]
        state: Option<u32>,
    },
}
