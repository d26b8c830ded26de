//! Command-line surface.

use clap::{Parser, Subcommand};
use solvegate_core::Position;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "solvegate",
    version,
    about = "Solve orchestration service for an external postflop solving engine"
)]
pub struct SolvegateCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Engine executable to try before the standard locations
        #[arg(long)]
        engine_path: Option<PathBuf>,
    },
    /// Solve one spot and print the result as JSON
    Solve(SolveArgs),
    /// Probe the engine locations and report what was found
    Doctor {
        #[arg(long)]
        engine_path: Option<PathBuf>,
    },
    /// Show the resolved configuration and where each value came from
    Cfg,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct SolveArgs {
    /// JSON file holding a full solve request, as sent to `POST /solve`
    #[arg(long, conflicts_with_all = ["board", "oop_range", "ip_range"])]
    pub request: Option<PathBuf>,
    /// Board cards, e.g. `Qs,Jh,2h`
    #[arg(long)]
    pub board: Option<String>,
    #[arg(long)]
    pub oop_range: Option<String>,
    #[arg(long)]
    pub ip_range: Option<String>,
    #[arg(long)]
    pub pot_size: Option<f64>,
    #[arg(long)]
    pub effective_stack: Option<f64>,
    /// `oop` or `ip`
    #[arg(long)]
    pub position: Option<Position>,
    #[arg(long)]
    pub timeout_secs: Option<f64>,
    #[arg(long)]
    pub engine_path: Option<PathBuf>,
}
