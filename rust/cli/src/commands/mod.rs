//! One module per subcommand.
//!
//! Each handler takes its parsed arguments plus `out`/`err` streams and
//! returns `Result<(), CliError>`; [`crate::run`] maps that to an exit code.

mod cfg;
mod doctor;
mod serve;
mod solve;

pub use cfg::handle_cfg_command;
pub use doctor::handle_doctor_command;
pub use serve::handle_serve_command;
pub use solve::handle_solve_command;

use crate::error::CliError;
use solvegate_web::config::{self, ConfigResolved};
use std::path::PathBuf;

/// Loads layered configuration and applies the `--engine-path` flag.
fn load_config(engine_path: Option<PathBuf>) -> Result<ConfigResolved, CliError> {
    let mut resolved = config::load()?;
    if let Some(path) = engine_path {
        resolved.override_engine_path(path);
    }
    Ok(resolved)
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
