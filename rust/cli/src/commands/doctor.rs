//! `doctor`: probes every engine candidate and tries to resolve one.
//!
//! Prints a JSON report either way and fails when no engine resolves, so it
//! can gate a deployment.

use crate::error::CliError;
use crate::ui;
use solvegate_web::EngineLocator;
use std::io::Write;
use std::path::PathBuf;

pub fn handle_doctor_command(
    engine_path: Option<PathBuf>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let resolved = super::load_config(engine_path)?;
    let config = &resolved.config;
    let locator = EngineLocator::with_defaults(config.engine_path.as_deref(), &config.engine_root);

    let checks = locator.inspect();
    let resolution = locator.resolve();

    let report = serde_json::json!({
        "engine_path": config.engine_path,
        "engine_root": config.engine_root,
        "candidates": checks,
        "resolved": resolution.as_ref().ok(),
    });
    ui::write_json(out, &report)?;

    match resolution {
        Ok(_) => Ok(()),
        Err(not_found) => {
            for check in checks.iter().filter(|c| c.exists && !c.executable) {
                ui::display_warning(
                    err,
                    &format!("{} exists but is not executable", check.path.display()),
                )?;
            }
            ui::write_error(err, &not_found.to_string())?;
            Err(CliError::Unhealthy("engine diagnostics failed".into()))
        }
    }
}
