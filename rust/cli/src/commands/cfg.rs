//! `cfg`: prints every configuration value with the layer it came from.
//!
//! ```json
//! {
//!   "port": { "value": 8000, "source": "default" },
//!   "engine_root": { "value": "/opt/TexasSolver", "source": "env" },
//!   ...
//! }
//! ```

use crate::error::CliError;
use crate::ui;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = match super::load_config(None) {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(e);
        }
    };

    let solvegate_web::ConfigResolved { config, sources } = resolved;
    let display = serde_json::json!({
        "host": { "value": config.host, "source": sources.host },
        "port": { "value": config.port, "source": sources.port },
        "engine_path": { "value": config.engine_path, "source": sources.engine_path },
        "engine_root": { "value": config.engine_root, "source": sources.engine_root },
        "default_timeout_secs": {
            "value": config.default_timeout_secs,
            "source": sources.default_timeout_secs,
        },
        "max_timeout_secs": {
            "value": config.max_timeout_secs,
            "source": sources.max_timeout_secs,
        },
    });
    ui::write_json(out, &display)?;
    Ok(())
}
