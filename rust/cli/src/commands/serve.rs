use crate::error::CliError;
use solvegate_web::WebServer;
use std::io::Write;
use std::path::PathBuf;

/// Runs the HTTP service until Ctrl+C, then shuts it down gracefully.
pub fn handle_serve_command(
    host: Option<String>,
    port: Option<u16>,
    engine_path: Option<PathBuf>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut resolved = super::load_config(engine_path)?;
    if let Some(host) = host {
        resolved.override_host(host);
    }
    if let Some(port) = port {
        resolved.override_port(port);
    }
    resolved.config.validate()?;

    let runtime = super::runtime()?;
    runtime.block_on(async {
        let handle = WebServer::new(&resolved.config).start().await?;
        writeln!(out, "solvegate listening on http://{}", handle.address())?;
        out.flush()?;

        tokio::signal::ctrl_c().await?;
        handle.shutdown().await?;
        writeln!(out, "solvegate stopped")?;
        Ok::<(), CliError>(())
    })
}
