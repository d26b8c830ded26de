//! `solve`: one solve through the same pipeline the HTTP service uses.

use crate::cli::SolveArgs;
use crate::error::CliError;
use crate::ui;
use solvegate_web::handlers::SolveResponse;
use solvegate_web::{EngineError, SolveError, SolveRequest, SolveService};
use std::io::Write;

pub fn handle_solve_command(
    args: SolveArgs,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    let resolved = super::load_config(args.engine_path.clone())?;
    let request = build_request(&args)?;
    let service = SolveService::from_config(&resolved.config);

    let runtime = super::runtime()?;
    let outcome = runtime.block_on(async {
        tokio::select! {
            result = service.solve(&request) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    match outcome {
        None => Err(CliError::Interrupted("solve cancelled".into())),
        Some(Ok(result)) => {
            let response = SolveResponse {
                success: true,
                computation_time: result.computation_time,
                convergence: result.convergence,
                strategy: result,
            };
            ui::write_json(out, &response)?;
            Ok(())
        }
        Some(Err(e)) => {
            if let SolveError::Engine(EngineError::EngineFailure { stderr, .. }) = &e {
                for line in stderr.lines() {
                    writeln!(err, "engine: {}", line)?;
                }
            }
            Err(e.into())
        }
    }
}

fn build_request(args: &SolveArgs) -> Result<SolveRequest, CliError> {
    if let Some(path) = &args.request {
        let text = std::fs::read_to_string(path)?;
        return serde_json::from_str(&text).map_err(|e| {
            CliError::InvalidInput(format!("{} is not a solve request: {}", path.display(), e))
        });
    }
    Ok(SolveRequest {
        board: args.board.clone(),
        oop_range: args.oop_range.clone(),
        ip_range: args.ip_range.clone(),
        pot_size: args.pot_size,
        effective_stack: args.effective_stack,
        position: args.position.map(|p| p.to_string()),
        timeout_secs: args.timeout_secs,
        ..SolveRequest::default()
    })
}
