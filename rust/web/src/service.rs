use crate::config::Config;
use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::invoker::{EngineError, EngineInvoker};
use crate::locator::{EngineLocator, EngineNotFound};
use crate::metrics::{MetricsCollector, SolveOutcome};
use crate::translator::{translate, ParseError, SolveResult};
use crate::validation::{RequestValidator, SolveRequest, ValidationError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;
use warp::http::StatusCode;

/// Any way a solve can fail. Each kind keeps its own identity all the way to
/// the response layer.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    EngineNotFound(#[from] EngineNotFound),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SolveError {
    fn outcome(&self) -> SolveOutcome {
        match self {
            SolveError::Validation(_) => SolveOutcome::ValidationFailed,
            SolveError::EngineNotFound(_) => SolveOutcome::EngineNotFound,
            SolveError::Engine(EngineError::Timeout { .. }) => SolveOutcome::Timeout,
            SolveError::Engine(EngineError::SpawnFailure { .. }) => SolveOutcome::SpawnFailure,
            SolveError::Engine(EngineError::EngineFailure { .. }) => SolveOutcome::EngineFailure,
            SolveError::Parse(_) => SolveOutcome::ParseFailure,
        }
    }

    fn inner(&self) -> &dyn IntoErrorResponse {
        match self {
            SolveError::Validation(e) => e,
            SolveError::EngineNotFound(e) => e,
            SolveError::Engine(e) => e,
            SolveError::Parse(e) => e,
        }
    }
}

impl IntoErrorResponse for SolveError {
    fn status_code(&self) -> StatusCode {
        self.inner().status_code()
    }

    fn error_code(&self) -> &'static str {
        self.inner().error_code()
    }

    fn error_message(&self) -> String {
        self.inner().error_message()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        self.inner().error_details()
    }

    fn severity(&self) -> ErrorSeverity {
        self.inner().severity()
    }
}

/// The solve pipeline: validate, locate the engine, run it, read its output.
///
/// Holds no per-request state. Concurrent solves each get their own engine
/// process; the only thing they share is the locator's cached path.
#[derive(Debug, Clone)]
pub struct SolveService {
    validator: RequestValidator,
    locator: Arc<EngineLocator>,
    invoker: EngineInvoker,
    metrics: MetricsCollector,
}

impl SolveService {
    pub fn new(
        validator: RequestValidator,
        locator: Arc<EngineLocator>,
        invoker: EngineInvoker,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            validator,
            locator,
            invoker,
            metrics,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let locator = EngineLocator::with_defaults(
            config.engine_path.as_deref(),
            &config.engine_root,
        );
        Self::new(
            RequestValidator::new(config.max_timeout()),
            Arc::new(locator),
            EngineInvoker::new(config.default_timeout()),
            MetricsCollector::new(),
        )
    }

    pub fn locator(&self) -> &Arc<EngineLocator> {
        &self.locator
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub async fn solve(&self, request: &SolveRequest) -> Result<SolveResult, SolveError> {
        let solve_id = Uuid::new_v4().to_string();
        let _in_flight = self.metrics.start_solve();
        let started = Instant::now();

        let result = self.run(&solve_id, request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let board = request.board.as_deref().unwrap_or_default();
        match &result {
            Ok(solved) => {
                self.metrics.record(SolveOutcome::Succeeded);
                tracing::info!(
                    solve_id = %solve_id,
                    board,
                    elapsed_ms,
                    nodes = solved.nodes.len(),
                    outcome = "success",
                    "solve finished"
                );
            }
            Err(err) => {
                self.metrics.record(err.outcome());
                tracing::info!(
                    solve_id = %solve_id,
                    board,
                    elapsed_ms,
                    outcome = err.error_code(),
                    "solve finished"
                );
            }
        }
        result
    }

    async fn run(&self, solve_id: &str, request: &SolveRequest) -> Result<SolveResult, SolveError> {
        let descriptor = self.validator.validate(request).map_err(|err| {
            tracing::debug!(solve_id, field = err.field, reason = %err.reason, "request rejected");
            err
        })?;

        let engine_path = self.locator.resolve()?;
        tracing::info!(
            solve_id,
            board = %descriptor.board,
            engine_path = %engine_path.display(),
            "solve started"
        );

        let raw = match self.invoker.invoke(&descriptor, &engine_path).await {
            Ok(raw) => raw,
            Err(err) => {
                match &err {
                    EngineError::EngineFailure { status, stderr } => tracing::error!(
                        solve_id,
                        status = %status,
                        stderr = %stderr.trim(),
                        "solver engine failed"
                    ),
                    EngineError::SpawnFailure { path, reason } => tracing::error!(
                        solve_id,
                        engine_path = %path.display(),
                        reason = %reason,
                        "solver engine could not be started"
                    ),
                    EngineError::Timeout { budget } => tracing::warn!(
                        solve_id,
                        budget_ms = budget.as_millis() as u64,
                        "solver engine timed out"
                    ),
                }
                return Err(err.into());
            }
        };

        let elapsed_ms = raw.elapsed.as_millis() as u64;
        self.metrics.record_engine_time(elapsed_ms);

        translate(&raw).map_err(|err| {
            tracing::error!(
                solve_id,
                elapsed_ms,
                stdout_bytes = raw.stdout.len(),
                reason = %err,
                "solver engine output schema drift"
            );
            SolveError::from(err)
        })
    }
}
