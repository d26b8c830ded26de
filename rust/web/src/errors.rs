//! Mapping of every failure kind onto an HTTP response.
//!
//! Client errors echo their details. Server-side failures reply with a coarse
//! message only; the diagnostic detail (stderr, searched paths, parser
//! position) is logged where the failure happened.
use crate::invoker::EngineError;
use crate::locator::EngineNotFound;
use crate::translator::ParseError;
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Error body carried under `error` in every failed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "engine_timeout")
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }

    /// Wraps the error in the `{success: false, error}` envelope.
    pub fn into_response(self, status: StatusCode) -> Response {
        let body = FailureEnvelope {
            success: false,
            error: self,
        };
        reply::with_status(reply::json(&body), status).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

#[derive(Debug, Serialize)]
struct FailureEnvelope {
    success: bool,
    error: ErrorResponse,
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Bad input; expected in normal operation.
    Client,
    /// Engine or infrastructure failure.
    Server,
    /// The engine answered with something we cannot read. Integration bug.
    Critical,
}

pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;

    fn error_code(&self) -> &'static str;

    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity {
        if self.status_code().is_server_error() {
            ErrorSeverity::Server
        } else {
            ErrorSeverity::Client
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    /// Convert to HTTP response with logging
    fn into_http_response(self) -> Response
    where
        Self: Sized,
    {
        let status = self.status_code();
        let severity = self.severity();
        let error_response = self.to_error_response();

        match severity {
            ErrorSeverity::Client => tracing::info!(
                status = status.as_u16(),
                error = %error_response.error,
                message = %error_response.message,
                "client error"
            ),
            ErrorSeverity::Server => tracing::error!(
                status = status.as_u16(),
                error = %error_response.error,
                message = %error_response.message,
                "server error"
            ),
            ErrorSeverity::Critical => tracing::error!(
                status = status.as_u16(),
                error = %error_response.error,
                message = %error_response.message,
                critical = true,
                "critical error"
            ),
        }

        error_response.into_response(status)
    }
}

impl IntoErrorResponse for ValidationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_code(&self) -> &'static str {
        "validation_error"
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self).ok()
    }
}

impl IntoErrorResponse for EngineNotFound {
    fn status_code(&self) -> StatusCode {
        StatusCode::SERVICE_UNAVAILABLE
    }

    fn error_code(&self) -> &'static str {
        "engine_not_found"
    }

    fn error_message(&self) -> String {
        "solver engine is not available".into()
    }
}

impl IntoErrorResponse for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            EngineError::SpawnFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::EngineFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            EngineError::Timeout { .. } => "engine_timeout",
            EngineError::SpawnFailure { .. } => "engine_spawn_failed",
            EngineError::EngineFailure { .. } => "engine_failed",
        }
    }

    fn error_message(&self) -> String {
        match self {
            EngineError::Timeout { budget } => {
                format!("solve did not finish within {}s", budget.as_secs_f64())
            }
            EngineError::SpawnFailure { .. } => "solver engine could not be started".into(),
            EngineError::EngineFailure { .. } => "solver engine failed".into(),
        }
    }
}

impl IntoErrorResponse for ParseError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_GATEWAY
    }

    fn error_code(&self) -> &'static str {
        "engine_output_unreadable"
    }

    fn error_message(&self) -> String {
        "solver engine output could not be interpreted".into()
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }
}
