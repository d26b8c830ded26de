use crate::errors::IntoErrorResponse;
use crate::service::SolveService;
use crate::translator::SolveResult;
use crate::validation::SolveRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

/// Success body of `POST /solve`. Failures use the shared error envelope
/// from [`crate::errors`], which also carries `success: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub success: bool,
    pub strategy: SolveResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computation_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence: Option<f64>,
}

/// Solves one postflop spot.
///
/// # HTTP Method and Path
/// - **Method**: POST
/// - **Path**: `/solve`
///
/// # Request Format
/// ```json
/// {
///   "board": "Qs,Jh,2h",
///   "oop_range": "AA,KK",
///   "ip_range": "AKs,AKo",
///   "pot_size": 10,           // Optional, default 10
///   "effective_stack": 95,    // Optional, default 95
///   "position": "oop",        // Optional: "oop" or "ip"
///   "bet_sizes": {"flop-bet": [0.33, 0.66]},
///   "timeout_secs": 60        // Optional, capped by the server maximum
/// }
/// ```
///
/// # Response Format
/// - **200**: `{success: true, strategy, computation_time, convergence}`
/// - **400**: `validation_error` with `details: {field, reason}`
/// - **502**: `engine_output_unreadable`
/// - **503**: `engine_not_found` / `engine_spawn_failed`
/// - **504**: `engine_timeout`
/// - **500**: `engine_failed`
///
/// Engine diagnostics are logged under the solve's `solve_id` and never
/// returned to the caller.
pub async fn solve(service: Arc<SolveService>, request: SolveRequest) -> Response {
    match service.solve(&request).await {
        Ok(result) => {
            let body = SolveResponse {
                success: true,
                computation_time: result.computation_time,
                convergence: result.convergence,
                strategy: result,
            };
            reply::with_status(reply::json(&body), StatusCode::OK).into_response()
        }
        Err(err) => err.into_http_response(),
    }
}
