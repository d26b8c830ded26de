use crate::locator::EngineLocator;
use crate::metrics::MetricsCollector;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Json, Response};
use warp::Reply;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthBody {
    /// `ok` when the engine path is resolved, `degraded` otherwise.
    pub status: String,
    pub engine_resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_path: Option<PathBuf>,
}

impl HealthBody {
    fn from_cache(cached: Option<PathBuf>) -> Self {
        Self {
            status: if cached.is_some() { "ok" } else { "degraded" }.to_string(),
            engine_resolved: cached.is_some(),
            engine_path: cached,
        }
    }

    fn into_response(self) -> Response {
        let status = if self.engine_resolved {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        reply::with_status(reply::json(&self), status).into_response()
    }
}

/// `GET /health`. Reports the locator cache as it stands; never searches.
pub fn health(locator: Arc<EngineLocator>) -> Response {
    HealthBody::from_cache(locator.cached()).into_response()
}

/// `POST /engine/reresolve`. Drops the cached engine path, searches again and
/// reports the result in the same shape as `/health`.
pub fn reresolve(locator: Arc<EngineLocator>) -> Response {
    locator.invalidate();
    if let Err(err) = locator.resolve() {
        tracing::warn!(searched = ?err.searched, "re-resolution found no solver engine");
    }
    HealthBody::from_cache(locator.cached()).into_response()
}

/// `GET /metrics`
pub fn metrics(metrics: MetricsCollector) -> Json {
    reply::json(&metrics.snapshot())
}

#[derive(Serialize)]
struct Banner {
    message: &'static str,
    version: &'static str,
}

/// `GET /`
pub fn root() -> Json {
    reply::json(&Banner {
        message: "solvegate solve orchestration service",
        version: env!("CARGO_PKG_VERSION"),
    })
}
