use std::convert::Infallible;
use std::time::Instant;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reply::{Reply, Response};
use warp::Filter;

struct RequestStart {
    path: String,
    method: Method,
    at: Instant,
}

/// Wraps `filter` so every request logs on entry and on completion with its
/// status and duration.
///
/// `filter` must already have its rejections recovered into responses,
/// otherwise rejected requests would never log their completion.
pub fn with_request_logging<F, T>(
    filter: F,
) -> impl Filter<Extract = (Response,), Error = Infallible> + Clone
where
    F: Filter<Extract = (T,), Error = Infallible> + Clone + Send + Sync + 'static,
    T: Reply,
{
    warp::any()
        .and(warp::path::full())
        .and(warp::method())
        .map(|path: FullPath, method: Method| {
            tracing::info!(path = %path.as_str(), method = %method, "incoming request");
            RequestStart {
                path: path.as_str().to_string(),
                method,
                at: Instant::now(),
            }
        })
        .and(filter)
        .map(|start: RequestStart, reply: T| {
            let response = reply.into_response();
            let duration_ms = start.at.elapsed().as_millis();
            log_response(
                response.status(),
                &start.path,
                start.method.as_str(),
                duration_ms,
            );
            response
        })
}

/// Logs a finished response at a level matching its status class.
pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u128) {
    let status = status.as_u16();
    if (500..600).contains(&status) {
        tracing::error!(status, path, method, duration_ms, "request completed");
    } else if (400..500).contains(&status) {
        tracing::warn!(status, path, method, duration_ms, "request completed");
    } else {
        tracing::info!(status, path, method, duration_ms, "request completed");
    }
}
