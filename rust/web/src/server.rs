use crate::config::Config;
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::locator::EngineLocator;
use crate::metrics::MetricsCollector;
use crate::middleware::with_request_logging;
use crate::service::SolveService;
use crate::validation::SolveRequest;
use std::convert::Infallible;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::{Filter, Rejection};

/// Largest accepted `POST /solve` body.
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn for_tests() -> Self {
        Self::new("127.0.0.1", 0)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl From<&Config> for ServerConfig {
    fn from(config: &Config) -> Self {
        Self::new(config.host.clone(), config.port)
    }
}

/// Components shared by every request.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: ServerConfig,
    service: Arc<SolveService>,
}

impl AppContext {
    pub fn new(config: &Config) -> Self {
        Self::with_service(ServerConfig::from(config), SolveService::from_config(config))
    }

    pub fn with_service(config: ServerConfig, service: SolveService) -> Self {
        Self {
            config,
            service: Arc::new(service),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> Arc<SolveService> {
        Arc::clone(&self.service)
    }

    pub fn locator(&self) -> Arc<EngineLocator> {
        Arc::clone(self.service.locator())
    }

    pub fn metrics(&self) -> MetricsCollector {
        self.service.metrics().clone()
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[derive(Debug, Clone)]
pub struct WebServer {
    context: AppContext,
}

impl WebServer {
    pub fn new(config: &Config) -> Self {
        Self {
            context: AppContext::new(config),
        }
    }

    pub fn from_context(context: AppContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Binds and starts serving in a background task.
    ///
    /// Engine resolution is attempted once up front so `/health` reflects
    /// reality from the first request. A missing engine does not prevent
    /// startup; the service runs degraded until `/engine/reresolve` succeeds.
    pub async fn start(self) -> Result<ServerHandle, ServerError> {
        let WebServer { context } = self;
        let bind_addr = Self::bind_addr(context.config())?;

        if let Err(err) = context.locator().resolve() {
            tracing::warn!(
                searched = ?err.searched,
                "starting without a solver engine; /health will report degraded"
            );
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let routes = Self::routes(&context);
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        let (addr, server_future) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(bind_addr, shutdown_signal)
            .map_err(Self::map_warp_error)?;

        tracing::info!(%addr, "solve service listening");

        let task = tokio::spawn(async move {
            server_future.await;
            Ok(())
        });

        Ok(ServerHandle::new(addr, shutdown_tx, task, context))
    }

    fn bind_addr(config: &ServerConfig) -> Result<SocketAddr, ServerError> {
        let host = config.host();

        if let Ok(addr) = host.parse::<SocketAddr>() {
            return Ok(addr);
        }

        if let Ok(ip) = host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, config.port()));
        }

        let candidate = format!("{}:{}", host, config.port());
        let mut addrs = candidate.to_socket_addrs().map_err(|err| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`: {err}"))
        })?;

        addrs.next().ok_or_else(|| {
            ServerError::ConfigError(format!("failed to resolve address `{candidate}`"))
        })
    }

    fn map_warp_error(err: warp::Error) -> ServerError {
        use std::error::Error as StdError;

        if let Some(source) = err.source() {
            if let Some(io_err) = source.downcast_ref::<std::io::Error>() {
                let recreated = std::io::Error::new(io_err.kind(), io_err.to_string());
                return ServerError::BindError(recreated);
            }
        }

        ServerError::ConfigError(err.to_string())
    }

    /// Full route tree: endpoints, rejection mapping, request logging and CORS.
    pub fn routes(
        context: &AppContext,
    ) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_headers(vec!["content-type"]);

        let api = Self::info_routes(context)
            .or(Self::solve_route(context))
            .unify()
            .or(Self::engine_routes(context))
            .unify()
            .recover(handle_rejection)
            .unify();

        with_request_logging(api).with(cors)
    }

    fn info_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        let root = warp::path::end()
            .and(warp::get())
            .map(|| handlers::root().into_response());

        let health = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_locator(context.locator()))
            .map(handlers::health);

        let metrics = warp::path("metrics")
            .and(warp::path::end())
            .and(warp::get())
            .and(Self::with_metrics(context.metrics()))
            .map(|metrics: MetricsCollector| handlers::metrics(metrics).into_response());

        root.or(health)
            .unify()
            .or(metrics)
            .unify()
            .boxed()
    }

    fn solve_route(context: &AppContext) -> BoxedFilter<(Response,)> {
        warp::path("solve")
            .and(warp::path::end())
            .and(warp::post())
            .and(Self::with_service(context.service()))
            .and(warp::body::content_length_limit(MAX_BODY_BYTES))
            .and(warp::body::json())
            .and_then(
                |service: Arc<SolveService>, request: SolveRequest| async move {
                    let response = handlers::solve(service, request).await;
                    Ok::<_, Infallible>(response)
                },
            )
            .boxed()
    }

    fn engine_routes(context: &AppContext) -> BoxedFilter<(Response,)> {
        warp::path!("engine" / "reresolve")
            .and(warp::post())
            .and(Self::with_locator(context.locator()))
            .map(handlers::reresolve)
            .boxed()
    }

    fn with_service(
        service: Arc<SolveService>,
    ) -> impl Filter<Extract = (Arc<SolveService>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&service))
    }

    fn with_locator(
        locator: Arc<EngineLocator>,
    ) -> impl Filter<Extract = (Arc<EngineLocator>,), Error = Infallible> + Clone {
        warp::any().map(move || Arc::clone(&locator))
    }

    fn with_metrics(
        metrics: MetricsCollector,
    ) -> impl Filter<Extract = (MetricsCollector,), Error = Infallible> + Clone {
        warp::any().map(move || metrics.clone())
    }
}

/// Turns warp's rejections into the same error envelope the handlers use.
async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let (status, error) = if rejection.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ErrorResponse::new("not_found", "no such endpoint"),
        )
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("invalid_body", format!("request body is not valid: {err}")),
        )
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::new(
                "payload_too_large",
                format!("request body exceeds {MAX_BODY_BYTES} bytes"),
            ),
        )
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            ErrorResponse::new("length_required", "content-length header is required"),
        )
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorResponse::new("unsupported_media_type", "expected application/json"),
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("method_not_allowed", "method not allowed for this endpoint"),
        )
    } else {
        tracing::error!(rejection = ?rejection, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("internal_error", "unexpected error"),
        )
    };
    Ok(error.into_response(status))
}

#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
    context: AppContext,
}

impl ServerHandle {
    fn new(
        addr: SocketAddr,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<Result<(), ServerError>>,
        context: AppContext,
    ) -> Self {
        Self {
            addr,
            shutdown: Some(shutdown),
            task: Some(task),
            context,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(result) => result?,
                Err(err) => {
                    return Err(ServerError::ConfigError(format!(
                        "server task join error: {err}"
                    )))
                }
            }
        }

        self.context.metrics().log_metrics();
        tracing::info!(addr = %self.addr, "solve service stopped");
        Ok(())
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_accepts_ip_and_socket_forms() {
        let addr = WebServer::bind_addr(&ServerConfig::new("127.0.0.1", 8123)).unwrap();
        assert_eq!(addr.port(), 8123);

        let addr = WebServer::bind_addr(&ServerConfig::new("127.0.0.1:9000", 1)).unwrap();
        assert_eq!(addr.port(), 9000);
    }

    #[tokio::test]
    async fn starts_and_stops_on_an_ephemeral_port() {
        let config = Config {
            engine_root: std::env::temp_dir().join("solvegate-no-engine-here"),
            ..Config::default()
        };
        let mut context = AppContext::new(&config);
        context.config = ServerConfig::for_tests();

        let handle = WebServer::from_context(context).start().await.expect("start");
        assert_ne!(handle.address().port(), 0);
        assert!(handle.context().locator().cached().is_none());
        handle.shutdown().await.expect("shutdown");
    }
}
