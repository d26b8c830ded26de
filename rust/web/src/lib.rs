//! HTTP solve orchestration in front of an external postflop solving engine.
//!
//! A request flows through [`validation`] into a [`solvegate_core::HandDescriptor`],
//! the [`locator`] finds the engine binary, the [`invoker`] runs it as a
//! child process under a time budget, and the [`translator`] reads its strategy
//! dump. [`service::SolveService`] strings these together and [`server`] puts
//! them behind warp.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod invoker;
pub mod locator;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod service;
pub mod translator;
pub mod validation;

pub use config::{Config, ConfigError, ConfigResolved, ConfigSources, ValueSource};
pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use invoker::{EngineError, EngineInvoker, RawEngineOutput};
pub use locator::{CandidateCheck, EngineLocator, EngineNotFound};
pub use logging::{init_logging, init_test_logging, LogEntry, TestLogSubscriber};
pub use metrics::{MetricsCollector, MetricsSnapshot, SolveOutcome};
pub use middleware::{log_response, with_request_logging};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use service::{SolveError, SolveService};
pub use translator::{translate, DecisionNode, ParseError, SolveResult};
pub use validation::{validate, RequestValidator, SolveRequest, ValidationError};
