//! Lighthouse API - queue collector and REST front end
//!
//! Binds one Unix datagram queue per configured topic, runs the collector
//! that moves queued records into their topic caches, and serves those
//! caches plus the declared actions over HTTP (Axum).
//!
//! Startup is: [`LighthouseConfig::load`], [`init_logging`], [`assemble`],
//! [`Collector::start`], [`build_router`].

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod routes;
pub mod sources;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::{ConfigError, ConfigFormat, LighthouseConfig, LogLevel};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use jobs::{Collector, CollectorConfig, CollectorHandle, CollectorSnapshot, CollectorState};
pub use routes::build_router;
pub use sources::{IpcQueuePublisher, IpcQueueSource};
pub use state::{assemble, Assembly, ServerContext, TopicRoute};
pub use telemetry::init_logging;
