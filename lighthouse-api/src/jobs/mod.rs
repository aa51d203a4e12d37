//! Background Jobs for the Lighthouse server
//!
//! - `collector`: moves queued records into the topic caches
//!
//! # Usage
//!
//! The collector is started once the adapters are built and stopped after
//! the HTTP server exits:
//!
//! ```ignore
//! use lighthouse_api::jobs::{Collector, CollectorConfig};
//!
//! let handle = Collector::new(adapters, CollectorConfig::default()).start();
//!
//! // On shutdown
//! let snapshot = handle.stop().await;
//! ```

pub mod collector;

// Re-export commonly used types
pub use collector::{
    collector_task, Collector, CollectorConfig, CollectorHandle, CollectorMetrics,
    CollectorSnapshot, CollectorState,
};
