//! Server context assembled once at startup.
//!
//! The context owns everything request handlers read: the topic caches,
//! the action registry, and a view of the collector's counters. Nothing in
//! it changes after startup except the caches' contents.

use chrono::{DateTime, Utc};
use lighthouse_core::{Adapter, AgingCacheTarget, ActionRegistry, CoreResult, Target};
use std::sync::Arc;

use crate::config::LighthouseConfig;
use crate::error::ApiResult;
use crate::handlers::build_catalog;
use crate::jobs::{CollectorMetrics, CollectorState};
use crate::sources::{IpcError, IpcQueueSource};

/// A topic served at `route`.
#[derive(Debug, Clone)]
pub struct TopicRoute {
    pub adapter: String,
    pub queue: String,
    pub route: String,
    pub target: Arc<AgingCacheTarget>,
}

#[derive(Debug)]
pub struct ServerContext {
    pub topics: Vec<TopicRoute>,
    pub registry: Arc<ActionRegistry>,
    collector: Option<Arc<CollectorMetrics>>,
    pub started_at: DateTime<Utc>,
}

impl ServerContext {
    pub fn new(topics: Vec<TopicRoute>, registry: ActionRegistry) -> Self {
        Self {
            topics,
            registry: Arc::new(registry),
            collector: None,
            started_at: Utc::now(),
        }
    }

    /// Attach the running collector's counters.
    pub fn with_collector(mut self, metrics: Arc<CollectorMetrics>) -> Self {
        self.collector = Some(metrics);
        self
    }

    pub fn collector(&self) -> Option<&Arc<CollectorMetrics>> {
        self.collector.as_ref()
    }

    /// `Stopped` when no collector was attached.
    pub fn collector_state(&self) -> CollectorState {
        self.collector
            .as_ref()
            .map(|metrics| metrics.state())
            .unwrap_or(CollectorState::Stopped)
    }

    pub fn topic(&self, name: &str) -> Option<&TopicRoute> {
        self.topics.iter().find(|t| t.target.topic() == name)
    }
}

/// Build one cache per configured adapter.
pub fn build_topics(config: &LighthouseConfig) -> Vec<TopicRoute> {
    config
        .ipc_rest_adapters
        .iter()
        .map(|adapter| TopicRoute {
            adapter: adapter.adapter_name.clone(),
            queue: adapter.ipc_queue.clone(),
            route: adapter.rest_route.clone(),
            target: Arc::new(AgingCacheTarget::new(
                adapter.topic(),
                adapter.group_by_attrib.clone(),
                adapter.freshness_window(config.freshness_window_secs),
            )),
        })
        .collect()
}

/// Build the handler catalog and register every configured action.
pub fn build_registry(config: &LighthouseConfig) -> CoreResult<ActionRegistry> {
    let mut registry = ActionRegistry::new(build_catalog(&config.handler_configs()));
    for action in &config.rest_actions {
        registry.register(action.to_action())?;
    }
    Ok(registry)
}

/// Bind one queue socket per topic, pairing it with the topic's cache.
pub fn build_adapters(
    config: &LighthouseConfig,
    topics: &[TopicRoute],
) -> Result<Vec<Adapter>, IpcError> {
    topics
        .iter()
        .map(|topic| {
            let source = IpcQueueSource::bind(&config.ipc_dir, &topic.queue)?;
            tracing::info!(
                adapter = %topic.adapter,
                queue = %topic.queue,
                socket = ?source.path(),
                route = %topic.route,
                "Adapter ready"
            );
            let target: Arc<dyn Target> = topic.target.clone();
            Ok(Adapter::new(topic.adapter.clone(), Box::new(source), target))
        })
        .collect()
}

/// Everything startup produces before the collector runs.
#[derive(Debug)]
pub struct Assembly {
    pub context: ServerContext,
    pub adapters: Vec<Adapter>,
}

/// Assemble the server from a validated configuration.
pub fn assemble(config: &LighthouseConfig) -> ApiResult<Assembly> {
    let topics = build_topics(config);
    let registry = build_registry(config)?;
    let adapters = build_adapters(config, &topics)?;

    tracing::info!(
        topics = topics.len(),
        actions = registry.len(),
        handlers = registry.catalog().len(),
        "Server assembled"
    );

    Ok(Assembly {
        context: ServerContext::new(topics, registry),
        adapters,
    })
}
