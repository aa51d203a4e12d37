//! Lighthouse Server Entry Point
//!
//! Loads the configuration, binds the queues, starts the collector and
//! serves the HTTP API until Ctrl-C.

use std::sync::Arc;

use lighthouse_api::{
    assemble, build_router, init_logging, ApiError, ApiResult, Collector, CollectorConfig,
    LighthouseConfig,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = LighthouseConfig::load()?;
    init_logging(config.log_level)?;

    let assembly = assemble(&config)?;
    let collector =
        Collector::new(assembly.adapters, CollectorConfig::from(&config.collector)).start();
    let context = Arc::new(assembly.context.with_collector(collector.metrics()));
    let app = build_router(context);

    let addr = config.server.bind_addr()?;
    tracing::info!(%addr, "Starting Lighthouse server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    let snapshot = collector.stop().await;
    tracing::info!(
        rounds = snapshot.rounds,
        records_delivered = snapshot.records_delivered,
        source_errors = snapshot.source_errors,
        feed_errors = snapshot.feed_errors,
        "Lighthouse server stopped"
    );
    Ok(())
}
