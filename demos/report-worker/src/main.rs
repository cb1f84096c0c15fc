//! Demo report worker.
//!
//! Registers the demo export types, binds a polling worker to an in-memory
//! queue, runs a few jobs end to end, and logs lifecycle events until
//! ctrl-c.

mod exports;

use std::sync::Arc;

use anyhow::Result;
use conveyor_core::{ConveyorConfig, JobSource, RequestContext};
use conveyor_runtime::{
    bind_worker, ExecutorRegistry, InMemoryQueue, Invocation, WorkerDispatcher,
};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let mut config = ConveyorConfig::default();
    config.queue.poll_interval_ms = 250;

    let registry = Arc::new(ExecutorRegistry::build(&config, &exports::export_types())?);
    tracing::info!(job_types = registry.len(), "Executor registry built");

    let queue = InMemoryQueue::new(config.queue.job_timeout());
    let worker = bind_worker(&queue, registry.clone(), &config)?;

    // Queue a couple of reports.
    let pdf_job = queue.enqueue("printable_pdf", json!({ "title": "Quarterly summary" }));
    let csv_job = queue.enqueue("csv", json!({ "rows": 1200 }));
    tracing::info!(pdf_job = %pdf_job, csv_job = %csv_job, "Enqueued report jobs");

    // One inline export, bypassing the queue entirely.
    let dispatcher = WorkerDispatcher::new(registry);
    let outcome = dispatcher
        .dispatch(
            JobSource::immediate("csv_immediate", json!({ "rows": 10 })),
            Invocation::Immediate(RequestContext::new().with_user("demo")),
        )
        .await?;
    tracing::info!(%outcome, "Inline CSV export finished");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    worker.shutdown();

    Ok(())
}
