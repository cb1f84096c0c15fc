use std::sync::Arc;

use conveyor_core::{
    ConveyorConfig, PollingQueue, Result, WorkFn, WorkerEvent, WorkerHandle, WorkerOptions,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::dispatcher::{Invocation, WorkerDispatcher};
use crate::registry::ExecutorRegistry;

/// Worker-type identifier the dispatcher is registered under.
pub const WORKER_TYPE: &str = "reporting";

/// A dispatcher registered against a polling queue, with its lifecycle
/// events observed.
pub struct BoundWorker<H: WorkerHandle> {
    handle: H,
    observer: JoinHandle<()>,
}

impl<H: WorkerHandle> BoundWorker<H> {
    /// Handle of the underlying queue registration.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Stop polling and the event observer.
    pub fn shutdown(self) {
        self.handle.shutdown();
        self.observer.abort();
    }
}

/// Register the registry's dispatcher with the queue's polling engine and
/// observe its lifecycle events.
///
/// The binding performs no business logic; it is the observability wiring
/// that keeps unknown-job-type and executor failures from being silently
/// dropped. The queue supplies a fresh cancellation token per claimed job,
/// which the work function threads through to the executor.
pub fn bind_worker<Q: PollingQueue>(
    queue: &Q,
    registry: Arc<ExecutorRegistry>,
    config: &ConveyorConfig,
) -> Result<BoundWorker<Q::Handle>> {
    let dispatcher = WorkerDispatcher::new(registry);

    let work_fn: WorkFn = Arc::new(move |job, token| {
        let dispatcher = dispatcher.clone();
        Box::pin(async move { dispatcher.dispatch(job, Invocation::Queued(token)).await })
    });

    let options = WorkerOptions::from_config(config);
    tracing::info!(
        worker_type = WORKER_TYPE,
        server = %options.identity.name,
        poll_interval_ms = options.poll_interval.as_millis() as u64,
        "Registering queue worker"
    );

    let handle = queue.register_worker(WORKER_TYPE, work_fn, options)?;

    let worker_id = handle.id();
    let mut events = handle.events();
    let observer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(WorkerEvent::Complete { job_id }) => {
                    tracing::debug!(worker_id = %worker_id, job_id = %job_id, "Worker completed job");
                }
                Ok(WorkerEvent::ExecutionError { job_id, error }) => {
                    tracing::warn!(
                        worker_id = %worker_id,
                        job_id = %job_id,
                        error = %error,
                        "Worker job execution error"
                    );
                }
                Ok(WorkerEvent::Timeout { job_id }) => {
                    tracing::warn!(worker_id = %worker_id, job_id = %job_id, "Worker job timeout exceeded");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(worker_id = %worker_id, skipped, "Worker event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    Ok(BoundWorker { handle, observer })
}
