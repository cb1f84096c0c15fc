use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::cancel::CancellationToken;
use crate::config::ConveyorConfig;
use crate::error::Result;
use crate::job::{ExecuteFuture, JobId, JobSource};

/// Work function a queue invokes once per claimed job, supplying a fresh
/// cancellation token for that job.
pub type WorkFn = Arc<dyn Fn(JobSource, CancellationToken) -> ExecuteFuture + Send + Sync>;

/// Identity of a registered worker.
#[derive(Debug, Clone)]
pub struct WorkerIdentity {
    /// Server name the worker runs on.
    pub name: String,

    /// Server instance id.
    pub id: Uuid,
}

/// Configuration snapshot passed at worker registration; immutable for the
/// worker's lifetime.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Base polling interval.
    pub poll_interval: Duration,

    /// Factor applied to the interval after an errored cycle.
    pub interval_error_multiplier: u32,

    /// Worker identity tuple.
    pub identity: WorkerIdentity,
}

impl WorkerOptions {
    /// Assemble worker options from server configuration.
    pub fn from_config(config: &ConveyorConfig) -> Self {
        Self {
            poll_interval: config.queue.poll_interval(),
            interval_error_multiplier: config.queue.poll_interval_error_multiplier,
            identity: WorkerIdentity {
                name: config.server.name.clone(),
                id: config.server.id,
            },
        }
    }
}

/// Lifecycle event emitted by the polling engine for one worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Job finished successfully.
    Complete { job_id: JobId },

    /// The executor returned an error. Retry policy belongs to the queue
    /// layer, not to the dispatch engine.
    ExecutionError { job_id: JobId, error: String },

    /// Job exceeded its time budget. The queue layer signals the job's
    /// cancellation token before emitting this event.
    Timeout { job_id: JobId },
}

impl WorkerEvent {
    /// Job the event refers to.
    pub fn job_id(&self) -> &JobId {
        match self {
            Self::Complete { job_id }
            | Self::ExecutionError { job_id, .. }
            | Self::Timeout { job_id } => job_id,
        }
    }
}

/// Handle to a worker registered against a polling queue.
pub trait WorkerHandle: Send + Sync {
    /// Instance id assigned to this registration.
    fn id(&self) -> Uuid;

    /// Subscribe to lifecycle events for jobs executed by this worker.
    ///
    /// Every live subscriber sees each event at least once.
    fn events(&self) -> broadcast::Receiver<WorkerEvent>;

    /// Stop polling. Idempotent.
    fn shutdown(&self);
}

/// Narrow contract to the external queue/polling engine.
///
/// Implementations own polling, claiming, retry and abandonment policy; the
/// dispatch engine only supplies the work function and observes events.
pub trait PollingQueue {
    type Handle: WorkerHandle;

    /// Register a polling worker under the given worker-type identifier.
    fn register_worker(
        &self,
        worker_type: &str,
        work_fn: WorkFn,
        options: WorkerOptions,
    ) -> Result<Self::Handle>;
}
