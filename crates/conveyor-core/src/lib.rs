pub mod cancel;
pub mod config;
pub mod error;
pub mod job;
pub mod queue;

pub use cancel::CancellationToken;
pub use config::{ConveyorConfig, QueueConfig, ServerConfig};
pub use error::{ConveyorError, Result};
pub use job::{
    ExecuteFuture, Executor, ExportType, ImmediateExecuteFn, JobId, JobOutcome, JobPayload,
    JobSource, JobType, QueuedExecuteFn, RequestContext,
};
pub use queue::{PollingQueue, WorkFn, WorkerEvent, WorkerHandle, WorkerIdentity, WorkerOptions};
