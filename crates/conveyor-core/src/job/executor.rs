use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::error::Result;

use super::context::RequestContext;
use super::source::{JobId, JobOutcome, JobPayload};

/// Boxed future returned by executor invocations.
pub type ExecuteFuture = Pin<Box<dyn Future<Output = Result<JobOutcome>> + Send>>;

/// Executor for jobs claimed from the persistent queue.
pub type QueuedExecuteFn =
    Arc<dyn Fn(JobId, JobPayload, CancellationToken) -> ExecuteFuture + Send + Sync>;

/// Executor for immediate one-off invocations.
pub type ImmediateExecuteFn =
    Arc<dyn Fn(JobPayload, RequestContext) -> ExecuteFuture + Send + Sync>;

/// The work function registered for one job type.
///
/// The two variants share the job-type namespace but differ in calling
/// convention: queued executors receive the durable job id and a
/// cancellation token, immediate executors the originating request context
/// and no cancellation support.
#[derive(Clone)]
pub enum Executor {
    /// Invoked for jobs claimed from the persistent queue.
    Queued(QueuedExecuteFn),

    /// Invoked for synchronous one-off requests without persistence.
    Immediate(ImmediateExecuteFn),
}

impl Executor {
    /// Wrap an async closure as a queued executor.
    pub fn queued<F, Fut>(f: F) -> Self
    where
        F: Fn(JobId, JobPayload, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JobOutcome>> + Send + 'static,
    {
        Self::Queued(Arc::new(move |id, payload, token| {
            Box::pin(f(id, payload, token))
        }))
    }

    /// Wrap an async closure as an immediate executor.
    pub fn immediate<F, Fut>(f: F) -> Self
    where
        F: Fn(JobPayload, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<JobOutcome>> + Send + 'static,
    {
        Self::Immediate(Arc::new(move |payload, request| {
            Box::pin(f(payload, request))
        }))
    }

    /// Name of this executor's calling convention.
    pub fn convention(&self) -> &'static str {
        match self {
            Self::Queued(_) => "queued",
            Self::Immediate(_) => "immediate",
        }
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued(_) => f.write_str("Executor::Queued"),
            Self::Immediate(_) => f.write_str("Executor::Immediate"),
        }
    }
}
