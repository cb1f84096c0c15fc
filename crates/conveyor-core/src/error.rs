use thiserror::Error;

use crate::job::{JobId, JobType};

/// Core error type for conveyor operations.
#[derive(Error, Debug)]
pub enum ConveyorError {
    /// No executor is registered for the job's type. Fatal for that single
    /// job; usually configuration drift between enqueued jobs and the
    /// currently registered export types.
    #[error(
        "No executor registered for job type '{}' (job: {})",
        .job_type,
        .job_id.as_ref().map(JobId::as_str).unwrap_or("immediate")
    )]
    UnknownJobType {
        job_type: JobType,
        job_id: Option<JobId>,
    },

    /// Two export-type definitions claimed the same job type. Raised at
    /// registry build time; must prevent worker registration.
    #[error("Job type '{0}' is registered more than once")]
    DuplicateJobType(JobType),

    /// The registered executor does not support the calling convention the
    /// invocation asked for.
    #[error("Executor for job type '{job_type}' does not support the {requested} calling convention")]
    ConventionMismatch {
        job_type: JobType,
        requested: &'static str,
    },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ConveyorError {
    fn from(e: serde_json::Error) -> Self {
        ConveyorError::Serialization(e.to_string())
    }
}

/// Result type alias using ConveyorError.
pub type Result<T> = std::result::Result<T, ConveyorError>;
