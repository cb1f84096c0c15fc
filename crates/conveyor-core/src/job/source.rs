use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier distinguishing a category of asynchronous work.
///
/// Immutable once assigned to an executor; all routing happens through it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobType(String);

impl JobType {
    /// Create a job type from its identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for JobType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Durable identifier of a queued job. Assigned and owned by the queue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a job id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Opaque job input record. Its shape belongs to the executor.
pub type JobPayload = serde_json::Value;

/// Opaque result record produced by an executor.
pub type JobOutcome = serde_json::Value;

/// A unit of work handed to the dispatcher.
///
/// Jobs claimed from the persistent queue carry a durable id; an absent id
/// marks a one-off immediate invocation. The dispatcher only reads the
/// source and does not retain it past the single invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSource {
    /// Durable job id; absent for immediate invocations.
    pub id: Option<JobId>,

    /// Job type the payload belongs to.
    pub job_type: JobType,

    /// Opaque payload record.
    pub payload: JobPayload,
}

impl JobSource {
    /// A job claimed from the persistent queue.
    pub fn queued(
        id: impl Into<JobId>,
        job_type: impl Into<JobType>,
        payload: JobPayload,
    ) -> Self {
        Self {
            id: Some(id.into()),
            job_type: job_type.into(),
            payload,
        }
    }

    /// A one-off invocation reusing job-type logic without persistence.
    pub fn immediate(job_type: impl Into<JobType>, payload: JobPayload) -> Self {
        Self {
            id: None,
            job_type: job_type.into(),
            payload,
        }
    }

    /// Whether this source was claimed from the persistent queue.
    pub fn is_queued(&self) -> bool {
        self.id.is_some()
    }
}
