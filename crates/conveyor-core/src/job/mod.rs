mod context;
mod executor;
mod source;
mod traits;

pub use context::RequestContext;
pub use executor::{ExecuteFuture, Executor, ImmediateExecuteFn, QueuedExecuteFn};
pub use source::{JobId, JobOutcome, JobPayload, JobSource, JobType};
pub use traits::ExportType;
