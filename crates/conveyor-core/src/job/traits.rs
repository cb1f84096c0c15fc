use crate::config::ConveyorConfig;

use super::executor::Executor;
use super::source::JobType;

/// One kind of asynchronous export work.
///
/// Implementations describe a job type and how to produce its executor.
/// They are registered once at startup and read-only thereafter; the
/// registry invokes [`build_executor`](ExportType::build_executor) exactly
/// once per definition, passing the shared server configuration, to obtain
/// the bound executor closure.
pub trait ExportType: Send + Sync {
    /// Job type identifier this export type claims.
    fn job_type(&self) -> JobType;

    /// Produce the executor bound to server-wide configuration.
    fn build_executor(&self, config: &ConveyorConfig) -> Executor;
}
