use std::sync::Arc;

use conveyor_core::{
    CancellationToken, ConveyorError, Executor, JobOutcome, JobSource, RequestContext, Result,
};

use crate::registry::ExecutorRegistry;

/// Arguments supplied alongside a [`JobSource`], fixing the calling
/// convention for one invocation.
///
/// A sum type rather than variadic extras, so the branch on job identity is
/// checked exhaustively at compile time.
pub enum Invocation {
    /// Claimed from the persistent queue; cancellation is threaded through.
    Queued(CancellationToken),

    /// One-off request execution. No cancellation support on this path.
    Immediate(RequestContext),
}

/// Resolves and invokes the correct executor for each claimed or immediate
/// job.
///
/// Holds no per-job mutable state, only the read-only registry; a single
/// dispatcher is safe to invoke concurrently for distinct jobs.
#[derive(Clone)]
pub struct WorkerDispatcher {
    registry: Arc<ExecutorRegistry>,
}

impl WorkerDispatcher {
    /// Create a dispatcher over a fully built registry.
    pub fn new(registry: Arc<ExecutorRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch one job with the matching calling convention.
    ///
    /// Executor failures propagate unchanged; retry and backoff belong to
    /// the queue layer. The only failure produced here is the
    /// unknown-job-type case, which carries the job id for diagnostics and
    /// signals configuration drift (e.g. stale jobs claimed after their
    /// export type was removed), plus the queued/immediate mismatch guard.
    pub async fn dispatch(&self, job: JobSource, invocation: Invocation) -> Result<JobOutcome> {
        let JobSource {
            id,
            job_type,
            payload,
        } = job;

        let executor = match self.registry.resolve(&job_type) {
            Ok(executor) => executor,
            Err(ConveyorError::UnknownJobType { job_type, .. }) => {
                return Err(ConveyorError::UnknownJobType {
                    job_type,
                    job_id: id,
                });
            }
            Err(other) => return Err(other),
        };

        match (id, invocation) {
            (Some(job_id), Invocation::Queued(token)) => match executor {
                Executor::Queued(execute) => {
                    tracing::debug!(job_id = %job_id, job_type = %job_type, "Dispatching queued job");
                    execute(job_id, payload, token).await
                }
                Executor::Immediate(_) => Err(ConveyorError::ConventionMismatch {
                    job_type,
                    requested: "queued",
                }),
            },
            (None, Invocation::Immediate(request)) => match executor {
                Executor::Immediate(execute) => {
                    tracing::debug!(job_type = %job_type, "Dispatching immediate job");
                    execute(payload, request).await
                }
                Executor::Queued(_) => Err(ConveyorError::ConventionMismatch {
                    job_type,
                    requested: "immediate",
                }),
            },
            // A job identity and the invocation arguments must agree.
            (Some(_), Invocation::Immediate(_)) => Err(ConveyorError::ConventionMismatch {
                job_type,
                requested: "immediate",
            }),
            (None, Invocation::Queued(_)) => Err(ConveyorError::ConventionMismatch {
                job_type,
                requested: "queued",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_core::{ConveyorConfig, ExportType, JobId, JobType};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records which convention each invocation used.
    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        Queued(JobId),
        Immediate(Option<String>),
    }

    struct RecordingExport {
        job_type: &'static str,
        queued: bool,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl ExportType for RecordingExport {
        fn job_type(&self) -> JobType {
            JobType::new(self.job_type)
        }

        fn build_executor(&self, _config: &ConveyorConfig) -> Executor {
            let seen = self.seen.clone();
            if self.queued {
                Executor::queued(move |id, _payload, _token| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(Seen::Queued(id));
                        Ok(json!({ "status": "ok" }))
                    }
                })
            } else {
                Executor::immediate(move |_payload, request| {
                    let seen = seen.clone();
                    async move {
                        seen.lock().unwrap().push(Seen::Immediate(request.user));
                        Ok(json!({ "status": "ok" }))
                    }
                })
            }
        }
    }

    fn dispatcher_with(
        exports: Vec<Box<dyn ExportType>>,
    ) -> WorkerDispatcher {
        let registry =
            ExecutorRegistry::build(&ConveyorConfig::default(), &exports).unwrap();
        WorkerDispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_present_id_uses_queued_convention() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher_with(vec![Box::new(RecordingExport {
            job_type: "report-pdf",
            queued: true,
            seen: seen.clone(),
        })]);

        let outcome = dispatcher
            .dispatch(
                JobSource::queued("job-1", "report-pdf", json!({"title": "q3"})),
                Invocation::Queued(CancellationToken::new()),
            )
            .await
            .unwrap();

        assert_eq!(outcome, json!({ "status": "ok" }));
        assert_eq!(*seen.lock().unwrap(), vec![Seen::Queued(JobId::new("job-1"))]);
    }

    #[tokio::test]
    async fn test_absent_id_uses_immediate_convention() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher_with(vec![Box::new(RecordingExport {
            job_type: "report-csv",
            queued: false,
            seen: seen.clone(),
        })]);

        dispatcher
            .dispatch(
                JobSource::immediate("report-csv", json!({})),
                Invocation::Immediate(RequestContext::new().with_user("analyst")),
            )
            .await
            .unwrap();

        // No job identity reaches the immediate executor.
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Seen::Immediate(Some("analyst".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_unknown_job_type_carries_job_id() {
        let dispatcher = dispatcher_with(vec![]);

        let err = dispatcher
            .dispatch(
                JobSource::queued("job-2", "unknown-type", json!({})),
                Invocation::Queued(CancellationToken::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ConveyorError::UnknownJobType { job_type, job_id: Some(id) }
                if job_type.as_str() == "unknown-type" && id.as_str() == "job-2"
        ));
    }

    #[tokio::test]
    async fn test_queued_job_rejected_by_immediate_executor() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher_with(vec![Box::new(RecordingExport {
            job_type: "report-csv",
            queued: false,
            seen: seen.clone(),
        })]);

        let err = dispatcher
            .dispatch(
                JobSource::queued("job-3", "report-csv", json!({})),
                Invocation::Queued(CancellationToken::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ConveyorError::ConventionMismatch { .. }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_id_and_invocation_must_agree() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher_with(vec![Box::new(RecordingExport {
            job_type: "report-pdf",
            queued: true,
            seen: seen.clone(),
        })]);

        let err = dispatcher
            .dispatch(
                JobSource::queued("job-4", "report-pdf", json!({})),
                Invocation::Immediate(RequestContext::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ConveyorError::ConventionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_executor_errors_propagate_unchanged() {
        struct FailingExport;

        impl ExportType for FailingExport {
            fn job_type(&self) -> JobType {
                JobType::new("flaky")
            }

            fn build_executor(&self, _config: &ConveyorConfig) -> Executor {
                Executor::queued(|_, _, _| async {
                    Err(ConveyorError::Execution("render crashed".to_string()))
                })
            }
        }

        let dispatcher = dispatcher_with(vec![Box::new(FailingExport)]);

        let err = dispatcher
            .dispatch(
                JobSource::queued("job-5", "flaky", json!({})),
                Invocation::Queued(CancellationToken::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ConveyorError::Execution(msg) if msg == "render crashed"));
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_is_independent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = dispatcher_with(vec![Box::new(RecordingExport {
            job_type: "report-pdf",
            queued: true,
            seen: seen.clone(),
        })]);

        let dispatches = (0..8).map(|i| {
            let dispatcher = dispatcher.clone();
            async move {
                dispatcher
                    .dispatch(
                        JobSource::queued(format!("job-{i}"), "report-pdf", json!({})),
                        Invocation::Queued(CancellationToken::new()),
                    )
                    .await
            }
        });

        let outcomes = futures::future::join_all(dispatches).await;
        assert_eq!(outcomes.len(), 8);
        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert_eq!(seen.lock().unwrap().len(), 8);
    }
}
