use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use conveyor_core::{
    CancellationToken, JobId, JobPayload, JobSource, JobType, PollingQueue, Result, WorkFn,
    WorkerEvent, WorkerHandle, WorkerOptions,
};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

/// A pending job held by the in-memory queue.
#[derive(Debug, Clone)]
struct PendingJob {
    id: JobId,
    job_type: JobType,
    payload: JobPayload,
    enqueued_at: DateTime<Utc>,
}

/// In-memory reference implementation of the [`PollingQueue`] contract.
///
/// Backs tests and demos; a production deployment binds a persistent store
/// behind the same trait. Claimed jobs execute concurrently, each with its
/// own cancellation token. A job exceeding the time budget has its token
/// signalled before the timeout event is emitted, so the executor can exit
/// cleanly.
#[derive(Clone)]
pub struct InMemoryQueue {
    pending: Arc<Mutex<VecDeque<PendingJob>>>,
    job_timeout: Duration,
}

impl InMemoryQueue {
    /// Create a queue with the given per-job time budget.
    pub fn new(job_timeout: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            job_timeout,
        }
    }

    /// Enqueue a job and return its generated durable id.
    pub fn enqueue(&self, job_type: impl Into<JobType>, payload: JobPayload) -> JobId {
        let id = JobId::new(Uuid::new_v4().to_string());
        let job = PendingJob {
            id: id.clone(),
            job_type: job_type.into(),
            payload,
            enqueued_at: Utc::now(),
        };

        self.pending
            .lock()
            .expect("queue state poisoned")
            .push_back(job);

        id
    }

    /// Number of jobs waiting to be claimed.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().expect("queue state poisoned").len()
    }
}

/// Handle to a worker registered against an [`InMemoryQueue`].
pub struct InMemoryWorkerHandle {
    id: Uuid,
    events_tx: broadcast::Sender<WorkerEvent>,
    shutdown_tx: watch::Sender<bool>,
}

impl WorkerHandle for InMemoryWorkerHandle {
    fn id(&self) -> Uuid {
        self.id
    }

    fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events_tx.subscribe()
    }

    fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl PollingQueue for InMemoryQueue {
    type Handle = InMemoryWorkerHandle;

    fn register_worker(
        &self,
        worker_type: &str,
        work_fn: WorkFn,
        options: WorkerOptions,
    ) -> Result<Self::Handle> {
        let worker_id = Uuid::new_v4();
        let (events_tx, _) = broadcast::channel(64);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tracing::info!(
            worker_type,
            worker_id = %worker_id,
            server = %options.identity.name,
            server_id = %options.identity.id,
            "Polling worker registered"
        );

        let pending = self.pending.clone();
        let events = events_tx.clone();
        let job_timeout = self.job_timeout;
        let base_interval = options.poll_interval;
        let error_multiplier = options.interval_error_multiplier.max(1);

        tokio::spawn(async move {
            // Set by execution tasks; the next poll cycle backs off when a
            // claimed job errored, and resets to the base interval after a
            // clean cycle.
            let had_error = Arc::new(AtomicBool::new(false));
            let mut interval = base_interval;

            loop {
                tokio::select! {
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::info!(worker_id = %worker_id, "Polling worker shutting down");
                            break;
                        }
                    }
                    _ = tokio::time::sleep(interval) => {
                        let claimed: Vec<PendingJob> = {
                            let mut pending = pending.lock().expect("queue state poisoned");
                            pending.drain(..).collect()
                        };

                        for job in claimed {
                            let waited = Utc::now().signed_duration_since(job.enqueued_at);
                            tracing::debug!(
                                job_id = %job.id,
                                job_type = %job.job_type,
                                waited_ms = waited.num_milliseconds(),
                                "Claimed job"
                            );

                            let token = CancellationToken::new();
                            let source = JobSource::queued(
                                job.id.clone(),
                                job.job_type.clone(),
                                job.payload.clone(),
                            );
                            let fut = work_fn(source, token.clone());

                            let events = events.clone();
                            let had_error = had_error.clone();
                            let job_id = job.id;

                            tokio::spawn(async move {
                                match tokio::time::timeout(job_timeout, fut).await {
                                    Ok(Ok(_outcome)) => {
                                        let _ = events.send(WorkerEvent::Complete { job_id });
                                    }
                                    Ok(Err(error)) => {
                                        had_error.store(true, Ordering::SeqCst);
                                        let _ = events.send(WorkerEvent::ExecutionError {
                                            job_id,
                                            error: error.to_string(),
                                        });
                                    }
                                    Err(_) => {
                                        // Signal the executor before reporting,
                                        // so it can observe the cancellation.
                                        token.cancel();
                                        let _ = events.send(WorkerEvent::Timeout { job_id });
                                    }
                                }
                            });
                        }

                        interval = if had_error.swap(false, Ordering::SeqCst) {
                            base_interval * error_multiplier
                        } else {
                            base_interval
                        };
                    }
                }
            }
        });

        Ok(InMemoryWorkerHandle {
            id: worker_id,
            events_tx,
            shutdown_tx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conveyor_core::{ConveyorConfig, ConveyorError};
    use serde_json::json;

    fn options(poll_interval_ms: u64) -> WorkerOptions {
        let mut config = ConveyorConfig::default();
        config.queue.poll_interval_ms = poll_interval_ms;
        WorkerOptions::from_config(&config)
    }

    async fn next_event(events: &mut broadcast::Receiver<WorkerEvent>) -> WorkerEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for worker event")
            .expect("event stream closed")
    }

    #[tokio::test]
    async fn test_enqueue_and_pending_len() {
        let queue = InMemoryQueue::new(Duration::from_secs(1));
        assert_eq!(queue.pending_len(), 0);

        let a = queue.enqueue("csv", json!({}));
        let b = queue.enqueue("csv", json!({}));
        assert_eq!(queue.pending_len(), 2);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_claimed_jobs_run_with_their_own_token() {
        let queue = InMemoryQueue::new(Duration::from_secs(5));

        let work_fn: WorkFn = Arc::new(|job, token| {
            Box::pin(async move {
                assert!(job.is_queued());
                assert!(!token.is_cancelled());
                Ok(json!({ "done": true }))
            })
        });

        let handle = queue.register_worker("test", work_fn, options(10)).unwrap();
        let mut events = handle.events();

        let first = queue.enqueue("csv", json!({}));
        let second = queue.enqueue("csv", json!({}));

        let mut completed = vec![
            next_event(&mut events).await.job_id().clone(),
            next_event(&mut events).await.job_id().clone(),
        ];
        completed.sort();

        let mut expected = vec![first, second];
        expected.sort();
        assert_eq!(completed, expected);

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_timeout_cancels_token_before_event() {
        let queue = InMemoryQueue::new(Duration::from_millis(50));
        let cancelled = Arc::new(AtomicBool::new(false));

        let flag = cancelled.clone();
        let work_fn: WorkFn = Arc::new(move |_job, token| {
            let flag = flag.clone();
            Box::pin(async move {
                token.on_cancel(move || {
                    flag.store(true, Ordering::SeqCst);
                });
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(json!({}))
            })
        });

        let handle = queue.register_worker("test", work_fn, options(10)).unwrap();
        let mut events = handle.events();

        let job_id = queue.enqueue("pdf", json!({}));

        match next_event(&mut events).await {
            WorkerEvent::Timeout { job_id: timed_out } => assert_eq!(timed_out, job_id),
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(cancelled.load(Ordering::SeqCst));

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_claiming() {
        let queue = InMemoryQueue::new(Duration::from_secs(1));

        let work_fn: WorkFn = Arc::new(|_job, _token| Box::pin(async { Ok(json!({})) }));
        let handle = queue.register_worker("test", work_fn, options(10)).unwrap();

        handle.shutdown();
        // Give the polling loop time to observe the signal.
        tokio::time::sleep(Duration::from_millis(50)).await;

        queue.enqueue("csv", json!({}));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queue.pending_len(), 1);
    }

    #[tokio::test]
    async fn test_execution_error_still_reports_job_id() {
        let queue = InMemoryQueue::new(Duration::from_secs(1));

        let work_fn: WorkFn = Arc::new(|job, _token| {
            Box::pin(async move {
                let id = job.id.expect("claimed jobs carry an id");
                Err(ConveyorError::Execution(format!("failed for {}", id)))
            })
        });

        let handle = queue.register_worker("test", work_fn, options(10)).unwrap();
        let mut events = handle.events();

        let job_id = queue.enqueue("csv", json!({}));

        match next_event(&mut events).await {
            WorkerEvent::ExecutionError { job_id: failed, error } => {
                assert_eq!(failed, job_id);
                assert!(error.contains(job_id.as_str()));
            }
            other => panic!("expected execution error, got {:?}", other),
        }

        handle.shutdown();
    }
}
