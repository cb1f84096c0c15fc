//! Export type definitions for the demo worker.

use std::time::Duration;

use conveyor_core::{ConveyorConfig, ConveyorError, Executor, ExportType, JobType};
use serde_json::json;

/// Printable PDF report generation (queued, long-running).
pub struct PdfExport;

impl ExportType for PdfExport {
    fn job_type(&self) -> JobType {
        JobType::new("printable_pdf")
    }

    fn build_executor(&self, config: &ConveyorConfig) -> Executor {
        let server_name = config.server.name.clone();

        Executor::queued(move |job_id, payload, token| {
            let server_name = server_name.clone();
            async move {
                tracing::info!(job_id = %job_id, "Rendering PDF report");

                // Simulated chunked rendering; abort between pages when the
                // queue layer signals cancellation.
                for page in 1..=5 {
                    if token.is_cancelled() {
                        tracing::warn!(job_id = %job_id, page, "PDF render cancelled");
                        return Err(ConveyorError::Execution("render cancelled".to_string()));
                    }
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    tracing::debug!(job_id = %job_id, page, "Rendered page");
                }

                Ok(json!({
                    "status": "ok",
                    "content_type": "application/pdf",
                    "rendered_by": server_name,
                    "title": payload.get("title").cloned(),
                }))
            }
        })
    }
}

/// CSV export of search results (queued).
pub struct CsvExport;

impl ExportType for CsvExport {
    fn job_type(&self) -> JobType {
        JobType::new("csv")
    }

    fn build_executor(&self, _config: &ConveyorConfig) -> Executor {
        Executor::queued(|job_id, payload, _token| async move {
            let rows = payload.get("rows").and_then(|r| r.as_u64()).unwrap_or(0);
            tracing::info!(job_id = %job_id, rows, "Exporting CSV");
            tokio::time::sleep(Duration::from_millis(50)).await;

            Ok(json!({
                "status": "ok",
                "content_type": "text/csv",
                "rows": rows,
            }))
        })
    }
}

/// CSV export executed inline with the originating request, reusing the
/// job-type logic without persistence.
pub struct CsvImmediateExport;

impl ExportType for CsvImmediateExport {
    fn job_type(&self) -> JobType {
        JobType::new("csv_immediate")
    }

    fn build_executor(&self, _config: &ConveyorConfig) -> Executor {
        Executor::immediate(|payload, request| async move {
            let user = request.user.unwrap_or_else(|| "anonymous".to_string());
            tracing::info!(user = %user, "Inline CSV export");

            Ok(json!({
                "status": "ok",
                "content_type": "text/csv",
                "requested_by": user,
                "rows": payload.get("rows").cloned(),
            }))
        })
    }
}

/// All export types shipped with the demo worker.
pub fn export_types() -> Vec<Box<dyn ExportType>> {
    vec![
        Box::new(PdfExport),
        Box::new(CsvExport),
        Box::new(CsvImmediateExport),
    ]
}
