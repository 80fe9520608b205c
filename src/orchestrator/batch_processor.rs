//! Batch orchestrator
//!
//! Runs jobs in waves of at most `chunk_size`. Jobs inside a wave run
//! concurrently, each on its own spawned task; the next wave starts only
//! when the whole wave is done. Results keep submission order.
//!
//! Reporting: no success means a total-failure response and no
//! notification. Otherwise one notification lists every success, and the
//! response lists failures next to them.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::error::{AppResult, BatchError};
use crate::models::{BatchResponse, BatchResult, FailureEntry, JobPayload, JobResult, SingleJobResponse, SuccessEntry};
use crate::orchestrator::job_runner::JobExecutor;
use crate::services::failure_writer::FailureWriter;
use crate::services::notification::{render_transcript, NotificationSender, NotificationSummary};
use crate::workflow::JobCtx;
use crate::utils::logging::{log_jobs_loaded, log_wave_complete, log_wave_start, print_final_stats};

/// Wave sizes for `total` jobs: `chunk_sizes(7, 3) == [3, 3, 1]`
pub fn chunk_sizes(total: usize, chunk_size: usize) -> Vec<usize> {
    let chunk_size = chunk_size.max(1);
    (0..total)
        .step_by(chunk_size)
        .map(|start| chunk_size.min(total - start))
        .collect()
}

pub struct BatchOrchestrator {
    executor: Arc<dyn JobExecutor>,
    notifier: Arc<dyn NotificationSender>,
    failure_writer: Option<FailureWriter>,
    chunk_size: usize,
    output_log_file: String,
}

impl BatchOrchestrator {
    pub fn new(executor: Arc<dyn JobExecutor>, notifier: Arc<dyn NotificationSender>, chunk_size: usize) -> Self {
        Self {
            executor,
            notifier,
            failure_writer: None,
            chunk_size: chunk_size.max(1),
            output_log_file: String::new(),
        }
    }

    pub fn with_failure_writer(mut self, writer: FailureWriter) -> Self {
        self.failure_writer = Some(writer);
        self
    }

    pub fn with_output_log(mut self, path: impl Into<String>) -> Self {
        self.output_log_file = path.into();
        self
    }

    /// Run every payload; output has the same length and order as input
    pub async fn run(&self, payloads: Vec<JobPayload>) -> BatchResult {
        let total = payloads.len();
        let waves = chunk_sizes(total, self.chunk_size);
        log_jobs_loaded(total, self.chunk_size);

        let mut results = Vec::with_capacity(total);
        let mut pending = payloads.into_iter().enumerate();

        for (wave_index, size) in waves.iter().enumerate() {
            let start = results.len();
            log_wave_start(wave_index + 1, waves.len(), start + 1, start + size, total);

            let mut inputs = Vec::with_capacity(*size);
            let mut handles = Vec::with_capacity(*size);
            for (position, payload) in pending.by_ref().take(*size) {
                let executor = Arc::clone(&self.executor);
                let job = payload.clone();
                handles.push(tokio::spawn(async move { executor.execute(job, position).await }));
                inputs.push((position, payload));
            }

            let mut wave_success = 0;
            for ((position, payload), joined) in inputs.into_iter().zip(join_all(handles).await) {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        error!("{} ❌ Task aborted: {}", JobCtx::for_payload(&payload, position), e);
                        JobResult::failure(payload, format!("job task aborted: {}", e))
                    }
                };
                if result.is_success() {
                    wave_success += 1;
                }
                results.push(result);
            }

            log_wave_complete(wave_index + 1, wave_success, *size);
        }

        let batch = BatchResult { results };
        let succeeded = batch.success_count();
        print_final_stats(succeeded, total - succeeded, total, &self.output_log_file);
        batch
    }

    /// Build the response, write the failure ledger and send the one
    /// notification. Errors only when nothing succeeded.
    pub async fn report(&self, batch: &BatchResult) -> AppResult<BatchResponse> {
        let failures = batch.failures();
        self.record_failures(&failures);

        if batch.success_count() == 0 {
            warn!("❌ All {} jobs failed, no notification sent", batch.len());
            return Err(BatchError::TotalFailure { total: batch.len() }.into());
        }

        let successes = batch.successes();
        let recipient = batch.results.iter().find_map(|r| match r {
            JobResult::Success { payload, .. } => payload.sender_email.clone(),
            JobResult::Failure { .. } => None,
        });
        self.notify(recipient.as_deref(), NotificationSummary::for_batch(successes.clone()))
            .await;

        if !failures.is_empty() {
            warn!("⚠️ Partial success: {} succeeded, {} failed", successes.len(), failures.len());
        }
        Ok(BatchResponse::completed(successes, failures))
    }

    /// Run and report; the response is always well formed
    pub async fn process(&self, payloads: Vec<JobPayload>) -> BatchResponse {
        let batch = self.run(payloads).await;
        match self.report(&batch).await {
            Ok(response) => response,
            Err(e) => BatchResponse::total_failure(e.to_string(), batch.failures()),
        }
    }

    /// Single-job path: run, then notify the job's sender
    pub async fn process_single(&self, payload: JobPayload) -> SingleJobResponse {
        let executor = Arc::clone(&self.executor);
        let job = payload.clone();
        let result = match tokio::spawn(async move { executor.execute(job, 0).await }).await {
            Ok(result) => result,
            Err(e) => {
                error!("{} ❌ Task aborted: {}", JobCtx::for_payload(&payload, 0), e);
                JobResult::failure(payload, format!("job task aborted: {}", e))
            }
        };
        let batch = BatchResult { results: vec![result] };
        self.record_failures(&batch.failures());

        let Some(entry) = batch.successes().into_iter().next() else {
            let error = batch
                .failures()
                .into_iter()
                .next()
                .map(|f| f.error)
                .unwrap_or_else(|| "job failed".to_string());
            return SingleJobResponse::failed(error);
        };

        let recipient = batch.results[0].payload().sender_email.clone();
        let SuccessEntry {
            cost_summary,
            filled_fields,
            ..
        } = entry.clone();

        if let Some(to) = recipient.as_deref() {
            let summary = NotificationSummary::for_job(entry);
            if let Err(e) = self.notifier.send(to, &summary, &render_transcript(&summary)).await {
                error!("❌ Notification to {} failed: {}", to, e);
                return SingleJobResponse::failed(format!("costing completed but notification failed: {}", e));
            }
        } else {
            warn!("⚠️ No sender email on the payload, notification skipped");
        }

        SingleJobResponse::ok(cost_summary, filled_fields)
    }

    async fn notify(&self, recipient: Option<&str>, summary: NotificationSummary) {
        let Some(to) = recipient else {
            warn!("⚠️ No successful job carries a sender email, notification skipped");
            return;
        };
        let transcript = render_transcript(&summary);
        match self.notifier.send(to, &summary, &transcript).await {
            Ok(()) => info!("📧 Batch summary sent to {} ({} entries)", to, summary.entries.len()),
            Err(e) => error!("❌ Batch notification to {} failed: {}", to, e),
        }
    }

    fn record_failures(&self, failures: &[FailureEntry]) {
        if let Some(writer) = &self.failure_writer {
            if let Err(e) = writer.write(failures) {
                warn!("⚠️ Cannot write failure ledger {}: {}", writer.path(), e);
            }
        }
    }
}
