mod common;

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{bag_form, payload, RecordingNotifier};
use costing_automation::error::{AppError, BatchError};
use costing_automation::models::{FilledFields, JobOutcome, JobPayload, JobResult};
use costing_automation::orchestrator::{BatchOrchestrator, JobExecutor};
use costing_automation::CostSummary;

/// Fails the listed rows, panics on the panicking ones, tracks concurrency
#[derive(Default)]
struct ScriptedExecutor {
    failing: HashSet<usize>,
    panicking: HashSet<usize>,
    running: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
    /// (position, jobs finished when it started)
    starts: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedExecutor {
    fn failing(rows: &[usize]) -> Self {
        Self {
            failing: rows.iter().copied().collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl JobExecutor for ScriptedExecutor {
    async fn execute(&self, payload: JobPayload, position: usize) -> JobResult {
        self.starts
            .lock()
            .unwrap()
            .push((position, self.finished.load(Ordering::SeqCst)));
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        if self.panicking.contains(&position) {
            panic!("job {} blew up", position);
        }
        if self.failing.contains(&position) {
            return JobResult::failure(payload, format!("row {} failed", position));
        }
        JobResult::success(
            payload,
            JobOutcome {
                cost_summary: CostSummary::new(2.35, 40.10, 12.00),
                filled_fields: FilledFields::new(),
            },
        )
    }
}

fn payloads(n: usize) -> Vec<JobPayload> {
    (0..n).map(|i| payload(i, bag_form())).collect()
}

fn orchestrator(executor: Arc<ScriptedExecutor>, notifier: Arc<RecordingNotifier>) -> BatchOrchestrator {
    BatchOrchestrator::new(executor, notifier, 3)
}

#[tokio::test]
async fn seven_jobs_run_in_waves_of_three() {
    let executor = Arc::new(ScriptedExecutor::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let batch = orchestrator(executor.clone(), notifier).run(payloads(7)).await;

    assert_eq!(batch.len(), 7);
    let rows: Vec<usize> = batch.results.iter().map(|r| r.payload().row_index.unwrap()).collect();
    assert_eq!(rows, (0..7).collect::<Vec<_>>());
    assert!(executor.peak.load(Ordering::SeqCst) <= 3);

    // a job of wave w only starts once every earlier wave has finished
    for (position, finished_before) in executor.starts.lock().unwrap().iter() {
        assert!(*finished_before >= (position / 3) * 3, "job {} started early", position);
    }
}

#[tokio::test]
async fn all_failures_is_an_error_without_notification() {
    let executor = Arc::new(ScriptedExecutor::failing(&[0, 1, 2, 3, 4]));
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator = orchestrator(executor, notifier.clone());

    let batch = orchestrator.run(payloads(5)).await;
    let err = tokio_test::assert_err!(orchestrator.report(&batch).await);
    assert!(matches!(err, AppError::Batch(BatchError::TotalFailure { total: 5 })));

    let response = orchestrator.process(payloads(5)).await;
    assert!(!response.success);
    assert!(response.results.is_empty());
    assert_eq!(response.failures.map(|f| f.len()), Some(5));
    assert!(response.error.is_some());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn partial_success_sends_one_notification_with_successes_only() {
    let executor = Arc::new(ScriptedExecutor::failing(&[1, 3]));
    let notifier = Arc::new(RecordingNotifier::default());

    let response = orchestrator(executor, notifier.clone()).process(payloads(5)).await;

    assert!(response.success);
    assert_eq!(response.partial_success, Some(true));
    assert_eq!(
        response.results.iter().map(|r| r.row_index).collect::<Vec<_>>(),
        vec![0, 2, 4]
    );
    let failures = response.failures.unwrap();
    assert_eq!(failures.iter().map(|f| f.row_index).collect::<Vec<_>>(), vec![1, 3]);
    assert_eq!(failures[0].error, "row 1 failed");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "buyer0@example.com");
    assert_eq!(sent[0].1.entries.len(), 3);
}

#[tokio::test]
async fn a_panicking_job_fails_alone() {
    let executor = Arc::new(ScriptedExecutor {
        panicking: [2].into_iter().collect(),
        ..ScriptedExecutor::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());

    let batch = orchestrator(executor, notifier).run(payloads(4)).await;

    assert_eq!(batch.len(), 4);
    assert_eq!(batch.success_count(), 3);
    assert!(!batch.results[2].is_success());
    assert_eq!(batch.results[2].payload().row_index, Some(2));
}

#[tokio::test]
async fn full_success_has_no_partial_report() {
    let executor = Arc::new(ScriptedExecutor::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let response = orchestrator(executor, notifier.clone()).process(payloads(2)).await;

    assert!(response.success);
    assert_eq!(response.partial_success, None);
    assert!(response.failures.is_none());
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn single_job_notifies_its_sender() {
    let executor = Arc::new(ScriptedExecutor::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let response = orchestrator(executor, notifier.clone())
        .process_single(payload(9, bag_form()))
        .await;

    assert!(response.success);
    assert_eq!(response.cost_summary, Some(CostSummary::new(2.35, 40.10, 12.00)));
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "buyer9@example.com");
    assert_eq!(sent[0].1.subject, "Costing Summary for Spec Sheet SS-9");
}

#[tokio::test]
async fn panicking_single_job_is_a_failed_response() {
    let executor = Arc::new(ScriptedExecutor {
        panicking: [0].into_iter().collect(),
        ..ScriptedExecutor::default()
    });
    let notifier = Arc::new(RecordingNotifier::default());

    let response = orchestrator(executor, notifier.clone())
        .process_single(payload(0, bag_form()))
        .await;

    assert!(!response.success);
    let error = response.error.unwrap_or_default();
    assert!(error.starts_with("job task aborted"), "{}", error);
    assert!(response.cost_summary.is_none());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn failed_single_job_reports_its_error() {
    let executor = Arc::new(ScriptedExecutor::failing(&[0]));
    let notifier = Arc::new(RecordingNotifier::default());

    let response = orchestrator(executor, notifier.clone())
        .process_single(payload(0, bag_form()))
        .await;

    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("row 0 failed"));
    assert!(notifier.sent().is_empty());
}
