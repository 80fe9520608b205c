//! Job runner - one payload, one session
//!
//! Opens an exclusive session, runs the costing flow, and closes the session
//! whatever happened. Every error ends up as `JobResult::Failure`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, info, info_span, warn, Instrument};

use crate::browser::SessionFactory;
use crate::models::{JobPayload, JobResult};
use crate::workflow::{CostingFlow, JobCtx};

/// Runs one job to a result; never fails
#[async_trait]
pub trait JobExecutor: Send + Sync {
    /// `position` is the job's place in its submission
    async fn execute(&self, payload: JobPayload, position: usize) -> JobResult;
}

pub struct JobRunner {
    sessions: Arc<dyn SessionFactory>,
    flow: Arc<CostingFlow>,
}

impl JobRunner {
    pub fn new(sessions: Arc<dyn SessionFactory>, flow: Arc<CostingFlow>) -> Self {
        Self { sessions, flow }
    }

    async fn run(&self, payload: JobPayload, ctx: JobCtx) -> JobResult {
        info!("{} 🚀 Job started", ctx);

        let session = match self.sessions.open().await {
            Ok(session) => session,
            Err(e) => {
                error!("{} ❌ Cannot open a session: {:#}", ctx, e);
                return JobResult::failure(payload, format!("session unavailable: {:#}", e));
            }
        };

        // A panicking flow still releases its browser
        let outcome = AssertUnwindSafe(self.flow.run(session.surface(), &payload, &ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(anyhow!("job panicked: {}", panic_message(panic.as_ref()))));

        if let Err(e) = session.close().await {
            warn!("{} ⚠️ Session close failed: {:#}", ctx, e);
        }

        match outcome {
            Ok(outcome) => {
                info!("{} ✅ Job finished", ctx);
                JobResult::success(payload, outcome)
            }
            Err(e) => {
                error!("{} ❌ Job failed: {:#}", ctx, e);
                JobResult::failure(payload, format!("{:#}", e))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[async_trait]
impl JobExecutor for JobRunner {
    async fn execute(&self, payload: JobPayload, position: usize) -> JobResult {
        let ctx = JobCtx::for_payload(&payload, position);
        let span = info_span!("job", row = ctx.row_index);
        self.run(payload, ctx).instrument(span).await
    }
}
