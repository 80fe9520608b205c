//! Costing flow - one job from login to cost summary
//!
//! Order:
//! 1. log in and click through to a new costing form
//! 2. fill the form section by section
//! 3. reconcile the cost summary
//! 4. echo what the form ended up holding
//!
//! Only navigation can fail the job. Field problems are soft and an invalid
//! cost summary is returned as best effort.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use crate::config::{Config, Credentials, TargetConfig};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Locator, UiSurface};
use crate::models::{FilledFields, JobOutcome, JobPayload};
use crate::resolver::{input_instruction, SemanticResolver};
use crate::services::cost_extraction::CostExtractionReconciler;
use crate::services::field_transaction::FieldStatus;
use crate::services::step_runner::StepRunner;
use crate::workflow::form_plan::{FormPlan, ECHO_FIELDS};
use crate::workflow::job_ctx::JobCtx;

const SCROLL_TO_BOTTOM: &str = r#"
    (() => {
        window.scrollTo(0, document.body.scrollHeight);
        document.querySelectorAll('*').forEach((el) => {
            if (el.scrollHeight > el.clientHeight + 20) {
                const overflow = getComputedStyle(el).overflowY;
                if (overflow === 'auto' || overflow === 'scroll') el.scrollTop = el.scrollHeight;
            }
        });
        return { value: null };
    })()
"#;

/// Tally of field outcomes for one form pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FillStats {
    pub confirmed: usize,
    pub unconfirmed: usize,
    pub unresolved: usize,
}

impl FillStats {
    fn record(&mut self, status: &FieldStatus) {
        match status {
            FieldStatus::Confirmed { .. } => self.confirmed += 1,
            FieldStatus::Unconfirmed { .. } => self.unconfirmed += 1,
            FieldStatus::Unresolved { .. } => self.unresolved += 1,
        }
    }
}

pub struct CostingFlow {
    target: TargetConfig,
    credentials: Credentials,
    runner: StepRunner,
    reconciler: CostExtractionReconciler,
    settle: Duration,
}

impl CostingFlow {
    /// Credentials must be present; they are never read anywhere else
    pub fn new(config: &Config, resolver: Arc<dyn SemanticResolver>) -> AppResult<Self> {
        let credentials = config
            .credentials
            .clone()
            .ok_or_else(|| AppError::missing_env("OPERATOR_ID / OPERATOR_SECRET"))?;

        Ok(Self {
            target: config.target.clone(),
            credentials,
            runner: StepRunner::new(config, resolver),
            reconciler: CostExtractionReconciler::new(config.extraction_rounds),
            settle: config.settle(),
        })
    }

    pub async fn run(&self, surface: &dyn UiSurface, payload: &JobPayload, ctx: &JobCtx) -> Result<JobOutcome> {
        self.navigate(surface, ctx).await?;

        let plan = FormPlan::build(payload, &self.target.machine);
        let stats = self.fill_form(surface, &plan, ctx).await;
        info!(
            "{} 📝 Form filled: {} confirmed, {} unconfirmed, {} not found",
            ctx, stats.confirmed, stats.unconfirmed, stats.unresolved
        );

        let report = self.reconciler.reconcile(surface, &self.runner, &plan.repair).await;
        if report.valid {
            info!("{} ✓ Cost summary valid after {} round(s)", ctx, report.rounds);
        } else {
            warn!("{} ⚠️ Returning best-effort cost summary: {:?}", ctx, report.summary);
        }

        let filled_fields = self.echo_fields(surface).await;

        Ok(JobOutcome {
            cost_summary: report.summary,
            filled_fields,
        })
    }

    /// Log in and click through to an empty costing form
    pub async fn navigate(&self, surface: &dyn UiSurface, ctx: &JobCtx) -> Result<()> {
        let target = &self.target;

        surface
            .goto(&target.login_url)
            .await
            .with_context(|| format!("cannot open login page {}", target.login_url))?;
        debug!("{} login page open", ctx);

        surface
            .fill(&Locator::css(&target.user_selector), &self.credentials.operator_id)
            .await
            .context("cannot fill operator id")?;
        surface
            .fill(&Locator::css(&target.password_selector), &self.credentials.secret)
            .await
            .context("cannot fill password")?;
        surface
            .click(&Locator::css(&target.sign_in_selector))
            .await
            .context("cannot click sign in")?;

        surface
            .wait_for_url(&target.dashboard_url)
            .await
            .context("login did not reach the dashboard")?;
        info!("{} 🔐 Logged in", ctx);

        for step in &target.steps {
            match self.runner.resolver().resolve(surface, &step.instruction).await {
                Some(locator) => {
                    surface
                        .click(&locator)
                        .await
                        .with_context(|| format!("navigation click failed: {}", step.instruction))?;
                    debug!("{} ✓ {}", ctx, step.instruction);
                }
                None if step.optional => {
                    debug!("{} optional step not found, continuing: {}", ctx, step.instruction);
                }
                None => bail!("navigation step not found: {}", step.instruction),
            }
            tokio::time::sleep(Duration::from_millis(step.wait_ms).max(self.settle)).await;
        }

        info!("{} 🧭 Costing form open", ctx);
        Ok(())
    }

    async fn fill_form(&self, surface: &dyn UiSurface, plan: &FormPlan, ctx: &JobCtx) -> FillStats {
        let mut stats = FillStats::default();

        for section in &plan.sections {
            info!("{} 📋 {}", ctx, section.title);
            if section.scroll_first {
                if let Err(e) = surface.eval(SCROLL_TO_BOTTOM.to_string()).await {
                    debug!("{} scroll failed: {}", ctx, e);
                }
                tokio::time::sleep(self.settle).await;
            }

            for step in &section.steps {
                let status = self.runner.run(surface, step).await;
                if !status.is_confirmed() {
                    warn!("{} ⚠️ '{}' may not hold the intended value", ctx, step.label());
                }
                stats.record(&status);
            }
        }

        stats
    }

    /// Current value of every known field; unresolvable labels are omitted
    async fn echo_fields(&self, surface: &dyn UiSurface) -> FilledFields {
        let mut filled = FilledFields::new();
        for label in ECHO_FIELDS {
            let Some(locator) = self.runner.resolver().resolve(surface, &input_instruction(label)).await else {
                continue;
            };
            match surface.read_value(&locator).await {
                Ok(value) => {
                    filled.insert(label.to_string(), value.unwrap_or_default());
                }
                Err(e) => debug!("cannot read back '{}': {}", label, e),
            }
        }
        filled
    }
}
