//! Cost extraction reconciler
//!
//! The cost table is derived by the target application and may read zero
//! while inputs are still missing or being recalculated. Each round reads
//! the table through an ordered list of strategies; an invalid read triggers
//! a repair pass over the inputs that feed the calculation.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::infrastructure::UiSurface;
use crate::models::cost::{parse_figure, CostSummary};
use crate::resolver::input_instruction;
use crate::services::sanitize::sanitize_numeric;
use crate::services::step_runner::{FormStep, StepRunner};

/// Row labels of the three metrics, in `CostSummary` order
pub const METRIC_LABELS: [&str; 3] = ["Cost £/case", "Total Labour & Sup", "Overhead Cost/job"];

/// Fixed output cells, keyed by metric label
static FIXED_SLOTS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "Cost £/case" => "tdf_153",
    "Total Labour & Sup" => "tdf_137",
    "Overhead Cost/job" => "tdf_142",
};

fn summary_from(raw: [Option<String>; 3]) -> CostSummary {
    let [cost, labour, overhead] = raw.map(|v| parse_figure(&sanitize_numeric(&v.unwrap_or_default())));
    CostSummary::new(cost, labour, overhead)
}

/// One way of reading the cost table
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn read(&self, surface: &dyn UiSurface) -> Result<CostSummary>;
}

/// The cell following the one whose text contains the metric label
pub struct LabeledRowStrategy;

#[async_trait]
impl ExtractionStrategy for LabeledRowStrategy {
    fn name(&self) -> &'static str {
        "labeled row"
    }

    async fn read(&self, surface: &dyn UiSurface) -> Result<CostSummary> {
        let mut raw: [Option<String>; 3] = Default::default();
        for (slot, label) in raw.iter_mut().zip(METRIC_LABELS) {
            *slot = surface.cell_after_label(label).await?;
        }
        Ok(summary_from(raw))
    }
}

/// Known element ids of the output cells
pub struct FixedSlotStrategy;

#[async_trait]
impl ExtractionStrategy for FixedSlotStrategy {
    fn name(&self) -> &'static str {
        "fixed slot"
    }

    async fn read(&self, surface: &dyn UiSurface) -> Result<CostSummary> {
        let mut raw: [Option<String>; 3] = Default::default();
        for (slot, label) in raw.iter_mut().zip(METRIC_LABELS) {
            if let Some(id) = FIXED_SLOTS.get(label) {
                *slot = surface.text_by_id(id).await?;
            }
        }
        Ok(summary_from(raw))
    }
}

/// Inputs re-checked when the cost table reads invalid
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPlan {
    /// Numeric inputs, refilled only when blank or zero
    pub fields: Vec<FormStep>,
    /// Selections, always re-run
    pub selections: Vec<FormStep>,
}

impl RepairPlan {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.selections.is_empty()
    }
}

/// Result of reconciliation; `valid == false` means best effort
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionReport {
    pub summary: CostSummary,
    pub rounds: usize,
    pub valid: bool,
}

pub struct CostExtractionReconciler {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    max_rounds: usize,
}

impl CostExtractionReconciler {
    pub fn new(max_rounds: usize) -> Self {
        Self::with_strategies(vec![Box::new(LabeledRowStrategy), Box::new(FixedSlotStrategy)], max_rounds)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ExtractionStrategy>>, max_rounds: usize) -> Self {
        Self {
            strategies,
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// First strategy that sees any computed figure wins; otherwise the
    /// last read (all zero) stands.
    pub async fn read_summary(&self, surface: &dyn UiSurface) -> CostSummary {
        let mut last = CostSummary::default();
        for strategy in &self.strategies {
            match strategy.read(surface).await {
                Ok(summary) if summary.any_positive() => return summary,
                Ok(summary) => {
                    debug!("{} strategy read nothing computed", strategy.name());
                    last = summary;
                }
                Err(e) => debug!("{} strategy failed: {}", strategy.name(), e),
            }
        }
        last
    }

    pub async fn reconcile(&self, surface: &dyn UiSurface, runner: &StepRunner, plan: &RepairPlan) -> ExtractionReport {
        let mut summary = CostSummary::default();

        for round in 1..=self.max_rounds {
            summary = self.read_summary(surface).await;
            info!(
                "📊 Cost read {}/{}: {:.2} / {:.2} / {:.2}",
                round, self.max_rounds, summary.cost_per_unit, summary.total_labour_cost, summary.overhead_cost_per_job
            );

            if summary.is_valid() {
                return ExtractionReport {
                    summary,
                    rounds: round,
                    valid: true,
                };
            }

            if round < self.max_rounds {
                warn!("⚠️ Cost summary has zero figures, repairing inputs (round {})", round);
                self.repair(surface, runner, plan).await;
            }
        }

        warn!("⚠️ Cost summary still invalid after {} rounds, returning best effort", self.max_rounds);
        ExtractionReport {
            summary,
            rounds: self.max_rounds,
            valid: false,
        }
    }

    async fn repair(&self, surface: &dyn UiSurface, runner: &StepRunner, plan: &RepairPlan) {
        for step in &plan.fields {
            let label = step.label();
            let Some(locator) = runner.resolver().resolve(surface, &input_instruction(label)).await else {
                debug!("repair: '{}' not found", label);
                continue;
            };
            let current = match surface.read_value(&locator).await {
                Ok(value) => value.unwrap_or_default(),
                Err(e) => {
                    debug!("repair: cannot read '{}': {}", label, e);
                    continue;
                }
            };
            if parse_figure(&sanitize_numeric(&current)) > 0.0 {
                continue;
            }
            info!("🔧 '{}' is blank or zero, re-entering", label);
            runner.run(surface, step).await;
        }

        for step in &plan.selections {
            info!("🔧 Re-checking '{}'", step.label());
            runner.run(surface, step).await;
        }

        tokio::time::sleep(runner.settle()).await;
    }
}
