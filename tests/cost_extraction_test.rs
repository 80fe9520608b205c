mod common;

use std::sync::Arc;

use common::{bag_form, fast_config, payload, FakeResolver, FakeSurface};
use costing_automation::models::CostSummary;
use costing_automation::services::cost_extraction::{CostExtractionReconciler, RepairPlan};
use costing_automation::services::step_runner::StepRunner;
use costing_automation::workflow::FormPlan;

const MACHINE: &str = "SOS 12 (1B) 50,000/shift";

fn dimensions_filled(surface: &FakeSurface) {
    surface.set_value("Face Width mm", "120");
    surface.set_value("Bag Length mm", "250");
    surface.set_value("Bags per box", "500");
    surface.set_value("No of Boxes Ordered", "20");
}

#[tokio::test]
async fn repair_round_fixes_blank_dimension_and_material() {
    let surface = FakeSurface::new()
        .with_costs(["£2.35", "40.10", "12.00"])
        .requiring_values(&["Gusset mm", "Face Width mm"])
        .requiring_selections(&["BAG PAPER"]);
    dimensions_filled(&surface);
    surface.set_value("Gusset mm", "");

    let resolver = Arc::new(FakeResolver::knowing(common::form_labels()));
    let runner = StepRunner::new(&fast_config(), resolver);
    let plan = FormPlan::build(&payload(1, bag_form()), MACHINE);

    let report = CostExtractionReconciler::new(3)
        .reconcile(&surface, &runner, &plan.repair)
        .await;

    assert!(report.valid);
    assert_eq!(report.rounds, 2);
    assert_eq!(report.summary, CostSummary::new(2.35, 40.10, 12.00));
    assert_eq!(surface.cost_reads(), 2, "no third read after a valid round");
    assert_eq!(surface.value("Gusset mm").as_deref(), Some("60"));
    assert_eq!(surface.fill_count("Face Width mm"), 0, "non-zero fields are left alone");
    assert!(surface.enter_count("BAG PAPER") >= 1);
}

#[tokio::test]
async fn valid_first_read_returns_without_repair() {
    let surface = FakeSurface::new().with_costs(["1.00", "2.00", "3.00"]);
    let resolver = Arc::new(FakeResolver::knowing(common::form_labels()));
    let runner = StepRunner::new(&fast_config(), resolver);
    let plan = FormPlan::build(&payload(1, bag_form()), MACHINE);

    let report = CostExtractionReconciler::new(3)
        .reconcile(&surface, &runner, &plan.repair)
        .await;

    assert!(report.valid);
    assert_eq!(report.rounds, 1);
    assert_eq!(surface.enter_count("BAG PAPER"), 0);
}

#[tokio::test]
async fn gives_up_after_three_rounds_with_best_effort() {
    // Box type never gets selected because the widget is never found
    let surface = FakeSurface::new()
        .with_costs(["1.00", "2.00", "3.00"])
        .requiring_selections(&["Box Type*"]);
    let resolver = Arc::new(FakeResolver::knowing(["Gusset mm", "BAG PAPER"]));
    let runner = StepRunner::new(&fast_config(), resolver);
    let plan = FormPlan::build(&payload(1, bag_form()), MACHINE);

    let report = CostExtractionReconciler::new(3)
        .reconcile(&surface, &runner, &plan.repair)
        .await;

    assert!(!report.valid);
    assert_eq!(report.rounds, 3);
    assert_eq!(report.summary, CostSummary::default());
    assert_eq!(surface.cost_reads(), 3);
    // repairs ran after rounds 1 and 2 only
    assert_eq!(surface.enter_count("BAG PAPER"), 2);
}

#[tokio::test]
async fn falls_back_to_fixed_output_cells() {
    let surface = FakeSurface::new()
        .with_costs(["£2.35", "40.10", "12.00"])
        .without_labeled_rows();
    let resolver = Arc::new(FakeResolver::knowing(common::form_labels()));
    let runner = StepRunner::new(&fast_config(), resolver);

    let report = CostExtractionReconciler::new(3)
        .reconcile(&surface, &runner, &RepairPlan::default())
        .await;

    assert!(report.valid);
    assert_eq!(report.rounds, 1);
    assert_eq!(report.summary, CostSummary::new(2.35, 40.10, 12.00));
    assert_eq!(surface.slot_reads(), 3);
}

#[tokio::test]
async fn labeled_read_with_a_computed_figure_skips_fixed_cells() {
    let surface = FakeSurface::new().with_costs(["£2.35", "0.00", "0.00"]);

    let summary = CostExtractionReconciler::new(3).read_summary(&surface).await;

    assert_eq!(summary, CostSummary::new(2.35, 0.0, 0.0));
    assert_eq!(surface.cost_reads(), 1);
    assert_eq!(surface.slot_reads(), 0);
}
