pub mod cost_extraction;
pub mod failure_writer;
pub mod field_transaction;
pub mod notification;
pub mod sanitize;
pub mod selection;
pub mod step_runner;

pub use cost_extraction::{CostExtractionReconciler, ExtractionReport, ExtractionStrategy, RepairPlan};
pub use failure_writer::FailureWriter;
pub use field_transaction::{FieldInteraction, FieldSpec, FieldStatus, FieldTransaction, ValueKind, VerificationOutcome};
pub use notification::{render_transcript, NotificationSender, NotificationSummary, RelayNotifier};
pub use sanitize::sanitize_numeric;
pub use selection::{selection_confirmed, SelectionProbe, SelectionTrigger};
pub use step_runner::{FormStep, SelectionSpec, StepRunner};
