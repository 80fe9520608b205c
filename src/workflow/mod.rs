pub mod costing_flow;
pub mod form_plan;
pub mod job_ctx;

pub use costing_flow::{CostingFlow, FillStats};
pub use form_plan::{FormPlan, FormSection};
pub use job_ctx::JobCtx;
