pub mod cost;
pub mod loader;
pub mod payload;
pub mod result;

pub use cost::CostSummary;
pub use loader::{load_submission, parse_batch_submission, parse_submission, Submission};
pub use payload::{CostOverride, JobPayload};
pub use result::{
    BatchResponse, BatchResult, FailureEntry, FilledFields, JobOutcome, JobResult,
    SingleJobResponse, SuccessEntry,
};
