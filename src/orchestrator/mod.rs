//! Orchestration layer
//!
//! ```text
//! app (config → parts, submission → response)
//!     ↓
//! batch_processor (waves of jobs, reporting, notification)
//!     ↓
//! job_runner (one payload, one session)
//!     ↓
//! workflow::CostingFlow
//! ```

pub mod app;
pub mod batch_processor;
pub mod job_runner;

pub use app::{build_resolver, App, Response};
pub use batch_processor::{chunk_sizes, BatchOrchestrator};
pub use job_runner::{JobExecutor, JobRunner};
