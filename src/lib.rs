//! # Costing Automation
//!
//! Drives a UI-only costing application: fills the costing form for each
//! submitted spec sheet, reads the derived costs back and reports them.
//!
//! ## Layers
//!
//! ### ① Infrastructure
//! - `infrastructure/` - owns the page, exposes capabilities only
//! - `UiSurface` - the page capability trait; `JsExecutor` implements it
//! - `browser/` - one exclusive headless browser session per job
//!
//! ### ② Services
//! - `resolver/` - natural-language instruction → element
//! - `services/field_transaction` - write, read back, retry
//! - `services/selection` - searchable select verification
//! - `services/cost_extraction` - read → validate → repair rounds
//! - `services/notification`, `services/failure_writer` - reporting
//!
//! ### ③ Workflow
//! - `JobCtx` - which row is being processed
//! - `FormPlan` - payload → ordered form steps
//! - `CostingFlow` - login → fill → extract → echo
//!
//! ### ④ Orchestration
//! - `orchestrator/job_runner` - session lifetime around one flow
//! - `orchestrator/batch_processor` - waves, aggregation, notification
//! - `orchestrator/app` - wiring

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod services;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, UiSurface};
pub use models::{BatchResponse, CostSummary, JobPayload, JobResult, SingleJobResponse, Submission};
pub use orchestrator::{App, BatchOrchestrator, Response};
pub use workflow::{CostingFlow, JobCtx};
