//! Application wiring
//!
//! Builds the resolver chain, session factory, costing flow and notifier
//! from `Config`, then runs a submission through the orchestrator.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::browser::{ChromeSessionFactory, SessionFactory};
use crate::config::Config;
use crate::models::{BatchResponse, SingleJobResponse, Submission};
use crate::orchestrator::batch_processor::BatchOrchestrator;
use crate::orchestrator::job_runner::{JobExecutor, JobRunner};
use crate::resolver::{LabelResolver, LlmResolver, ResolverChain, SemanticResolver};
use crate::services::failure_writer::FailureWriter;
use crate::services::notification::{sender_from_config, NotificationSender};
use crate::utils::logging::{init_log_file, log_startup};
use crate::workflow::CostingFlow;

/// What the caller gets back, single or batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Single(SingleJobResponse),
    Batch(BatchResponse),
}

impl Response {
    pub fn is_success(&self) -> bool {
        match self {
            Response::Single(r) => r.success,
            Response::Batch(r) => r.success,
        }
    }
}

/// DOM label lookup first, the LLM resolver after it when enabled
pub fn build_resolver(config: &Config) -> Arc<dyn SemanticResolver> {
    let mut chain = ResolverChain::new().with(Arc::new(LabelResolver::new()));
    if config.use_llm_resolver {
        chain = chain.with(Arc::new(LlmResolver::new(config)));
    }
    info!("🔎 Resolver chain: {} backend(s)", chain.len());
    Arc::new(chain)
}

pub struct App {
    orchestrator: BatchOrchestrator,
}

impl App {
    pub fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(config.max_concurrent_jobs);

        let flow = Arc::new(CostingFlow::new(&config, build_resolver(&config))?);
        let sessions: Arc<dyn SessionFactory> = Arc::new(ChromeSessionFactory::new(&config));
        let executor: Arc<dyn JobExecutor> = Arc::new(JobRunner::new(sessions, flow));
        let notifier: Arc<dyn NotificationSender> = Arc::from(sender_from_config(&config));

        Ok(Self::with_parts(&config, executor, notifier))
    }

    /// Wire an app from ready-made parts
    pub fn with_parts(config: &Config, executor: Arc<dyn JobExecutor>, notifier: Arc<dyn NotificationSender>) -> Self {
        let orchestrator = BatchOrchestrator::new(executor, notifier, config.max_concurrent_jobs)
            .with_failure_writer(FailureWriter::new(config.failure_log_file.clone()))
            .with_output_log(config.output_log_file.clone());
        Self { orchestrator }
    }

    pub async fn run(&self, submission: Submission) -> Response {
        match submission {
            Submission::Single(payload) => Response::Single(self.orchestrator.process_single(payload).await),
            Submission::Batch(payloads) => Response::Batch(self.orchestrator.process(payloads).await),
        }
    }
}
