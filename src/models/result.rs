use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::cost::CostSummary;
use crate::models::payload::JobPayload;

/// Echo of the values the form actually holds after filling
pub type FilledFields = BTreeMap<String, String>;

/// What a successful costing flow produces
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub cost_summary: CostSummary,
    pub filled_fields: FilledFields,
}

/// Result of one job: exactly one of success or failure
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Success {
        payload: JobPayload,
        cost_summary: CostSummary,
        filled_fields: FilledFields,
    },
    Failure {
        payload: JobPayload,
        error: String,
    },
}

impl JobResult {
    pub fn success(payload: JobPayload, outcome: JobOutcome) -> Self {
        JobResult::Success {
            payload,
            cost_summary: outcome.cost_summary,
            filled_fields: outcome.filled_fields,
        }
    }

    pub fn failure(payload: JobPayload, error: impl Into<String>) -> Self {
        JobResult::Failure {
            payload,
            error: error.into(),
        }
    }

    pub fn payload(&self) -> &JobPayload {
        match self {
            JobResult::Success { payload, .. } | JobResult::Failure { payload, .. } => payload,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobResult::Success { .. })
    }
}

/// Ordered results of a batch; same length and order as the submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub results: Vec<JobResult>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Successful entries with the row index used for reporting
    pub fn successes(&self) -> Vec<SuccessEntry> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(position, result)| match result {
                JobResult::Success {
                    payload,
                    cost_summary,
                    filled_fields,
                } => Some(SuccessEntry {
                    row_index: payload.row_index.unwrap_or(position),
                    spec_sheet_id: payload.spec_sheet_id.clone(),
                    tracking_id: payload.tracking_id.clone(),
                    cost_summary: *cost_summary,
                    filled_fields: filled_fields.clone(),
                }),
                JobResult::Failure { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<FailureEntry> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(position, result)| match result {
                JobResult::Failure { payload, error } => Some(FailureEntry {
                    row_index: payload.row_index.unwrap_or(position),
                    error: error.clone(),
                }),
                JobResult::Success { .. } => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEntry {
    pub row_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_sheet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
    pub cost_summary: CostSummary,
    pub filled_fields: FilledFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureEntry {
    pub row_index: usize,
    pub error: String,
}

/// Response for a single job submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleJobResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_summary: Option<CostSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled_fields: Option<FilledFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SingleJobResponse {
    pub fn ok(cost_summary: CostSummary, filled_fields: FilledFields) -> Self {
        Self {
            success: true,
            cost_summary: Some(cost_summary),
            filled_fields: Some(filled_fields),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            cost_summary: None,
            filled_fields: None,
            error: Some(error.into()),
        }
    }
}

/// Response for a batch submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    pub results: Vec<SuccessEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<FailureEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResponse {
    /// At least one success; failures, if any, are listed alongside
    pub fn completed(results: Vec<SuccessEntry>, failures: Vec<FailureEntry>) -> Self {
        let partial = !failures.is_empty();
        Self {
            success: true,
            results,
            partial_success: partial.then_some(true),
            failures: partial.then_some(failures),
            error: None,
        }
    }

    /// No job succeeded
    pub fn total_failure(error: impl Into<String>, failures: Vec<FailureEntry>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            partial_success: None,
            failures: Some(failures),
            error: Some(error.into()),
        }
    }
}
