//! Job context
//!
//! Which row is being processed, carried into every per-job log line

use std::fmt::Display;

use crate::models::JobPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCtx {
    /// Row index reported back to the caller
    pub row_index: usize,
    pub tracking_id: Option<String>,
    pub spec_sheet_id: Option<String>,
}

impl JobCtx {
    /// `position` is used when the payload carries no row index
    pub fn for_payload(payload: &JobPayload, position: usize) -> Self {
        Self {
            row_index: payload.row_index.unwrap_or(position),
            tracking_id: payload.tracking_id.clone(),
            spec_sheet_id: payload.spec_sheet_id.clone(),
        }
    }
}

impl Display for JobCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.spec_sheet_id {
            Some(sheet) => write!(f, "[row {} {}]", self.row_index, sheet),
            None => write!(f, "[row {}]", self.row_index),
        }
    }
}
