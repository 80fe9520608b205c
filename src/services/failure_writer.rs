//! Failure ledger
//!
//! Appends one line per failed job so a batch can be re-submitted later.

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::models::FailureEntry;

pub struct FailureWriter {
    path: String,
}

impl FailureWriter {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Append `failures`, each stamped with the current local time
    pub fn write(&self, failures: &[FailureEntry]) -> Result<()> {
        if failures.is_empty() {
            return Ok(());
        }
        debug!("writing {} failure(s) to {}", failures.len(), self.path);

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        for failure in failures {
            // One line per row; newlines in the message would split it
            let message = failure.error.replace(['\r', '\n'], " ");
            writeln!(file, "{} | row {} | {}", stamp, failure.row_index, message)?;
        }
        Ok(())
    }
}
