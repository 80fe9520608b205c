use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::fs;

use crate::error::{AppResult, SubmissionError};
use crate::models::payload::JobPayload;

/// A parsed submission: one payload, or an ordered batch
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Single(JobPayload),
    Batch(Vec<JobPayload>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubmission {
    Wrapped { payloads: Vec<JobPayload> },
    List(Vec<JobPayload>),
    Single(Box<JobPayload>),
}

impl From<RawSubmission> for Submission {
    fn from(raw: RawSubmission) -> Self {
        match raw {
            RawSubmission::Wrapped { payloads } | RawSubmission::List(payloads) => {
                Submission::Batch(payloads)
            }
            RawSubmission::Single(payload) => Submission::Single(*payload),
        }
    }
}

fn check(submission: Submission) -> AppResult<Submission> {
    match submission {
        Submission::Batch(payloads) if payloads.is_empty() => Err(SubmissionError::Empty.into()),
        other => Ok(other),
    }
}

/// Parse a JSON body: a payload object, a bare array, or `{ "payloads": [...] }`
pub fn parse_submission(body: &str) -> AppResult<Submission> {
    let raw: RawSubmission = serde_json::from_str(body)
        .map_err(|e| SubmissionError::Malformed(format!("not a payload or payload list: {}", e)))?;
    check(raw.into())
}

/// Parse a TOML document (`[[payloads]]` tables, or one payload at top level)
pub fn parse_toml_submission(body: &str) -> AppResult<Submission> {
    let raw: RawSubmission = toml::from_str(body)
        .map_err(|e| SubmissionError::Malformed(format!("not a payload or payload list: {}", e)))?;
    check(raw.into())
}

/// Batch endpoint variant: a list is required, never a lone payload
pub fn parse_batch_submission(body: &str) -> AppResult<Vec<JobPayload>> {
    match parse_submission(body)? {
        Submission::Batch(payloads) => Ok(payloads),
        Submission::Single(_) => Err(SubmissionError::Malformed(
            "expected a list of payloads or {\"payloads\": [...]}".to_string(),
        )
        .into()),
    }
}

/// Load a submission file; the extension picks the format
pub async fn load_submission(path: &Path) -> Result<Submission> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read submission file: {}", path.display()))?;

    let submission = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => parse_submission(&content),
        Some("toml") => parse_toml_submission(&content),
        other => Err(SubmissionError::UnsupportedFormat(other.unwrap_or("<none>").to_string()).into()),
    }
    .with_context(|| format!("invalid submission file: {}", path.display()))?;

    tracing::info!(
        "loaded {} from {}",
        match &submission {
            Submission::Single(_) => "1 payload".to_string(),
            Submission::Batch(p) => format!("{} payloads", p.len()),
        },
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    const ONE: &str = r#"{ "formData": { "Description": "Test" }, "rowIndex": 1 }"#;

    #[test]
    fn accepts_bare_and_wrapped_lists() {
        let bare = parse_batch_submission(&format!("[{ONE}, {ONE}]")).unwrap();
        assert_eq!(bare.len(), 2);

        let wrapped = parse_batch_submission(&format!(r#"{{ "payloads": [{ONE}] }}"#)).unwrap();
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn single_payload_is_single() {
        assert!(matches!(parse_submission(ONE).unwrap(), Submission::Single(_)));
        assert!(parse_batch_submission(ONE).is_err());
    }

    #[test]
    fn empty_and_malformed_are_client_errors() {
        assert!(matches!(
            parse_batch_submission("[]"),
            Err(AppError::Submission(SubmissionError::Empty))
        ));
        assert!(matches!(
            parse_batch_submission(r#"{ "payloads": [] }"#),
            Err(AppError::Submission(SubmissionError::Empty))
        ));
        assert!(matches!(
            parse_batch_submission(r#"{ "rows": 3 }"#),
            Err(AppError::Submission(SubmissionError::Malformed(_)))
        ));
    }

    #[test]
    fn toml_batches_parse() {
        let submission = parse_toml_submission(
            r#"
            [[payloads]]
            rowIndex = 4
            formData = { "Face Width mm" = "120mm", "Bags per box" = 500 }

            [[payloads]]
            formData = { "Description" = "Second" }
            costOverrides = [{ field = "bag_paper_price_override", value = 0.25 }]
            "#,
        )
        .unwrap();

        match submission {
            Submission::Batch(payloads) => {
                assert_eq!(payloads.len(), 2);
                assert_eq!(payloads[0].value("Bags per box"), Some("500"));
                assert_eq!(payloads[1].override_value("bag_paper_price_override"), Some("0.25"));
            }
            other => panic!("expected batch, got {:?}", other),
        }
    }
}
