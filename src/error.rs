use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Browser / session errors
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),
    /// Configuration errors (startup only)
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Malformed or empty job submissions
    #[error("submission error: {0}")]
    Submission(#[from] SubmissionError),
    /// Notification delivery errors
    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),
    /// Batch-wide failures
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),
    /// Anything else (wrapped third-party errors)
    #[error("error: {0}")]
    Other(String),
}

/// Browser related errors
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Launching or connecting to the browser failed
    #[error("failed to launch browser: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Opening a page failed
    #[error("failed to create page: {source}")]
    PageCreationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Navigation failed
    #[error("failed to navigate to {url}: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Script evaluation failed
    #[error("script execution failed: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// A UI wait exceeded the per-step timeout
    #[error("step timed out after {secs}s: {step}")]
    StepTimeout { step: String, secs: u64 },
    /// Browser configuration was rejected
    #[error("browser configuration failed: {0}")]
    ConfigurationFailed(String),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable could not be parsed
    #[error("environment variable {var_name}: value '{value}' is not a valid {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// Required environment variable is missing
    #[error("environment variable {var_name} is missing")]
    EnvVarNotFound { var_name: String },
    /// Config file could not be read or parsed
    #[error("config file {path}: {reason}")]
    FileInvalid { path: String, reason: String },
    /// A value is out of range
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Submission errors (client errors, raised before any job runs)
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Batch contained no payloads
    #[error("submission contains no payloads")]
    Empty,
    /// Body could not be parsed as a payload or list of payloads
    #[error("malformed submission: {0}")]
    Malformed(String),
    /// Unsupported file extension
    #[error("unsupported submission format: {0}")]
    UnsupportedFormat(String),
}

/// Notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The relay could not be reached
    #[error("notification request failed: {0}")]
    RequestFailed(String),
    /// The relay answered with a non-success status
    #[error("notification relay returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Batch-wide errors
#[derive(Debug, Error)]
pub enum BatchError {
    /// Every job in the batch failed
    #[error("all {total} jobs in the batch failed")]
    TotalFailure { total: usize },
}

// ========== conversions from common error types ==========

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Submission(SubmissionError::Malformed(err.to_string()))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Submission(SubmissionError::Malformed(err.to_string()))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Notify(NotifyError::RequestFailed(err.to_string()))
    }
}

// ========== convenience constructors ==========

impl AppError {
    /// Browser launch failure
    pub fn launch_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Browser(BrowserError::LaunchFailed {
            source: Box::new(source),
        })
    }

    /// Navigation failure
    pub fn navigation_failed(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// Missing environment variable
    pub fn missing_env(var_name: impl Into<String>) -> Self {
        AppError::Config(ConfigError::EnvVarNotFound {
            var_name: var_name.into(),
        })
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_failure_message_names_count() {
        let err = AppError::from(BatchError::TotalFailure { total: 5 });
        assert_eq!(err.to_string(), "batch error: all 5 jobs in the batch failed");
    }

    #[test]
    fn missing_env_is_config_error() {
        let err = AppError::missing_env("OPERATOR_ID");
        assert!(matches!(
            err,
            AppError::Config(ConfigError::EnvVarNotFound { ref var_name }) if var_name == "OPERATOR_ID"
        ));
    }
}
