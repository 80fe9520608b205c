//! Program configuration
//!
//! Defaults → optional TOML file (`COSTING_CONFIG`) → environment overrides.
//! Credentials are only ever read here and injected into the job engine.

use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, AppResult, ConfigError};

/// Operator credentials for the target application
#[derive(Clone)]
pub struct Credentials {
    pub operator_id: String,
    pub secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("operator_id", &self.operator_id)
            .field("secret", &"***")
            .finish()
    }
}

/// One scripted click on the way to the costing form
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NavigationStep {
    /// Natural-language instruction handed to the resolver
    pub instruction: String,
    /// Missing optional steps are logged and skipped
    #[serde(default)]
    pub optional: bool,
    /// Wait after the click, in milliseconds
    #[serde(default)]
    pub wait_ms: u64,
}

impl NavigationStep {
    fn required(instruction: &str, wait_ms: u64) -> Self {
        Self {
            instruction: instruction.to_string(),
            optional: false,
            wait_ms,
        }
    }
}

/// Target application endpoints and navigation script
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TargetConfig {
    pub login_url: String,
    pub dashboard_url: String,
    pub user_selector: String,
    pub password_selector: String,
    pub sign_in_selector: String,
    pub steps: Vec<NavigationStep>,
    /// Machine searched for in the production section
    pub machine: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            login_url: "https://europackaging.quickbase.com".to_string(),
            dashboard_url: "https://europackaging.quickbase.com/nav/main/action/myqb".to_string(),
            user_selector: r#"input[name="loginid"]"#.to_string(),
            password_selector: r#"input[name="password"]"#.to_string(),
            sign_in_selector: "button#signin".to_string(),
            steps: vec![
                NavigationStep::required(
                    r#"Find and click the "Anab testing copy - PPF costing system" link or button"#,
                    5000,
                ),
                NavigationStep::required(r#"Find and click the "SOS Costings" link or button"#, 5000),
                NavigationStep::required("Find and click the New SOS costing button", 500),
                NavigationStep {
                    instruction: r#"Find and click the "Collapse Side Panel" button"#.to_string(),
                    optional: true,
                    wait_ms: 0,
                },
            ],
            machine: "SOS 12 (1B) 50,000/shift".to_string(),
        }
    }
}

/// Program configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Jobs run concurrently per wave
    pub max_concurrent_jobs: usize,
    /// Settle interval after every UI write
    pub settle_ms: u64,
    /// Upper bound on every single UI wait
    pub step_timeout_secs: u64,
    /// Attempt budget for text / numeric fields
    pub text_attempts: usize,
    /// Attempt budget for dropdown / searchable selections
    pub selection_attempts: usize,
    /// Read → validate → repair rounds for the cost summary
    pub extraction_rounds: usize,
    /// Browser binary; chromiumoxide auto-detects when unset
    pub chrome_executable: Option<String>,
    pub headless: bool,
    pub target: TargetConfig,
    // --- resolver ---
    pub use_llm_resolver: bool,
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- notification relay ---
    pub notify_endpoint: Option<String>,
    pub notify_token: Option<String>,
    // --- output ---
    pub output_log_file: String,
    pub failure_log_file: String,
    pub verbose_logging: bool,
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
            settle_ms: 500,
            step_timeout_secs: 15,
            text_attempts: 3,
            selection_attempts: 2,
            extraction_rounds: 3,
            chrome_executable: None,
            headless: true,
            target: TargetConfig::default(),
            use_llm_resolver: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            notify_endpoint: None,
            notify_token: None,
            output_log_file: "costing_run.log".to_string(),
            failure_log_file: "failures.txt".to_string(),
            verbose_logging: false,
            credentials: None,
        }
    }
}

/// Shape of the optional TOML config file; every key may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    max_concurrent_jobs: Option<usize>,
    settle_ms: Option<u64>,
    step_timeout_secs: Option<u64>,
    text_attempts: Option<usize>,
    selection_attempts: Option<usize>,
    extraction_rounds: Option<usize>,
    chrome_executable: Option<String>,
    headless: Option<bool>,
    target: Option<TargetConfig>,
    use_llm_resolver: Option<bool>,
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    notify_endpoint: Option<String>,
    output_log_file: Option<String>,
    failure_log_file: Option<String>,
    verbose_logging: Option<bool>,
}

impl Config {
    /// Build the full configuration: file (if `COSTING_CONFIG` is set), then env.
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("COSTING_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        let config = base.with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML config file on top of the defaults
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileInvalid {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::Config(ConfigError::FileInvalid { reason, .. }) => {
                AppError::Config(ConfigError::FileInvalid {
                    path: path.display().to_string(),
                    reason,
                })
            }
            other => other,
        })
    }

    /// Parse TOML text on top of the defaults
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content).map_err(|e| ConfigError::FileInvalid {
            path: String::new(),
            reason: e.to_string(),
        })?;
        let d = Self::default();
        Ok(Self {
            max_concurrent_jobs: file.max_concurrent_jobs.unwrap_or(d.max_concurrent_jobs),
            settle_ms: file.settle_ms.unwrap_or(d.settle_ms),
            step_timeout_secs: file.step_timeout_secs.unwrap_or(d.step_timeout_secs),
            text_attempts: file.text_attempts.unwrap_or(d.text_attempts),
            selection_attempts: file.selection_attempts.unwrap_or(d.selection_attempts),
            extraction_rounds: file.extraction_rounds.unwrap_or(d.extraction_rounds),
            chrome_executable: file.chrome_executable.or(d.chrome_executable),
            headless: file.headless.unwrap_or(d.headless),
            target: file.target.unwrap_or(d.target),
            use_llm_resolver: file.use_llm_resolver.unwrap_or(d.use_llm_resolver),
            llm_api_base_url: file.llm_api_base_url.unwrap_or(d.llm_api_base_url),
            llm_model_name: file.llm_model_name.unwrap_or(d.llm_model_name),
            notify_endpoint: file.notify_endpoint.or(d.notify_endpoint),
            output_log_file: file.output_log_file.unwrap_or(d.output_log_file),
            failure_log_file: file.failure_log_file.unwrap_or(d.failure_log_file),
            verbose_logging: file.verbose_logging.unwrap_or(d.verbose_logging),
            ..d
        })
    }

    /// Apply environment overrides; secrets only come from here
    pub fn with_env(self) -> AppResult<Self> {
        let credentials = match (env_string("OPERATOR_ID"), env_string("OPERATOR_SECRET")) {
            (Some(operator_id), Some(secret)) => Some(Credentials { operator_id, secret }),
            _ => self.credentials,
        };
        Ok(Self {
            max_concurrent_jobs: env_parse("MAX_CONCURRENT_JOBS")?.unwrap_or(self.max_concurrent_jobs),
            settle_ms: env_parse("SETTLE_MS")?.unwrap_or(self.settle_ms),
            step_timeout_secs: env_parse("STEP_TIMEOUT_SECS")?.unwrap_or(self.step_timeout_secs),
            chrome_executable: env_string("CHROME_EXECUTABLE").or(self.chrome_executable),
            headless: env_parse("HEADLESS")?.unwrap_or(self.headless),
            use_llm_resolver: env_parse("USE_LLM_RESOLVER")?.unwrap_or(self.use_llm_resolver),
            llm_api_key: env_string("LLM_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            notify_endpoint: env_string("NOTIFY_ENDPOINT").or(self.notify_endpoint),
            notify_token: env_string("NOTIFY_TOKEN").or(self.notify_token),
            output_log_file: env_string("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            failure_log_file: env_string("FAILURE_LOG_FILE").unwrap_or(self.failure_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING")?.unwrap_or(self.verbose_logging),
            credentials,
            ..self
        })
    }

    /// Startup checks; a failure here aborts before any job runs
    pub fn validate(&self) -> AppResult<()> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::missing_env("OPERATOR_ID / OPERATOR_SECRET"))?;
        if credentials.operator_id.trim().is_empty() {
            return Err(AppError::missing_env("OPERATOR_ID"));
        }
        if credentials.secret.is_empty() {
            return Err(AppError::missing_env("OPERATOR_SECRET"));
        }
        if self.max_concurrent_jobs == 0 {
            return Err(invalid("max_concurrent_jobs", "must be at least 1"));
        }
        if self.text_attempts == 0 || self.selection_attempts == 0 {
            return Err(invalid("attempts", "attempt budgets must be at least 1"));
        }
        if self.extraction_rounds == 0 {
            return Err(invalid("extraction_rounds", "must be at least 1"));
        }
        if self.use_llm_resolver && self.llm_api_key.is_empty() {
            return Err(AppError::missing_env("LLM_API_KEY"));
        }
        Ok(())
    }

    pub fn settle(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_ms)
    }

    pub fn step_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.step_timeout_secs)
    }
}

fn invalid(key: &str, reason: &str) -> AppError {
    AppError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    })
}

fn env_string(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(var_name: &str) -> AppResult<Option<T>> {
    match env_string(var_name) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            AppError::Config(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            })
        }),
    }
}
