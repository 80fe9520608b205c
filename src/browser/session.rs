//! Exclusive per-job sessions
//!
//! Each job owns one session from open to close; nothing is shared between
//! concurrently running jobs.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::Browser;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::headless::launch_browser;
use crate::config::Config;
use crate::infrastructure::{JsExecutor, UiSurface};

/// One job's exclusive automation session
#[async_trait]
pub trait Session: Send + Sync {
    fn surface(&self) -> &dyn UiSurface;

    /// Release the session; called exactly once, whatever the job outcome
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Opens sessions for jobs
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn Session>>;
}

/// Launches a dedicated headless browser per job
pub struct ChromeSessionFactory {
    chrome_executable: Option<String>,
    headless: bool,
    step_timeout: Duration,
}

impl ChromeSessionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            headless: config.headless,
            step_timeout: config.step_timeout(),
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>> {
        let launched = launch_browser(self.chrome_executable.as_deref(), self.headless).await?;
        Ok(Box::new(ChromeSession {
            browser: launched.browser,
            executor: JsExecutor::new(launched.page, self.step_timeout),
            handler: launched.handler,
            profile_dir: launched.profile_dir,
        }))
    }
}

struct ChromeSession {
    browser: Browser,
    executor: JsExecutor,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

#[async_trait]
impl Session for ChromeSession {
    fn surface(&self) -> &dyn UiSurface {
        &self.executor
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromeSession {
            mut browser,
            handler,
            profile_dir,
            ..
        } = *self;

        let closed = browser.close().await;
        if closed.is_ok() {
            let _ = browser.wait().await;
        }
        handler.abort();

        if let Err(e) = tokio::fs::remove_dir_all(&profile_dir).await {
            debug!("profile dir {} not removed: {}", profile_dir.display(), e);
        }

        closed.map(|_| ()).map_err(|e| {
            warn!("browser close failed: {}", e);
            e.into()
        })
    }
}
