use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::{AppError, BrowserError};

static PROFILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A launched browser plus the task pumping its CDP events
pub struct LaunchedBrowser {
    pub browser: Browser,
    pub page: Page,
    pub handler: JoinHandle<()>,
    pub profile_dir: PathBuf,
}

/// Fresh profile directory so concurrently launched browsers never share state
fn unique_profile_dir() -> PathBuf {
    let n = PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "costing-session-{}-{}-{}",
        std::process::id(),
        chrono::Local::now().timestamp_millis(),
        n
    ))
}

/// Launch a dedicated browser with one blank page
pub async fn launch_browser(chrome_executable: Option<&str>, headless: bool) -> Result<LaunchedBrowser> {
    info!("🚀 Launching browser session...");
    let profile_dir = unique_profile_dir();
    debug!("profile dir: {}", profile_dir.display());

    let mut builder = BrowserConfig::builder()
        .user_data_dir(&profile_dir)
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]);
    builder = if headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(path) = chrome_executable {
        builder = builder.chrome_executable(Path::new(path));
    }
    let config = builder.build().map_err(|e| {
        error!("browser configuration rejected: {}", e);
        AppError::Browser(BrowserError::ConfigurationFailed(e))
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("failed to launch browser: {}", e);
        AppError::launch_failed(e)
    })?;
    debug!("browser launched");

    // pump browser events in the background
    let handler = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // short delay so the browser state settles
    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("failed to create page: {}", e);
        AppError::Browser(BrowserError::PageCreationFailed {
            source: Box::new(e),
        })
    })?;

    Ok(LaunchedBrowser {
        browser,
        page,
        handler,
        profile_dir,
    })
}
