//! JS executor - infrastructure layer
//!
//! Holds the job's page and exposes it only as a `UiSurface`.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::BrowserError;
use crate::infrastructure::surface::{Key, Locator, UiSurface};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result shape of every probe script; scripts never return bare `null`
#[derive(Debug, Deserialize)]
struct Probe {
    value: Option<String>,
}

/// JS executor
///
/// - the only owner of the job's `Page`
/// - knows nothing about payloads or costings
/// - every wait is bounded by `step_timeout`
pub struct JsExecutor {
    page: Page,
    step_timeout: Duration,
}

impl JsExecutor {
    pub fn new(page: Page, step_timeout: Duration) -> Self {
        Self { page, step_timeout }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Evaluate and deserialize into `T`
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code.into()).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    async fn bounded<T>(&self, step: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match timeout(self.step_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::StepTimeout {
                step: step.to_string(),
                secs: self.step_timeout.as_secs(),
            }
            .into()),
        }
    }

    async fn probe(&self, js_code: String) -> Result<Option<String>> {
        let probe: Probe = self.eval_as(js_code).await?;
        Ok(probe.value)
    }

    /// Poll until the selector matches, like a `waitForSelector`
    async fn wait_for(&self, locator: &Locator) -> Result<()> {
        let deadline = Instant::now() + self.step_timeout;
        let script = format!(
            "(() => ({{ value: document.querySelector({}) ? 'yes' : null }}))()",
            js_str(locator.selector())?
        );
        loop {
            if self.probe(script.clone()).await?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::StepTimeout {
                    step: format!("wait for {}", locator),
                    secs: self.step_timeout.as_secs(),
                }
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn dispatch_key(&self, key: Key, kind: DispatchKeyEventType) -> Result<()> {
        let params = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key.name())
            .code(key.name())
            .windows_virtual_key_code(key.virtual_key_code())
            .build()
            .map_err(|e| anyhow!("invalid key event: {}", e))?;
        self.page.execute(params).await?;
        Ok(())
    }
}

#[async_trait]
impl UiSurface for JsExecutor {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("navigating to {}", url);
        self.bounded("goto", async {
            self.page
                .goto(url)
                .await
                .map_err(|e| crate::error::AppError::navigation_failed(url, e))?;
            Ok::<(), anyhow::Error>(())
        })
        .await
    }

    async fn wait_for_url(&self, url: &str) -> Result<()> {
        let deadline = Instant::now() + self.step_timeout;
        loop {
            if let Some(current) = self.page.url().await? {
                if current.starts_with(url) {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::StepTimeout {
                    step: format!("wait for url {}", url),
                    secs: self.step_timeout.as_secs(),
                }
                .into());
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        self.wait_for(locator).await?;
        self.bounded("click", async {
            self.page
                .find_element(locator.selector())
                .await
                .with_context(|| format!("element not found: {}", locator))?
                .click()
                .await?;
            Ok::<(), anyhow::Error>(())
        })
        .await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        self.wait_for(locator).await?;
        // native setter + input/change so framework-controlled inputs notice
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ value: null }};
                el.focus();
                const proto = el instanceof HTMLTextAreaElement
                    ? HTMLTextAreaElement.prototype
                    : HTMLInputElement.prototype;
                const desc = Object.getOwnPropertyDescriptor(proto, 'value');
                if (desc && desc.set) {{ desc.set.call(el, {val}); }} else {{ el.value = {val}; }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.blur();
                return {{ value: 'ok' }};
            }})()
            "#,
            sel = js_str(locator.selector())?,
            val = js_str(value)?,
        );
        match self.bounded("fill", self.probe(script)).await? {
            Some(_) => Ok(()),
            None => Err(anyhow!("element not found: {}", locator)),
        }
    }

    async fn select_option(&self, locator: &Locator, label: &str) -> Result<()> {
        self.wait_for(locator).await?;
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el || !el.options) return {{ value: null }};
                const want = {label}.trim().toLowerCase();
                const opt = Array.from(el.options).find(o => o.text.trim().toLowerCase() === want);
                if (!opt) return {{ value: null }};
                el.value = opt.value;
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ value: opt.text }};
            }})()
            "#,
            sel = js_str(locator.selector())?,
            label = js_str(label)?,
        );
        match self.bounded("select option", self.probe(script)).await? {
            Some(_) => Ok(()),
            None => Err(anyhow!("no option '{}' in {}", label, locator)),
        }
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        self.wait_for(locator).await?;
        self.bounded("type", async {
            self.page
                .find_element(locator.selector())
                .await
                .with_context(|| format!("element not found: {}", locator))?
                .click()
                .await?
                .type_str(text)
                .await?;
            Ok::<(), anyhow::Error>(())
        })
        .await
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        self.bounded("press key", async {
            self.dispatch_key(key, DispatchKeyEventType::KeyDown).await?;
            self.dispatch_key(key, DispatchKeyEventType::KeyUp).await
        })
        .await
    }

    async fn read_value(&self, locator: &Locator) -> Result<Option<String>> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ value: null }};
                const v = ('value' in el) ? el.value : el.textContent;
                return {{ value: v == null ? null : String(v).trim() }};
            }})()
            "#,
            sel = js_str(locator.selector())?,
        );
        self.bounded("read value", self.probe(script)).await
    }

    async fn selected_option_text(&self, locator: &Locator) -> Result<Option<String>> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ value: null }};
                if (el.options && el.selectedIndex >= 0) {{
                    return {{ value: el.options[el.selectedIndex].text.trim() }};
                }}
                return {{ value: ('value' in el) ? String(el.value).trim() : null }};
            }})()
            "#,
            sel = js_str(locator.selector())?,
        );
        self.bounded("read selected option", self.probe(script)).await
    }

    async fn scoped_text(&self, locator: &Locator, scope: &str, target: &str) -> Result<Option<String>> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return {{ value: null }};
                const root = el.closest({scope}) || el.parentElement;
                const hit = root ? root.querySelector({target}) : null;
                return {{ value: hit ? hit.textContent.trim() : null }};
            }})()
            "#,
            sel = js_str(locator.selector())?,
            scope = js_str(scope)?,
            target = js_str(target)?,
        );
        self.bounded("read scoped text", self.probe(script)).await
    }

    async fn cell_after_label(&self, label: &str) -> Result<Option<String>> {
        // innermost cell containing the label that has a right-hand neighbour
        let script = format!(
            r#"
            (() => {{
                const want = {label};
                const cells = Array.from(document.querySelectorAll('td')).filter(td =>
                    td.textContent.includes(want) &&
                    td.nextElementSibling &&
                    !Array.from(td.querySelectorAll('td')).some(inner => inner.textContent.includes(want)));
                if (cells.length === 0) return {{ value: null }};
                return {{ value: cells[0].nextElementSibling.textContent.trim() }};
            }})()
            "#,
            label = js_str(label)?,
        );
        self.bounded("read labelled cell", self.probe(script)).await
    }

    async fn text_by_id(&self, id: &str) -> Result<Option<String>> {
        let script = format!(
            r#"
            (() => {{
                const el = document.getElementById({id});
                return {{ value: el ? el.textContent.trim() : null }};
            }})()
            "#,
            id = js_str(id)?,
        );
        self.bounded("read slot", self.probe(script)).await
    }

    async fn eval(&self, script: String) -> Result<JsonValue> {
        let result = self.page.evaluate(script).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }
}

/// Quote a Rust string as a JS string literal
fn js_str(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
