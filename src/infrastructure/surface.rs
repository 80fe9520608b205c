//! UI surface capability
//!
//! Everything the engine does to the target application goes through this
//! trait. `JsExecutor` implements it over a chromiumoxide page; tests script
//! their own implementations.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Reference to one actionable element (a CSS selector)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keys the engine presses on the focused element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    ArrowDown,
    Tab,
    Escape,
}

impl Key {
    /// DOM `key` value
    pub fn name(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::ArrowDown => "ArrowDown",
            Key::Tab => "Tab",
            Key::Escape => "Escape",
        }
    }

    /// Windows virtual key code, required by some widgets to react
    pub fn virtual_key_code(self) -> i64 {
        match self {
            Key::Enter => 13,
            Key::ArrowDown => 40,
            Key::Tab => 9,
            Key::Escape => 27,
        }
    }
}

/// Page capability consumed by the interaction engine.
///
/// Every method is a suspension point; implementations bound each wait by
/// the per-step timeout. Reads return `None` when the element is absent.
#[async_trait]
pub trait UiSurface: Send + Sync {
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait until the current URL starts with `url`
    async fn wait_for_url(&self, url: &str) -> Result<()>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Replace the control's value (never appends)
    async fn fill(&self, locator: &Locator, value: &str) -> Result<()>;

    /// Choose the `<option>` whose visible text matches `label`
    async fn select_option(&self, locator: &Locator, label: &str) -> Result<()>;

    /// Focus the element and type `text` keystroke by keystroke
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Press a key on whatever element has focus
    async fn press_key(&self, key: Key) -> Result<()>;

    /// Current control value (`value` property, else text content)
    async fn read_value(&self, locator: &Locator) -> Result<Option<String>>;

    /// Visible text of the selected `<option>`
    async fn selected_option_text(&self, locator: &Locator) -> Result<Option<String>>;

    /// Text of `target` inside the nearest `scope` ancestor of `locator`
    async fn scoped_text(&self, locator: &Locator, scope: &str, target: &str) -> Result<Option<String>>;

    /// Text of the table cell right after the cell containing `label`
    async fn cell_after_label(&self, label: &str) -> Result<Option<String>>;

    /// Text content of the element with the given id
    async fn text_by_id(&self, id: &str) -> Result<Option<String>>;

    /// Evaluate a script and return its JSON value
    async fn eval(&self, script: String) -> Result<JsonValue>;
}
