//! Selection verifier
//!
//! Searchable selects render a value label once something is chosen and a
//! placeholder otherwise; the hidden native control underneath carries a
//! sentinel value until a real option is picked. A selection only counts
//! when those reads agree.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::infrastructure::{Key, Locator, UiSurface};
use crate::resolver::{clear_instruction, input_instruction, SemanticResolver};
use crate::services::field_transaction::{FieldInteraction, VerificationOutcome};

pub const PLACEHOLDER_TEXT: &str = "Search and select";
pub const UNSELECTED_SENTINEL: &str = "x3recpcker#";

/// Where to look when reading a searchable select back
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionProbe {
    /// Ancestor that bounds the widget (the form row)
    pub scope: String,
    pub value_label_selector: String,
    pub placeholder_selector: String,
    pub placeholder_text: String,
    /// Hidden native control, e.g. `select[name="_fid_477"]`
    pub raw_control: Option<Locator>,
    pub sentinel: String,
}

impl Default for SelectionProbe {
    fn default() -> Self {
        Self {
            scope: "tr".to_string(),
            value_label_selector: ".Select-value-label".to_string(),
            placeholder_selector: ".Select-placeholder".to_string(),
            placeholder_text: PLACEHOLDER_TEXT.to_string(),
            raw_control: None,
            sentinel: UNSELECTED_SENTINEL.to_string(),
        }
    }
}

impl SelectionProbe {
    /// Probe with a fallback read on the hidden control named `field_name`
    pub fn with_raw_control(field_name: &str) -> Self {
        Self {
            raw_control: Some(Locator::css(format!(r#"select[name="{}"]"#, field_name))),
            ..Self::default()
        }
    }

    /// Placeholder text, ignoring case and any trailing ellipsis
    pub fn is_placeholder(&self, text: &str) -> bool {
        let expected = self.placeholder_text.trim().trim_end_matches(['…', '.']).to_lowercase();
        !expected.is_empty() && text.trim().to_lowercase().starts_with(&expected)
    }
}

/// Key sequence that makes the widget commit an option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTrigger {
    /// Open the list and take the highlighted option
    ConfirmTop,
    /// Open the list, move down one, take it
    AdvanceThenConfirm,
    /// Clear the current choice, search, take the first match
    SearchThenConfirm { query: String },
}

/// Raw reads taken after a trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReadback {
    pub primary: String,
    pub fallback: Option<String>,
}

impl SelectionReadback {
    /// Best human-readable value for logs and the outcome
    pub fn observed(&self) -> String {
        if self.primary.trim().is_empty() {
            self.fallback.clone().unwrap_or_default()
        } else {
            self.primary.clone()
        }
    }
}

/// Decide whether a selection took.
///
/// The primary read must not be the placeholder, and either it is non-empty
/// or the fallback holds a real (non-sentinel) value. When `expected` tokens
/// are given, the primary must contain all of them or the fallback any.
pub fn selection_confirmed(readback: &SelectionReadback, probe: &SelectionProbe, expected: &[String]) -> bool {
    let primary = readback.primary.trim();
    if probe.is_placeholder(primary) {
        return false;
    }

    let fallback = readback
        .fallback
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != probe.sentinel);

    if primary.is_empty() && fallback.is_none() {
        return false;
    }

    if expected.is_empty() {
        return true;
    }

    let primary_matches = !primary.is_empty() && expected.iter().all(|t| primary.contains(t.as_str()));
    let fallback_matches = fallback.is_some_and(|f| expected.iter().any(|t| f.contains(t.as_str())));
    primary_matches || fallback_matches
}

/// Searchable select driven through a `SelectionTrigger`
pub struct SelectionInteraction {
    label: String,
    trigger: SelectionTrigger,
    probe: SelectionProbe,
    expected: Vec<String>,
    pause: Duration,
}

impl SelectionInteraction {
    pub fn new(label: impl Into<String>, trigger: SelectionTrigger, probe: SelectionProbe, pause: Duration) -> Self {
        Self {
            label: label.into(),
            trigger,
            probe,
            expected: Vec::new(),
            pause,
        }
    }

    pub fn expecting(mut self, tokens: Vec<String>) -> Self {
        self.expected = tokens;
        self
    }

    async fn clear(&self, surface: &dyn UiSurface, resolver: &dyn SemanticResolver, locator: &Locator) -> Result<()> {
        match resolver.resolve(surface, &clear_instruction(&self.label)).await {
            Some(clear_button) => surface.click(&clear_button).await?,
            None => {
                debug!("'{}' has no clear control, emptying the input", self.label);
                surface.fill(locator, "").await?;
            }
        }
        tokio::time::sleep(self.pause).await;
        Ok(())
    }

    async fn read(&self, surface: &dyn UiSurface, locator: &Locator) -> Result<SelectionReadback> {
        let probe = &self.probe;
        let mut primary = surface
            .scoped_text(locator, &probe.scope, &probe.value_label_selector)
            .await?
            .unwrap_or_default();
        if primary.trim().is_empty() {
            // Surface the placeholder so the predicate can reject it
            primary = surface
                .scoped_text(locator, &probe.scope, &probe.placeholder_selector)
                .await?
                .unwrap_or_default();
        }

        let fallback = match &probe.raw_control {
            Some(control) => surface.read_value(control).await?,
            None => None,
        };

        Ok(SelectionReadback { primary, fallback })
    }
}

#[async_trait]
impl FieldInteraction for SelectionInteraction {
    fn label(&self) -> &str {
        &self.label
    }

    fn instruction(&self) -> String {
        input_instruction(&self.label)
    }

    async fn apply(&self, surface: &dyn UiSurface, resolver: &dyn SemanticResolver, locator: &Locator) -> Result<()> {
        surface.click(locator).await?;
        tokio::time::sleep(self.pause).await;

        match &self.trigger {
            SelectionTrigger::ConfirmTop => {
                surface.type_text(locator, " ").await?;
                tokio::time::sleep(self.pause).await;
            }
            SelectionTrigger::AdvanceThenConfirm => {
                surface.type_text(locator, " ").await?;
                tokio::time::sleep(self.pause).await;
                surface.press_key(Key::ArrowDown).await?;
                tokio::time::sleep(self.pause).await;
            }
            SelectionTrigger::SearchThenConfirm { query } => {
                self.clear(surface, resolver, locator).await?;
                surface.type_text(locator, query).await?;
                tokio::time::sleep(self.pause * 2).await;
            }
        }

        surface.press_key(Key::Enter).await
    }

    async fn read_back(&self, surface: &dyn UiSurface, locator: &Locator) -> Result<VerificationOutcome> {
        let readback = self.read(surface, locator).await?;
        let confirmed = selection_confirmed(&readback, &self.probe, &self.expected);
        debug!(
            "'{}' read back: primary {:?}, fallback {:?}",
            self.label, readback.primary, readback.fallback
        );
        Ok(VerificationOutcome::new(confirmed, readback.observed()))
    }
}
