//! Verified field transaction
//!
//! One attempt is: resolve → apply → settle → re-resolve → read back →
//! judge. A field is only reported confirmed when the read-back agrees with
//! the desired value. Nothing in here returns an error to the caller: a
//! missing element skips the field, a failing action costs one attempt.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::infrastructure::{Key, Locator, UiSurface};
use crate::resolver::{dropdown_instruction, input_instruction, SemanticResolver};
use crate::services::sanitize::sanitize_numeric;

/// How a field's value is entered and judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    /// Sanitized before entry; compared numerically on read-back
    Numeric,
    /// Native `<select>`, option chosen by its visible text
    SelectExact,
    /// Custom searchable select (see `services::selection`)
    SelectSearchable,
}

/// One labeled field and the value it should end up holding
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub label: String,
    pub target_value: String,
    pub value_kind: ValueKind,
}

impl FieldSpec {
    pub fn new(label: impl Into<String>, target_value: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            label: label.into(),
            target_value: target_value.into(),
            value_kind,
        }
    }

    pub fn text(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, ValueKind::Text)
    }

    pub fn numeric(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(label, value, ValueKind::Numeric)
    }

    pub fn select(label: impl Into<String>, option: impl Into<String>) -> Self {
        Self::new(label, option, ValueKind::SelectExact)
    }

    /// Value actually typed into the control
    pub fn entry_value(&self) -> String {
        match self.value_kind {
            ValueKind::Numeric => sanitize_numeric(&self.target_value),
            _ => self.target_value.trim().to_string(),
        }
    }
}

/// Read-back verdict for one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub confirmed: bool,
    pub observed_value: String,
}

impl VerificationOutcome {
    pub fn new(confirmed: bool, observed_value: impl Into<String>) -> Self {
        Self {
            confirmed,
            observed_value: observed_value.into(),
        }
    }
}

/// Field-specific half of a transaction: how to act and how to check
#[async_trait]
pub trait FieldInteraction: Send + Sync {
    fn label(&self) -> &str;

    /// Instruction handed to the resolver
    fn instruction(&self) -> String;

    async fn apply(
        &self,
        surface: &dyn UiSurface,
        resolver: &dyn SemanticResolver,
        locator: &Locator,
    ) -> Result<()>;

    async fn read_back(&self, surface: &dyn UiSurface, locator: &Locator) -> Result<VerificationOutcome>;
}

/// Terminal state of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    Confirmed { attempts: usize, observed: String },
    /// Attempts exhausted; the form may hold a wrong or empty value
    Unconfirmed { attempts: usize, last_observed: Option<String> },
    /// The resolver found nothing; the field was skipped
    Unresolved { attempts: usize },
}

impl FieldStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, FieldStatus::Confirmed { .. })
    }

    pub fn attempts(&self) -> usize {
        match self {
            FieldStatus::Confirmed { attempts, .. }
            | FieldStatus::Unconfirmed { attempts, .. }
            | FieldStatus::Unresolved { attempts } => *attempts,
        }
    }
}

/// Bounded retry loop around a `FieldInteraction`
#[derive(Debug, Clone, Copy)]
pub struct FieldTransaction {
    max_attempts: usize,
    settle: Duration,
}

impl FieldTransaction {
    pub fn new(max_attempts: usize, settle: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            settle,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub async fn execute(
        &self,
        surface: &dyn UiSurface,
        resolver: &dyn SemanticResolver,
        interaction: &dyn FieldInteraction,
    ) -> FieldStatus {
        let label = interaction.label();
        let instruction = interaction.instruction();
        let mut last_observed = None;

        for attempt in 1..=self.max_attempts {
            let Some(locator) = resolver.resolve(surface, &instruction).await else {
                warn!("⚠️ '{}' not found on the page, skipping", label);
                return FieldStatus::Unresolved { attempts: attempt };
            };

            if let Err(e) = interaction.apply(surface, resolver, &locator).await {
                warn!("⚠️ '{}' attempt {}/{} failed: {}", label, attempt, self.max_attempts, e);
                tokio::time::sleep(self.settle).await;
                continue;
            }

            tokio::time::sleep(self.settle).await;

            // The widget may have re-rendered; fall back to the old reference
            let current = resolver.resolve(surface, &instruction).await.unwrap_or(locator);

            match interaction.read_back(surface, &current).await {
                Ok(outcome) if outcome.confirmed => {
                    info!("✓ '{}' confirmed: {}", label, outcome.observed_value);
                    return FieldStatus::Confirmed {
                        attempts: attempt,
                        observed: outcome.observed_value,
                    };
                }
                Ok(outcome) => {
                    debug!(
                        "'{}' attempt {}/{} read back {:?}",
                        label, attempt, self.max_attempts, outcome.observed_value
                    );
                    last_observed = Some(outcome.observed_value);
                }
                Err(e) => {
                    warn!("⚠️ '{}' read-back {}/{} failed: {}", label, attempt, self.max_attempts, e);
                }
            }
        }

        warn!(
            "⚠️ '{}' not confirmed after {} attempts (last seen: {:?})",
            label, self.max_attempts, last_observed
        );
        FieldStatus::Unconfirmed {
            attempts: self.max_attempts,
            last_observed,
        }
    }
}

/// Read-back predicate for text and numeric inputs
pub fn text_matches(observed: &str, desired: &str, numeric: bool) -> bool {
    let observed = observed.trim();
    let desired = desired.trim();
    if observed.is_empty() || desired.is_empty() {
        return false;
    }
    if observed == desired {
        return true;
    }
    if !numeric {
        return false;
    }
    let parse = |s: &str| sanitize_numeric(s).parse::<f64>().ok();
    match (parse(observed), parse(desired)) {
        (Some(a), Some(b)) => (a - b).abs() < 1e-9,
        _ => false,
    }
}

/// Text or numeric input, filled by replacement
pub struct TextInteraction {
    spec: FieldSpec,
    commit_key: Option<Key>,
}

impl TextInteraction {
    pub fn new(spec: FieldSpec) -> Self {
        Self { spec, commit_key: None }
    }

    /// Press `key` after filling (some fields only recalculate on blur)
    pub fn commit_with(mut self, key: Key) -> Self {
        self.commit_key = Some(key);
        self
    }
}

#[async_trait]
impl FieldInteraction for TextInteraction {
    fn label(&self) -> &str {
        &self.spec.label
    }

    fn instruction(&self) -> String {
        input_instruction(&self.spec.label)
    }

    async fn apply(&self, surface: &dyn UiSurface, _: &dyn SemanticResolver, locator: &Locator) -> Result<()> {
        surface.fill(locator, &self.spec.entry_value()).await?;
        if let Some(key) = self.commit_key {
            surface.press_key(key).await?;
        }
        Ok(())
    }

    async fn read_back(&self, surface: &dyn UiSurface, locator: &Locator) -> Result<VerificationOutcome> {
        let observed = surface.read_value(locator).await?.unwrap_or_default();
        let numeric = self.spec.value_kind == ValueKind::Numeric;
        let confirmed = text_matches(&observed, &self.spec.entry_value(), numeric);
        Ok(VerificationOutcome::new(confirmed, observed))
    }
}

/// Native dropdown with a fixed option list
pub struct ExactSelectInteraction {
    spec: FieldSpec,
}

impl ExactSelectInteraction {
    pub fn new(spec: FieldSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl FieldInteraction for ExactSelectInteraction {
    fn label(&self) -> &str {
        &self.spec.label
    }

    fn instruction(&self) -> String {
        dropdown_instruction(&self.spec.label)
    }

    async fn apply(&self, surface: &dyn UiSurface, _: &dyn SemanticResolver, locator: &Locator) -> Result<()> {
        surface.select_option(locator, self.spec.target_value.trim()).await
    }

    async fn read_back(&self, surface: &dyn UiSurface, locator: &Locator) -> Result<VerificationOutcome> {
        let observed = surface.selected_option_text(locator).await?.unwrap_or_default();
        let confirmed = observed.trim().eq_ignore_ascii_case(self.spec.target_value.trim());
        Ok(VerificationOutcome::new(confirmed, observed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_entry_is_sanitized() {
        assert_eq!(FieldSpec::numeric("Face Width mm", "120mm").entry_value(), "120");
        assert_eq!(FieldSpec::text("Description", "  Test bag ").entry_value(), "Test bag");
    }

    #[test]
    fn numeric_read_back_compares_by_value() {
        assert!(text_matches("120.0", "120", true));
        assert!(text_matches(" 500 ", "500", true));
        assert!(!text_matches("120.0", "120", false));
        assert!(!text_matches("", "120", true));
        assert!(!text_matches("", "", true));
        assert!(!text_matches(" ", "", false));
        assert!(!text_matches("12", "120", true));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(FieldTransaction::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
