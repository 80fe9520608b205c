//! Runs form steps through the right transaction.
//!
//! Text, numeric and exact selects share one attempt budget; searchable
//! selections use their own, smaller one.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::infrastructure::{Key, UiSurface};
use crate::resolver::SemanticResolver;
use crate::services::field_transaction::{
    ExactSelectInteraction, FieldInteraction, FieldSpec, FieldStatus, FieldTransaction, TextInteraction, ValueKind,
};
use crate::services::selection::{SelectionInteraction, SelectionProbe, SelectionTrigger};

/// A searchable select and how to drive it
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSpec {
    pub label: String,
    pub trigger: SelectionTrigger,
    pub probe: SelectionProbe,
    /// Tokens the chosen option must contain (empty: anything real)
    pub expected: Vec<String>,
}

/// One step of the form
#[derive(Debug, Clone, PartialEq)]
pub enum FormStep {
    Field { spec: FieldSpec, commit_key: Option<Key> },
    Selection(SelectionSpec),
}

impl FormStep {
    pub fn field(spec: FieldSpec) -> Self {
        FormStep::Field { spec, commit_key: None }
    }

    pub fn label(&self) -> &str {
        match self {
            FormStep::Field { spec, .. } => &spec.label,
            FormStep::Selection(selection) => &selection.label,
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            FormStep::Field { spec, .. } => spec.value_kind,
            FormStep::Selection(_) => ValueKind::SelectSearchable,
        }
    }

    fn interaction(&self, pause: Duration) -> Box<dyn FieldInteraction> {
        match self {
            FormStep::Field { spec, commit_key } => match spec.value_kind {
                ValueKind::SelectExact => Box::new(ExactSelectInteraction::new(spec.clone())),
                _ => {
                    let text = TextInteraction::new(spec.clone());
                    match commit_key {
                        Some(key) => Box::new(text.commit_with(*key)),
                        None => Box::new(text),
                    }
                }
            },
            FormStep::Selection(selection) => Box::new(
                SelectionInteraction::new(
                    selection.label.clone(),
                    selection.trigger.clone(),
                    selection.probe.clone(),
                    pause,
                )
                .expecting(selection.expected.clone()),
            ),
        }
    }
}

#[derive(Clone)]
pub struct StepRunner {
    resolver: Arc<dyn SemanticResolver>,
    field_transaction: FieldTransaction,
    selection_transaction: FieldTransaction,
    settle: Duration,
}

impl StepRunner {
    pub fn new(config: &Config, resolver: Arc<dyn SemanticResolver>) -> Self {
        Self {
            resolver,
            field_transaction: FieldTransaction::new(config.text_attempts, config.settle()),
            selection_transaction: FieldTransaction::new(config.selection_attempts, config.settle()),
            settle: config.settle(),
        }
    }

    pub fn resolver(&self) -> &dyn SemanticResolver {
        self.resolver.as_ref()
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub async fn run(&self, surface: &dyn UiSurface, step: &FormStep) -> FieldStatus {
        let transaction = match step.value_kind() {
            ValueKind::SelectSearchable => &self.selection_transaction,
            _ => &self.field_transaction,
        };
        let interaction = step.interaction(self.settle);
        transaction.execute(surface, self.resolver(), interaction.as_ref()).await
    }
}
