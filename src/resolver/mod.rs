//! Semantic resolver
//!
//! Maps a natural-language instruction ("Find the input field labeled
//! \"Gusset mm\"") to at most one element. Absence is a normal outcome and is
//! reported as `None`, never as an error.

pub mod chain;
pub mod label;
pub mod llm;

use async_trait::async_trait;

use crate::infrastructure::{Locator, UiSurface};

pub use chain::ResolverChain;
pub use label::LabelResolver;
pub use llm::LlmResolver;

#[async_trait]
pub trait SemanticResolver: Send + Sync {
    async fn resolve(&self, surface: &dyn UiSurface, instruction: &str) -> Option<Locator>;
}

/// Instruction for a text / numeric input
pub fn input_instruction(label: &str) -> String {
    format!(r#"Find the input field labeled "{}""#, label)
}

/// Instruction for a native dropdown
pub fn dropdown_instruction(label: &str) -> String {
    format!(r#"Find the dropdown menu labeled "{}""#, label)
}

/// Instruction for the clear (×) control of a searchable select
pub fn clear_instruction(label: &str) -> String {
    format!(r#"Click the clear button (×) in the "{}" field"#, label)
}
