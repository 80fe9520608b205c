//! LLM-backed resolver
//!
//! Snapshots the visible interactive elements, asks an OpenAI-compatible
//! model which one the instruction means, and returns that element's ref.
//!
//! ## Stack
//! - `async-openai` for the chat call
//! - any OpenAI-compatible endpoint via `llm_api_base_url`

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::infrastructure::{Locator, UiSurface};
use crate::resolver::SemanticResolver;

const MAX_CANDIDATES: usize = 150;

const SYSTEM_PROMPT: &str = "You map an instruction to one element of a web form. \
You receive a numbered list of elements. Reply with the number of the single element \
the instruction refers to, or -1 if none matches. Reply with the number only.";

/// One interactive element from the page snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub selector: String,
    pub description: String,
}

pub struct LlmResolver {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmResolver {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    async fn snapshot(&self, surface: &dyn UiSurface) -> Result<Vec<Candidate>> {
        let script = format!(
            r#"
            (() => {{
                const visible = el => !!(el.offsetParent !== null || el.getClientRects().length);
                const labelOf = el => {{
                    if (el.labels && el.labels.length) return el.labels[0].innerText;
                    const row = el.closest('tr');
                    if (row && row.cells && row.cells.length) return row.cells[0].innerText;
                    return el.getAttribute('aria-label') || el.getAttribute('placeholder') || '';
                }};
                const els = Array.from(document.querySelectorAll(
                    'input:not([type=hidden]), select, textarea, button, a, [role=button], [role=option]'
                )).filter(visible).slice(0, {max});
                return {{ items: els.map(el => {{
                    if (!el.getAttribute('data-costing-ref')) {{
                        window.__costingRefSeq = (window.__costingRefSeq || 0) + 1;
                        el.setAttribute('data-costing-ref', String(window.__costingRefSeq));
                    }}
                    const text = (el.innerText || el.value || '').replace(/\s+/g, ' ').trim().slice(0, 80);
                    return {{
                        selector: '[data-costing-ref="' + el.getAttribute('data-costing-ref') + '"]',
                        description: [el.tagName.toLowerCase(), el.type || '', 'label=' + labelOf(el).trim(),
                                      'name=' + (el.name || ''), 'text=' + text].join(' | ')
                    }};
                }}) }};
            }})()
            "#,
            max = MAX_CANDIDATES
        );

        #[derive(Deserialize)]
        struct Snapshot {
            items: Vec<Candidate>,
        }

        let snapshot: Snapshot = serde_json::from_value(surface.eval(script).await?)?;
        Ok(snapshot.items)
    }

    async fn ask(&self, instruction: &str, candidates: &[Candidate]) -> Result<String> {
        let listing = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| format!("[{}] {}", i, c.description))
            .collect::<Vec<_>>()
            .join("\n");
        let user_message = format!("Instruction: {}\n\nElements:\n{}", instruction, listing);

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.0)
            .max_tokens(16u32)
            .build()?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM resolver call failed: {}", e);
            anyhow::anyhow!("LLM resolver call failed: {}", e)
        })?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|c| c.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("LLM returned no content"))
    }
}

/// Parse the model's reply into a candidate index
pub fn parse_choice(reply: &str, candidate_count: usize) -> Option<usize> {
    let token = reply
        .split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .find(|t| !t.is_empty() && *t != "-")?;
    let index: i64 = token.parse().ok()?;
    if index < 0 {
        return None;
    }
    let index = index as usize;
    (index < candidate_count).then_some(index)
}

#[async_trait]
impl SemanticResolver for LlmResolver {
    async fn resolve(&self, surface: &dyn UiSurface, instruction: &str) -> Option<Locator> {
        let candidates = match self.snapshot(surface).await {
            Ok(c) if !c.is_empty() => c,
            Ok(_) => return None,
            Err(e) => {
                debug!("element snapshot failed: {}", e);
                return None;
            }
        };

        let reply = match self.ask(instruction, &candidates).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("LLM resolution skipped: {}", e);
                return None;
            }
        };
        debug!("LLM picked '{}' for: {}", reply, instruction);

        parse_choice(&reply, candidates.len()).map(|i| Locator::css(candidates[i].selector.clone()))
    }
}
