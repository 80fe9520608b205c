//! DOM heuristic resolver
//!
//! Finds the element by its visible label text. Resolved elements are tagged
//! with a `data-costing-ref` attribute so the returned locator stays stable
//! across re-renders of unrelated parts of the page.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::infrastructure::{Locator, UiSurface};
use crate::resolver::SemanticResolver;

/// What kind of element the instruction is after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Input,
    Dropdown,
    Clickable,
    ClearButton,
}

impl TargetKind {
    fn as_js(self) -> &'static str {
        match self {
            TargetKind::Input => "input",
            TargetKind::Dropdown => "dropdown",
            TargetKind::Clickable => "clickable",
            TargetKind::ClearButton => "clear",
        }
    }
}

/// Parsed instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub text: String,
    pub kind: TargetKind,
}

fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("valid regex"))
}

fn unquoted_click_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)click the (.+?)\s+(?:link or button|button|link)\s*$").expect("valid regex")
    })
}

/// Pull the label text and element kind out of an instruction
pub fn parse_instruction(instruction: &str) -> Option<Target> {
    let lower = instruction.to_lowercase();
    let kind = if lower.contains("clear button") {
        TargetKind::ClearButton
    } else if lower.contains("dropdown") || lower.contains("select element") {
        TargetKind::Dropdown
    } else if lower.contains("input") || lower.contains("field labeled") {
        TargetKind::Input
    } else {
        TargetKind::Clickable
    };

    let text = quoted_re()
        .captures(instruction)
        .and_then(|c| c.get(1))
        .or_else(|| unquoted_click_re().captures(instruction).and_then(|c| c.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())?;

    Some(Target { text, kind })
}

#[derive(Debug, Deserialize)]
struct Found {
    selector: Option<String>,
}

/// Resolver backed by label matching in the live DOM
#[derive(Debug, Default)]
pub struct LabelResolver;

impl LabelResolver {
    pub fn new() -> Self {
        Self
    }

    fn script(target: &Target) -> Option<String> {
        let text = serde_json::to_string(&target.text).ok()?;
        Some(format!(
            r#"
            (() => {{
                const want = {text};
                const kind = "{kind}";
                const norm = s => (s || '').replace(/[*:]/g, '').replace(/\s+/g, ' ').trim().toLowerCase();
                const target = norm(want);
                const visible = el => !!(el && (el.offsetParent !== null || el.getClientRects().length));
                const tag = el => {{
                    if (!el.getAttribute('data-costing-ref')) {{
                        window.__costingRefSeq = (window.__costingRefSeq || 0) + 1;
                        el.setAttribute('data-costing-ref', String(window.__costingRefSeq));
                    }}
                    return {{ selector: '[data-costing-ref="' + el.getAttribute('data-costing-ref') + '"]' }};
                }};
                const controlSel = kind === 'dropdown'
                    ? 'select'
                    : 'input:not([type=hidden]):not([type=checkbox]):not([type=radio]), textarea, select';

                if (kind === 'clickable') {{
                    const all = Array.from(document.querySelectorAll(
                        'a, button, [role=button], [role=link], [role=tab], input[type=submit], input[type=button]'
                    )).filter(visible);
                    const label = el => norm(el.innerText || el.value || el.getAttribute('aria-label') || el.title);
                    const hit = all.find(el => label(el) === target) || all.find(el => label(el).includes(target));
                    return hit ? tag(hit) : {{ selector: null }};
                }}

                const labels = Array.from(document.querySelectorAll('label, th, td, span, div'))
                    .filter(el => norm(el.textContent) === target)
                    .sort((a, b) => (a.tagName === 'LABEL' ? -1 : 0) - (b.tagName === 'LABEL' ? -1 : 0));

                const controlFor = lab => {{
                    const forId = lab.getAttribute && lab.getAttribute('for');
                    if (forId) {{
                        const byId = document.getElementById(forId);
                        if (byId && byId.matches(controlSel)) return byId;
                    }}
                    const inner = lab.querySelector(controlSel);
                    if (inner) return inner;
                    let sib = lab.nextElementSibling;
                    for (let i = 0; sib && i < 3; i++, sib = sib.nextElementSibling) {{
                        if (sib.matches(controlSel)) return sib;
                        const nested = sib.querySelector(controlSel);
                        if (nested) return nested;
                    }}
                    const row = lab.closest('tr');
                    if (row) {{
                        const inRow = row.querySelector(controlSel);
                        if (inRow) return inRow;
                    }}
                    return lab.parentElement ? lab.parentElement.querySelector(controlSel) : null;
                }};

                for (const lab of labels) {{
                    const control = controlFor(lab);
                    if (!control) continue;
                    if (kind === 'clear') {{
                        const root = control.closest('.Select') || control.closest('tr') || control.parentElement;
                        const clear = root && root.querySelector('.Select-clear-zone, .Select-clear, [aria-label="Clear value"]');
                        if (clear && visible(clear)) return tag(clear);
                        continue;
                    }}
                    return tag(control);
                }}
                return {{ selector: null }};
            }})()
            "#,
            text = text,
            kind = target.kind.as_js(),
        ))
    }
}

#[async_trait]
impl SemanticResolver for LabelResolver {
    async fn resolve(&self, surface: &dyn UiSurface, instruction: &str) -> Option<Locator> {
        let target = match parse_instruction(instruction) {
            Some(target) => target,
            None => {
                debug!("no label in instruction: {}", instruction);
                return None;
            }
        };
        let script = Self::script(&target)?;
        match surface.eval(script).await {
            Ok(value) => serde_json::from_value::<Found>(value)
                .ok()
                .and_then(|f| f.selector)
                .map(Locator::css),
            Err(e) => {
                debug!("label resolution for '{}' failed: {}", target.text, e);
                None
            }
        }
    }
}
