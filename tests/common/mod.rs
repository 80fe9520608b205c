//! Scripted stand-ins for the browser, resolver, notifier and sessions
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

use costing_automation::browser::{Session, SessionFactory};
use costing_automation::config::{Config, Credentials, NavigationStep};
use costing_automation::error::AppResult;
use costing_automation::infrastructure::{Key, Locator, UiSurface};
use costing_automation::models::JobPayload;
use costing_automation::resolver::SemanticResolver;
use costing_automation::services::notification::{NotificationSender, NotificationSummary};

pub const COST_LABEL: &str = "Cost £/case";

/// Locator the fake resolver hands out for `label`
pub fn loc(label: &str) -> Locator {
    Locator::css(format!(r#"[data-label="{}"]"#, label))
}

/// Quoted text of an instruction, or the whole instruction
fn instruction_key(instruction: &str) -> String {
    let mut parts = instruction.split('"');
    match (parts.next(), parts.next()) {
        (Some(_), Some(quoted)) => quoted.to_string(),
        _ => instruction.to_string(),
    }
}

/// Resolves instructions for a fixed set of labels; clear buttons never exist
#[derive(Default)]
pub struct FakeResolver {
    known: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FakeResolver {
    pub fn knowing<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: labels.into_iter().map(Into::into).collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SemanticResolver for FakeResolver {
    async fn resolve(&self, _surface: &dyn UiSurface, instruction: &str) -> Option<Locator> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if instruction.starts_with("Click the clear") {
            return None;
        }
        let key = instruction_key(instruction);
        self.known.contains(&key).then(|| loc(&key))
    }
}

#[derive(Default)]
struct SurfaceState {
    values: HashMap<String, String>,
    /// Fills to silently ignore per selector
    dropped_fills: HashMap<String, usize>,
    fill_counts: HashMap<String, usize>,
    /// Scripted outcome of each Enter per widget; empty string = nothing picked
    enter_results: HashMap<String, VecDeque<String>>,
    enter_counts: HashMap<String, usize>,
    selected: HashMap<String, String>,
    focused: Option<String>,
    typed: String,
    /// Inputs the cost table needs before it computes
    required_values: Vec<String>,
    required_selections: Vec<String>,
    costs: [String; 3],
    cost_reads: usize,
    slot_reads: usize,
    /// Labeled rows render without a value cell
    unlabeled_table: bool,
    fail_login: bool,
    crash_on_goto: bool,
    events: Vec<String>,
}

/// In-memory costing form that computes its cost table once every required
/// input holds a non-zero value and every required selection is made
#[derive(Clone, Default)]
pub struct FakeSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_costs(self, costs: [&str; 3]) -> Self {
        self.state.lock().unwrap().costs = costs.map(str::to_string);
        self
    }

    /// Only the fixed output cells carry the cost table
    pub fn without_labeled_rows(self) -> Self {
        self.state.lock().unwrap().unlabeled_table = true;
        self
    }

    pub fn requiring_values(self, labels: &[&str]) -> Self {
        self.state.lock().unwrap().required_values = labels.iter().map(|l| loc(l).to_string()).collect();
        self
    }

    pub fn requiring_selections(self, labels: &[&str]) -> Self {
        self.state.lock().unwrap().required_selections = labels.iter().map(|l| loc(l).to_string()).collect();
        self
    }

    pub fn set_value(&self, label: &str, value: &str) {
        self.state.lock().unwrap().values.insert(loc(label).to_string(), value.to_string());
    }

    pub fn drop_fills(&self, label: &str, count: usize) {
        self.state.lock().unwrap().dropped_fills.insert(loc(label).to_string(), count);
    }

    pub fn script_enters(&self, label: &str, results: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .enter_results
            .insert(loc(label).to_string(), results.iter().map(|s| s.to_string()).collect());
    }

    /// Navigation panics, as a broken page driver would
    pub fn crash_on_goto(&self) {
        self.state.lock().unwrap().crash_on_goto = true;
    }

    pub fn fail_login(&self) {
        self.state.lock().unwrap().fail_login = true;
    }

    pub fn value(&self, label: &str) -> Option<String> {
        self.state.lock().unwrap().values.get(&loc(label).to_string()).cloned()
    }

    pub fn selected(&self, label: &str) -> Option<String> {
        self.state.lock().unwrap().selected.get(&loc(label).to_string()).cloned()
    }

    pub fn fill_count(&self, label: &str) -> usize {
        self.state.lock().unwrap().fill_counts.get(&loc(label).to_string()).copied().unwrap_or(0)
    }

    pub fn enter_count(&self, label: &str) -> usize {
        self.state.lock().unwrap().enter_counts.get(&loc(label).to_string()).copied().unwrap_or(0)
    }

    /// Number of times the cost table was read through its labels
    pub fn cost_reads(&self) -> usize {
        self.state.lock().unwrap().cost_reads
    }

    /// Number of fixed output cells read by id
    pub fn slot_reads(&self) -> usize {
        self.state.lock().unwrap().slot_reads
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    fn computed(state: &SurfaceState) -> bool {
        let filled = state.required_values.iter().all(|s| {
            state
                .values
                .get(s)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .is_some_and(|v| v > 0.0)
        });
        let selected = state
            .required_selections
            .iter()
            .all(|s| state.selected.get(s).is_some_and(|v| !v.is_empty()));
        filled && selected
    }

    fn table_cell(state: &SurfaceState, index: usize) -> String {
        if Self::computed(state) {
            state.costs[index].clone()
        } else {
            "£0.00".to_string()
        }
    }
}

const METRICS: [&str; 3] = [COST_LABEL, "Total Labour & Sup", "Overhead Cost/job"];
const SLOTS: [&str; 3] = ["tdf_153", "tdf_137", "tdf_142"];

#[async_trait]
impl UiSurface for FakeSurface {
    async fn goto(&self, url: &str) -> Result<()> {
        let crash = {
            let mut state = self.state.lock().unwrap();
            state.events.push(format!("goto {}", url));
            state.crash_on_goto
        };
        if crash {
            panic!("page driver crashed on {}", url);
        }
        Ok(())
    }

    async fn wait_for_url(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_login {
            bail!("timed out waiting for {}", url);
        }
        state.events.push(format!("at {}", url));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.focused = Some(locator.to_string());
        state.typed.clear();
        state.events.push(format!("click {}", locator));
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let key = locator.to_string();
        *state.fill_counts.entry(key.clone()).or_default() += 1;
        if let Some(remaining) = state.dropped_fills.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(());
            }
        }
        state.values.insert(key, value.to_string());
        Ok(())
    }

    async fn select_option(&self, locator: &Locator, label: &str) -> Result<()> {
        self.state.lock().unwrap().selected.insert(locator.to_string(), label.to_string());
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.focused = Some(locator.to_string());
        state.typed.push_str(text);
        Ok(())
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        if key != Key::Enter {
            return Ok(());
        }
        let mut state = self.state.lock().unwrap();
        let Some(focused) = state.focused.clone() else {
            return Ok(());
        };
        *state.enter_counts.entry(focused.clone()).or_default() += 1;
        let scripted = state.enter_results.get_mut(&focused).and_then(|q| q.pop_front());
        let picked = scripted.unwrap_or_else(|| match state.typed.trim() {
            "" => "Option 1".to_string(),
            query => query.to_string(),
        });
        state.selected.insert(focused, picked);
        Ok(())
    }

    async fn read_value(&self, locator: &Locator) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().values.get(&locator.to_string()).cloned())
    }

    async fn selected_option_text(&self, locator: &Locator) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().selected.get(&locator.to_string()).cloned())
    }

    async fn scoped_text(&self, locator: &Locator, _scope: &str, target: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        let picked = state.selected.get(&locator.to_string()).filter(|v| !v.is_empty()).cloned();
        Ok(if target.contains("value-label") {
            picked
        } else if target.contains("placeholder") && picked.is_none() {
            Some("Search and select...".to_string())
        } else {
            None
        })
    }

    async fn cell_after_label(&self, label: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        if label == COST_LABEL {
            state.cost_reads += 1;
        }
        if state.unlabeled_table {
            return Ok(None);
        }
        let index = METRICS.iter().position(|m| *m == label);
        Ok(index.map(|i| Self::table_cell(&state, i)))
    }

    async fn text_by_id(&self, id: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        state.slot_reads += 1;
        let index = SLOTS.iter().position(|s| *s == id);
        Ok(index.map(|i| Self::table_cell(&state, i)))
    }

    async fn eval(&self, _script: String) -> Result<JsonValue> {
        Ok(JsonValue::Null)
    }
}

/// Every label the costing flow touches, navigation included
pub fn form_labels() -> Vec<&'static str> {
    vec![
        "Portal",
        "New costing",
        "Description",
        "Bag type",
        "Face Width mm",
        "Gusset mm",
        "Bag Length mm",
        "BAG PAPER",
        "Bag Paper Price Override",
        "Packed in",
        "Box Type*",
        "Bags per box",
        "No of Boxes Ordered",
        "Boxes per Pallet",
        "Machine",
    ]
}

/// Config with no waits and a two-step navigation script
pub fn fast_config() -> Config {
    let mut config = Config {
        settle_ms: 0,
        credentials: Some(Credentials {
            operator_id: "operator".into(),
            secret: "secret".into(),
        }),
        ..Config::default()
    };
    config.target.steps = vec![
        NavigationStep {
            instruction: r#"Find and click the "Portal" link or button"#.into(),
            optional: false,
            wait_ms: 0,
        },
        NavigationStep {
            instruction: r#"Find and click the "New costing" button"#.into(),
            optional: false,
            wait_ms: 0,
        },
        NavigationStep {
            instruction: r#"Find and click the "Collapse Side Panel" button"#.into(),
            optional: true,
            wait_ms: 0,
        },
    ];
    config
}

pub fn payload(row: usize, form: serde_json::Value) -> JobPayload {
    serde_json::from_value(serde_json::json!({
        "formData": form,
        "sender_email": format!("buyer{}@example.com", row),
        "spec_sheet_id": format!("SS-{}", row),
        "rowIndex": row,
    }))
    .unwrap()
}

pub fn bag_form() -> serde_json::Value {
    serde_json::json!({
        "Description": "Test bag",
        "Face Width mm": "120mm",
        "Gusset mm": "60mm",
        "Bag Length mm": "250",
        "Bags per box": "500",
        "No of boxes ordered": "20"
    })
}

/// Records every notification instead of sending it
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, NotificationSummary)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, NotificationSummary)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, recipient: &str, summary: &NotificationSummary, _transcript: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push((recipient.to_string(), summary.clone()));
        Ok(())
    }
}

/// Hands out `FakeSurface` sessions and counts opens and closes
pub struct FakeSessionFactory {
    surface: FakeSurface,
    pub opened: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    fail_open: bool,
}

impl FakeSessionFactory {
    pub fn new(surface: FakeSurface) -> Self {
        Self {
            surface,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(FakeSurface::new())
        }
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    surface: FakeSurface,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Session for FakeSession {
    fn surface(&self) -> &dyn UiSurface {
        &self.surface
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> Result<Box<dyn Session>> {
        if self.fail_open {
            bail!("no browser available");
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            surface: self.surface.clone(),
            closed: Arc::clone(&self.closed),
        }))
    }
}
