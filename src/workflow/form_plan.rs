//! Costing form plan
//!
//! Turns a payload into the ordered steps of the costing form. Fields whose
//! payload value is empty are left out; a few fields carry fixed defaults.

use crate::infrastructure::Key;
use crate::models::JobPayload;
use crate::services::cost_extraction::RepairPlan;
use crate::services::field_transaction::FieldSpec;
use crate::services::sanitize::sanitize_numeric;
use crate::services::selection::{SelectionProbe, SelectionTrigger};
use crate::services::step_runner::{FormStep, SelectionSpec};

pub const BAG_PAPER_OVERRIDE: &str = "bag_paper_price_override";

pub const DEFAULT_BAG_TYPE: &str = "Internal handle NEW";
pub const DEFAULT_PACKED_IN: &str = "Box";
pub const DEFAULT_BOXES_PER_PALLET: &str = "10";

/// Dimension and quantity inputs the cost table depends on
pub const REPAIR_FIELDS: [&str; 5] = [
    "Face Width mm",
    "Gusset mm",
    "Bag Length mm",
    "Bags per box",
    "No of Boxes Ordered",
];

/// Labels echoed back after extraction
pub const ECHO_FIELDS: [&str; 14] = [
    "Description",
    "Bag type",
    "Face Width mm",
    "Gusset mm",
    "Bag Length mm",
    "Bottom glue",
    "Packed in",
    "Pack size",
    "No of packs ordered",
    "Machine",
    "Machines per supervisor",
    "Bags per box",
    "No of Boxes Ordered",
    "Boxes per Pallet",
];

const BAG_PAPER: &str = "BAG PAPER";
const BOX_TYPE: &str = "Box Type*";
const MACHINE: &str = "Machine";

/// Payload keys accepted for a form label besides the label itself
static PAYLOAD_ALIASES: phf::Map<&'static str, &'static [&'static str]> = phf::phf_map! {
    "No of Boxes Ordered" => &["No of boxes ordered"],
    "Pack Size" => &["Pack size"],
    "Box Type*" => &["Box Type", "Box type"],
};

/// Payload value for a form label, trying known aliases
pub fn payload_value<'a>(payload: &'a JobPayload, label: &str) -> Option<&'a str> {
    payload.value(label).or_else(|| {
        PAYLOAD_ALIASES
            .get(label)
            .and_then(|aliases| aliases.iter().find_map(|alias| payload.value(alias)))
    })
}

/// Group of steps filled together
#[derive(Debug, Clone, PartialEq)]
pub struct FormSection {
    pub title: &'static str,
    /// Scroll to the bottom of the form before this section
    pub scroll_first: bool,
    pub steps: Vec<FormStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPlan {
    pub sections: Vec<FormSection>,
    pub repair: RepairPlan,
}

impl FormPlan {
    pub fn steps(&self) -> impl Iterator<Item = &FormStep> {
        self.sections.iter().flat_map(|s| s.steps.iter())
    }

    pub fn build(payload: &JobPayload, machine: &str) -> Self {
        // A numeric value with no digits left after sanitizing is never entered
        let figure = |label: &str| payload_value(payload, label).filter(|v| !sanitize_numeric(v).is_empty());
        let numeric = |label: &str| figure(label).map(|v| FormStep::field(FieldSpec::numeric(label, v)));

        let bag_paper = FormStep::Selection(SelectionSpec {
            label: BAG_PAPER.to_string(),
            trigger: SelectionTrigger::ConfirmTop,
            probe: SelectionProbe::with_raw_control("_fid_477"),
            expected: Vec::new(),
        });
        let box_type = FormStep::Selection(SelectionSpec {
            label: BOX_TYPE.to_string(),
            trigger: SelectionTrigger::AdvanceThenConfirm,
            probe: SelectionProbe::with_raw_control("_fid_514"),
            expected: Vec::new(),
        });

        let mut bag_info = Vec::new();
        if let Some(description) = payload_value(payload, "Description") {
            bag_info.push(FormStep::field(FieldSpec::text("Description", description)));
        }
        let bag_type = payload_value(payload, "Bag type").unwrap_or(DEFAULT_BAG_TYPE);
        bag_info.push(FormStep::field(FieldSpec::select("Bag type", bag_type)));
        bag_info.extend(["Face Width mm", "Gusset mm", "Bag Length mm"].into_iter().filter_map(numeric));

        let mut materials = vec![bag_paper.clone()];
        if let Some(price) = payload
            .override_value(BAG_PAPER_OVERRIDE)
            .filter(|v| !sanitize_numeric(v).is_empty())
        {
            materials.push(FormStep::field(FieldSpec::numeric("Bag Paper Price Override", price)));
        }

        let packed_in = payload_value(payload, "Packed in").unwrap_or(DEFAULT_PACKED_IN);
        let mut packing = vec![FormStep::field(FieldSpec::select("Packed in", packed_in)), box_type.clone()];
        packing.extend(["Bags per box", "No of Boxes Ordered"].into_iter().filter_map(numeric));
        let per_pallet = figure("Boxes per Pallet").unwrap_or(DEFAULT_BOXES_PER_PALLET);
        packing.push(FormStep::Field {
            spec: FieldSpec::numeric("Boxes per Pallet", per_pallet),
            commit_key: Some(Key::Tab),
        });

        let production = vec![FormStep::Selection(SelectionSpec {
            label: MACHINE.to_string(),
            trigger: SelectionTrigger::SearchThenConfirm {
                query: machine.to_string(),
            },
            probe: SelectionProbe::with_raw_control("_fid_539"),
            expected: machine_tokens(machine),
        })];

        let repair = RepairPlan {
            fields: REPAIR_FIELDS.into_iter().filter_map(numeric).collect(),
            selections: vec![bag_paper, box_type],
        };

        Self {
            sections: vec![
                FormSection {
                    title: "Finished Bag Information",
                    scroll_first: false,
                    steps: bag_info,
                },
                FormSection {
                    title: "Materials",
                    scroll_first: false,
                    steps: materials,
                },
                FormSection {
                    title: "Packing",
                    scroll_first: false,
                    steps: packing,
                },
                FormSection {
                    title: "Production",
                    scroll_first: true,
                    steps: production,
                },
            ],
            repair,
        }
    }
}

/// Words of the machine name, parentheses stripped:
/// `"SOS 12 (1B) 50,000/shift"` → `["SOS", "12", "1B", "50,000/shift"]`
fn machine_tokens(machine: &str) -> Vec<String> {
    machine
        .split_whitespace()
        .map(|t| t.trim_matches(|c| c == '(' || c == ')'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
