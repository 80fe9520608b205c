use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One cost override, e.g. `{ field: "bag_paper_price_override", value: 0.25 }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostOverride {
    pub field: String,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub value: String,
}

/// Input of one job. Created by the caller, consumed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    /// Form field label → value
    #[serde(deserialize_with = "deserialize_form_data")]
    pub form_data: BTreeMap<String, String>,
    #[serde(default)]
    pub cost_overrides: Vec<CostOverride>,
    /// Notification recipient
    #[serde(default, alias = "sender_email")]
    pub sender_email: Option<String>,
    #[serde(default, alias = "spec_sheet_id")]
    pub spec_sheet_id: Option<String>,
    #[serde(default, alias = "tracking_id")]
    pub tracking_id: Option<String>,
    #[serde(default, alias = "row_index")]
    pub row_index: Option<usize>,
}

impl JobPayload {
    /// Form value for `label`, trimmed; empty values count as absent
    pub fn value(&self, label: &str) -> Option<&str> {
        self.form_data
            .get(label)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First override for `field`, in submission order
    pub fn override_value(&self, field: &str) -> Option<&str> {
        self.cost_overrides
            .iter()
            .find(|o| o.field == field)
            .map(|o| o.value.trim())
            .filter(|v| !v.is_empty())
    }
}

// Form values and override values arrive as either strings or numbers
fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Visitor;

    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(LenientVisitor)
}

fn deserialize_form_data<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Lenient(#[serde(deserialize_with = "deserialize_lenient_string")] String);

    let raw = BTreeMap::<String, Lenient>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, Lenient(v))| (k, v)).collect())
}
