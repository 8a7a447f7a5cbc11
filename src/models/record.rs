//! Structured record recovered from the second model call.
//!
//! Every section is always present: arrays default to empty and objects to
//! values whose text leaves read [`NOT_INFORMED`]. Leaves are free text and
//! are never re-typed; non-string scalars are kept as their JSON text.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder for any text leaf the model did not provide
pub const NOT_INFORMED: &str = "Não informado";

fn not_informed() -> String {
    NOT_INFORMED.to_string()
}

fn free_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => not_informed(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    })
}

fn optional_free_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_responsible<'de, D>(deserializer: D) -> Result<Responsible, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Responsible::default()),
        Some(Value::String(name)) => Ok(Responsible::named(name)),
        Some(object @ Value::Object(_)) => serde_json::from_value(object).map_err(D::Error::custom),
        Some(other) => Ok(Responsible::named(other.to_string())),
    }
}

/// Person or party accountable for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Responsible {
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub name: String,
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub role: String,
}

impl Responsible {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: not_informed(),
        }
    }
}

impl Default for Responsible {
    fn default() -> Self {
        Self {
            name: not_informed(),
            role: not_informed(),
        }
    }
}

/// Something the participants agreed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_responsible")]
    pub responsible: Responsible,
    /// Natural-language deadline, never parsed into a date
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub deadline: String,
    /// Verbatim quote from the transcript
    #[serde(
        default,
        deserialize_with = "optional_free_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub evidence: Option<String>,
}

/// An action item assigned during the meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_responsible")]
    pub responsible: Responsible,
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub deadline: String,
    /// "alta", "média" or "baixa" when the model follows instructions
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub priority: String,
    #[serde(
        default,
        deserialize_with = "optional_free_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub evidence: Option<String>,
}

/// A concrete artifact someone committed to hand over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_responsible")]
    pub responsible: Responsible,
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub deadline: String,
    #[serde(
        default,
        deserialize_with = "optional_free_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextSteps {
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub next_meeting: String,
    #[serde(default = "not_informed", deserialize_with = "free_text")]
    pub follow_up: String,
    #[serde(default, deserialize_with = "lenient_responsible")]
    pub owner: Responsible,
}

impl Default for NextSteps {
    fn default() -> Self {
        Self {
            next_meeting: not_informed(),
            follow_up: not_informed(),
            owner: Responsible::default(),
        }
    }
}

/// Why structured extraction fell back to defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionDiagnostic {
    /// The unparsed model output, verbatim
    #[serde(default)]
    pub raw_text: String,
    #[serde(default)]
    pub error: String,
}

/// Agreements, tasks, deliverables and next steps of one meeting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    #[serde(default)]
    pub agreements: Vec<Agreement>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub next_steps: NextSteps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<ExtractionDiagnostic>,
    /// Additional top-level sections declared by a custom schema
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StructuredRecord {
    /// Default-valued record carrying the raw output that could not be parsed
    pub fn fallback(raw_text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            diagnostic: Some(ExtractionDiagnostic {
                raw_text: raw_text.into(),
                error: error.into(),
            }),
            ..Default::default()
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.diagnostic.is_some()
    }

    /// True when no agreements, tasks or deliverables were found
    pub fn has_no_items(&self) -> bool {
        self.agreements.is_empty() && self.tasks.is_empty() && self.deliverables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_has_every_section() {
        let value = serde_json::to_value(StructuredRecord::default()).unwrap();
        assert_eq!(value["agreements"], serde_json::json!([]));
        assert_eq!(value["tasks"], serde_json::json!([]));
        assert_eq!(value["deliverables"], serde_json::json!([]));
        assert_eq!(value["next_steps"]["next_meeting"], NOT_INFORMED);
        assert_eq!(value["next_steps"]["owner"]["name"], NOT_INFORMED);
        assert!(value.get("diagnostic").is_none());
    }

    #[test]
    fn test_leaves_are_free_text() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "description": "Enviar proposta",
            "responsible": "Maria",
            "deadline": 5,
            "priority": null
        }))
        .unwrap();
        assert_eq!(task.responsible.name, "Maria");
        assert_eq!(task.responsible.role, NOT_INFORMED);
        assert_eq!(task.deadline, "5");
        assert_eq!(task.priority, NOT_INFORMED);
        assert_eq!(task.evidence, None);
    }

    #[test]
    fn test_unknown_sections_kept_in_extra() {
        let record: StructuredRecord = serde_json::from_value(serde_json::json!({
            "tasks": [],
            "spin_scores": {"situation": 7}
        }))
        .unwrap();
        assert_eq!(record.extra["spin_scores"]["situation"], 7);
        assert!(record.has_no_items());
    }

    #[test]
    fn test_fallback_carries_diagnostic() {
        let record = StructuredRecord::fallback("texto cru", "EOF while parsing");
        assert!(record.is_fallback());
        assert!(record.has_no_items());
        assert_eq!(record.next_steps, NextSteps::default());
        assert_eq!(record.diagnostic.unwrap().raw_text, "texto cru");
    }
}
