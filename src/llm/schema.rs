use serde_json::{Value, json};
use tracing::warn;

use crate::models::{NOT_INFORMED, NextSteps};

/// JSON kind a top-level section must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Array whose entries are objects; scalar entries get wrapped
    Records,
    /// Array of arbitrary values
    List,
    Object,
}

/// One required top-level section of the structured record
#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    /// What the section holds, shown to the model
    pub description: String,
    /// Example entry (arrays) or object, shown to the model
    pub shape: Value,
    /// Value inserted when the section is missing; only used for `Object`
    pub default: Value,
}

impl SchemaField {
    pub fn records(name: &str, description: &str, shape: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Records,
            description: description.to_string(),
            shape,
            default: json!([]),
        }
    }

    pub fn list(name: &str, description: &str, shape: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::List,
            description: description.to_string(),
            shape,
            default: json!([]),
        }
    }

    pub fn object(name: &str, description: &str, shape: Value, default: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Object,
            description: description.to_string(),
            shape,
            default,
        }
    }

    /// Whether `value` already has this field's kind
    pub fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            FieldKind::Records | FieldKind::List => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }

    pub fn default_value(&self) -> Value {
        match self.kind {
            FieldKind::Records | FieldKind::List => json!([]),
            FieldKind::Object => self.default.clone(),
        }
    }
}

/// Target structure for the structured-extraction call
///
/// Drives both the schema text in the prompt and the default-filling pass of
/// the extractor, so variants only differ by configuration.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    pub fields: Vec<SchemaField>,
}

/// Kind required for sections backed by typed record fields
fn typed_section_kind(name: &str) -> Option<FieldKind> {
    match name {
        "agreements" | "tasks" | "deliverables" => Some(FieldKind::Records),
        "next_steps" => Some(FieldKind::Object),
        _ => None,
    }
}

fn responsible_shape() -> Value {
    json!({"name": "nome da pessoa", "role": "cargo ou papel"})
}

impl SchemaDescriptor {
    /// Agreements, tasks, deliverables and next steps
    pub fn meeting_record() -> Self {
        Self {
            fields: vec![
                SchemaField::records(
                    "agreements",
                    "acordos e decisões fechados entre os participantes",
                    json!({
                        "description": "o que foi acordado",
                        "responsible": responsible_shape(),
                        "deadline": "prazo como dito na reunião",
                        "evidence": "trecho literal da transcrição"
                    }),
                ),
                SchemaField::records(
                    "tasks",
                    "ações atribuídas a alguém",
                    json!({
                        "description": "ação a executar",
                        "responsible": responsible_shape(),
                        "deadline": "prazo como dito na reunião",
                        "priority": "alta | média | baixa",
                        "evidence": "trecho literal da transcrição"
                    }),
                ),
                SchemaField::records(
                    "deliverables",
                    "artefatos concretos que alguém se comprometeu a entregar",
                    json!({
                        "description": "o que será entregue",
                        "responsible": responsible_shape(),
                        "deadline": "prazo como dito na reunião",
                        "evidence": "trecho literal da transcrição"
                    }),
                ),
                SchemaField::object(
                    "next_steps",
                    "próximos passos após a reunião",
                    json!({
                        "next_meeting": "data ou condição da próxima reunião",
                        "follow_up": "acompanhamento combinado",
                        "owner": responsible_shape()
                    }),
                    serde_json::to_value(NextSteps::default()).unwrap_or_else(|_| json!({})),
                ),
            ],
        }
    }

    /// Meeting record plus sales-methodology scoring for sales calls
    pub fn sales_call() -> Self {
        Self::meeting_record()
            .with_field(SchemaField::object(
                "methodology_scores",
                "notas de 0 a 10 por etapa da metodologia SPIN, com justificativa",
                json!({
                    "situation": {"score": "0-10", "justification": "por quê"},
                    "problem": {"score": "0-10", "justification": "por quê"},
                    "implication": {"score": "0-10", "justification": "por quê"},
                    "need_payoff": {"score": "0-10", "justification": "por quê"}
                }),
                json!({
                    "situation": {"score": NOT_INFORMED, "justification": NOT_INFORMED},
                    "problem": {"score": NOT_INFORMED, "justification": NOT_INFORMED},
                    "implication": {"score": NOT_INFORMED, "justification": NOT_INFORMED},
                    "need_payoff": {"score": NOT_INFORMED, "justification": NOT_INFORMED}
                }),
            ))
            .with_field(SchemaField::list(
                "objections",
                "objeções levantadas pelo cliente, em texto literal",
                json!("objeção do cliente"),
            ))
    }

    /// Add or replace a section
    ///
    /// The four typed sections keep their kind: a replacement for `tasks`,
    /// `agreements`, `deliverables` or `next_steps` with a different kind is
    /// ignored, since the record could no longer be deserialized.
    pub fn with_field(mut self, field: SchemaField) -> Self {
        if let Some(required) = typed_section_kind(&field.name) {
            if field.kind != required {
                warn!(
                    section = %field.name,
                    "ignoring schema field that changes the kind of a typed section"
                );
                return self;
            }
        }
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field list and JSON skeleton as shown to the model
    pub fn prompt_text(&self) -> String {
        let mut text = String::from("CAMPOS OBRIGATÓRIOS:\n");
        for field in &self.fields {
            let kind = match field.kind {
                FieldKind::Records | FieldKind::List => "lista",
                FieldKind::Object => "objeto",
            };
            text.push_str(&format!("- {} ({}): {}\n", field.name, kind, field.description));
        }

        text.push_str("\nFORMATO:\n{\n");
        let entries: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                let shape = serde_json::to_string(&field.shape).unwrap_or_default();
                match field.kind {
                    FieldKind::Records | FieldKind::List => {
                        format!("  \"{}\": [{}]", field.name, shape)
                    }
                    FieldKind::Object => format!("  \"{}\": {}", field.name, shape),
                }
            })
            .collect();
        text.push_str(&entries.join(",\n"));
        text.push_str("\n}");
        text
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::meeting_record()
    }
}
