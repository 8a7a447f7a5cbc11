//! Recovery of a structured record from free-text model output.
//!
//! The model is told to answer with JSON only, but prose around the object,
//! truncated output and missing sections all happen. Extraction is total:
//! whatever the input, a record with every section present comes back.

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::{FieldKind, SchemaDescriptor};
use crate::models::{MeetingMetadata, StructuredRecord};

/// Greedy span from the first `{` to the last `}`
pub fn locate_json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Parse `raw` into a record conforming to `schema`
///
/// Never fails. When no object can be parsed the result is the default record
/// with a diagnostic holding `raw` verbatim. Re-extracting a serialized result
/// yields the same record.
pub fn extract(raw: &str, schema: &SchemaDescriptor) -> StructuredRecord {
    let Some(span) = locate_json_span(raw) else {
        warn!("no JSON object found in structured response");
        return fallback_record(schema, raw, "no JSON object found in response");
    };

    let mut object = match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return fallback_record(schema, raw, "response JSON is not an object");
        }
        Err(e) => {
            warn!(error = %e, "structured response is not valid JSON");
            return fallback_record(schema, raw, e.to_string());
        }
    };

    let backfilled = backfill(&mut object, schema);
    if !backfilled.is_empty() {
        debug!(fields = ?backfilled, "backfilled missing sections with defaults");
    }

    match serde_json::from_value::<StructuredRecord>(Value::Object(object)) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "structured response does not match the record shape");
            fallback_record(schema, raw, e.to_string())
        }
    }
}

/// Default record for `schema` carrying the output that could not be used
///
/// Every section the schema declares is present, including sections beyond
/// the four typed ones.
pub fn fallback_record(
    schema: &SchemaDescriptor,
    raw: impl Into<String>,
    error: impl Into<String>,
) -> StructuredRecord {
    let mut object = Map::new();
    backfill(&mut object, schema);

    let defaults = serde_json::from_value::<StructuredRecord>(Value::Object(object))
        .unwrap_or_else(|e| {
            warn!(error = %e, "schema defaults do not match the record shape");
            StructuredRecord::default()
        });

    StructuredRecord {
        diagnostic: StructuredRecord::fallback(raw, error).diagnostic,
        ..defaults
    }
}

/// Make every schema section present with its declared kind
///
/// Returns the names of sections that were replaced by their default.
fn backfill(object: &mut Map<String, Value>, schema: &SchemaDescriptor) -> Vec<String> {
    let mut backfilled = Vec::new();

    for field in &schema.fields {
        match object.get_mut(&field.name) {
            Some(value) if field.accepts(value) => {
                if field.kind == FieldKind::Records {
                    normalize_records(value);
                }
            }
            _ => {
                object.insert(field.name.clone(), field.default_value());
                backfilled.push(field.name.clone());
            }
        }
    }

    backfilled
}

/// Drop null entries and wrap scalar entries as `{"description": ...}`
fn normalize_records(value: &mut Value) {
    let Value::Array(items) = value else {
        return;
    };
    let entries = std::mem::take(items);
    *items = entries
        .into_iter()
        .filter(|item| !item.is_null())
        .map(|item| match item {
            Value::Object(_) => item,
            Value::String(text) => json!({ "description": text }),
            other => json!({ "description": other.to_string() }),
        })
        .collect();
}

/// Parse the metadata answer, falling back to "not identified" values
pub fn extract_metadata(raw: &str) -> MeetingMetadata {
    match locate_json_span(raw).map(|span| serde_json::from_str::<MeetingMetadata>(span)) {
        Some(Ok(metadata)) => metadata,
        Some(Err(e)) => {
            warn!(error = %e, "metadata response is not valid JSON");
            MeetingMetadata::default()
        }
        None => {
            warn!("no JSON object found in metadata response");
            MeetingMetadata::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::SchemaField;
    use crate::models::{NOT_INFORMED, NextSteps};

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor::meeting_record()
    }

    fn assert_default_sections(record: &StructuredRecord) {
        assert!(record.agreements.is_empty());
        assert!(record.tasks.is_empty());
        assert!(record.deliverables.is_empty());
        assert_eq!(record.next_steps, NextSteps::default());
    }

    #[test]
    fn test_locate_span() {
        assert_eq!(locate_json_span("Segue: {\"a\": 1} fim"), Some("{\"a\": 1}"));
        assert_eq!(locate_json_span("{a} e {b}"), Some("{a} e {b}"));
        assert_eq!(locate_json_span("sem chaves"), None);
        assert_eq!(locate_json_span("} invertido {"), None);
        assert_eq!(locate_json_span(""), None);
    }

    #[test]
    fn test_total_on_degenerate_inputs() {
        for raw in ["", "Nenhuma ação identificada.", "{", "}{", "{tasks: [}", "[1, 2]"] {
            let record = extract(raw, &schema());
            assert_default_sections(&record);
            let diagnostic = record.diagnostic.expect("diagnostic expected");
            assert_eq!(diagnostic.raw_text, raw);
            assert!(!diagnostic.error.is_empty());
        }
    }

    #[test]
    fn test_total_on_degenerate_inputs_with_extra_sections() {
        let schema = SchemaDescriptor::sales_call();
        for raw in ["", "Nenhuma ação identificada.", "{", "}{", "{tasks: [}", "[1, 2]"] {
            let record = extract(raw, &schema);
            assert_default_sections(&record);
            assert_eq!(record.extra["objections"], json!([]));
            assert_eq!(
                record.extra["methodology_scores"]["situation"]["score"],
                NOT_INFORMED
            );
            assert_eq!(record.diagnostic.expect("diagnostic expected").raw_text, raw);
        }
    }

    #[test]
    fn test_fallback_record_matches_reextraction() {
        let schema = SchemaDescriptor::sales_call();
        let first = extract("texto sem json", &schema);
        let keys: Vec<&str> = first.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, ["methodology_scores", "objections"]);

        let second = extract(&serde_json::to_string(&first).unwrap(), &schema);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_record_without_raw_text() {
        let record = fallback_record(&SchemaDescriptor::sales_call(), "", "provider error 503");
        assert!(record.has_no_items());
        assert!(record.extra.contains_key("objections"));
        let diagnostic = record.diagnostic.unwrap();
        assert!(diagnostic.raw_text.is_empty());
        assert_eq!(diagnostic.error, "provider error 503");
    }

    #[test]
    fn test_unbalanced_fragment_in_prose() {
        let raw = "Aqui está o resultado:\n{\"tasks\": [{\"description\": \"Enviar proposta\"}\nEspero ter ajudado.";
        let record = extract(raw, &schema());
        assert_default_sections(&record);
        assert_eq!(record.diagnostic.unwrap().raw_text, raw);
    }

    #[test]
    fn test_well_formed_with_surrounding_prose() {
        let raw = r#"Claro! ```json
{
  "agreements": [],
  "tasks": [
    {
      "description": "Enviar a proposta revisada",
      "responsible": {"name": "Maria", "role": "Vendedora"},
      "deadline": "até sexta-feira",
      "priority": "alta",
      "evidence": "Maria vai enviar a proposta até sexta-feira"
    }
  ],
  "deliverables": [],
  "next_steps": {"next_meeting": "segunda-feira", "follow_up": "revisar proposta", "owner": {"name": "Maria"}}
}
```"#;
        let record = extract(raw, &schema());
        assert!(record.diagnostic.is_none());
        assert_eq!(record.tasks.len(), 1);
        let task = &record.tasks[0];
        assert_eq!(task.responsible.name, "Maria");
        assert!(task.deadline.contains("sexta"));
        assert_eq!(record.next_steps.owner.role, NOT_INFORMED);
    }

    #[test]
    fn test_missing_and_mistyped_sections_backfilled() {
        let raw = r#"{"tasks": "nenhuma", "next_steps": null, "agreements": [null, "Reunião quinzenal", 3]}"#;
        let record = extract(raw, &schema());
        assert!(record.diagnostic.is_none());
        assert!(record.tasks.is_empty());
        assert!(record.deliverables.is_empty());
        assert_eq!(record.next_steps, NextSteps::default());
        assert_eq!(record.agreements.len(), 2);
        assert_eq!(record.agreements[0].description, "Reunião quinzenal");
        assert_eq!(record.agreements[0].deadline, NOT_INFORMED);
        assert_eq!(record.agreements[1].description, "3");
    }

    #[test]
    fn test_leaf_values_pass_through() {
        let raw = r#"{"tasks": [{"description": "Ligar", "deadline": "2024-13-45", "priority": "urgentíssima"}]}"#;
        let record = extract(raw, &schema());
        assert_eq!(record.tasks[0].deadline, "2024-13-45");
        assert_eq!(record.tasks[0].priority, "urgentíssima");
    }

    #[test]
    fn test_custom_schema_sections_backfilled() {
        let record = extract(r#"{"tasks": []}"#, &SchemaDescriptor::sales_call());
        assert_eq!(record.extra["objections"], json!([]));
        assert_eq!(
            record.extra["methodology_scores"]["problem"]["score"],
            NOT_INFORMED
        );
    }

    #[test]
    fn test_kind_swap_on_typed_section_keeps_records() {
        let schema = SchemaDescriptor::meeting_record().with_field(SchemaField::list(
            "tasks",
            "tarefas",
            json!("texto"),
        ));
        let raw = r#"{"tasks": ["Enviar proposta"], "agreements": [{"description": "Preço fechado"}]}"#;
        let record = extract(raw, &schema);
        assert!(record.diagnostic.is_none());
        assert_eq!(record.tasks[0].description, "Enviar proposta");
        assert_eq!(record.agreements[0].description, "Preço fechado");
    }

    #[test]
    fn test_idempotent_over_serialization() {
        let inputs = [
            "",
            "texto sem estrutura",
            "{\"tasks\": [{\"description\": \"x\"",
            r#"{"tasks": [{"description": "Enviar", "responsible": "Maria", "deadline": "sexta"}]}"#,
            r#"{"agreements": ["Preço fechado"], "extra_notes": {"k": 1}}"#,
        ];
        for schema in [SchemaDescriptor::meeting_record(), SchemaDescriptor::sales_call()] {
            for raw in inputs {
                let first = extract(raw, &schema);
                let serialized = serde_json::to_string(&first).unwrap();
                let second = extract(&serialized, &schema);
                assert_eq!(first, second, "not idempotent for {raw:?}");
            }
        }
    }

    #[test]
    fn test_metadata_extraction_and_fallback() {
        let raw = r#"Resultado: {"date": "10/03/2025", "time": "14:00", "participants": ["Ana", "Rui"], "objective": "Revisar proposta", "topics": ["preço"]}"#;
        let metadata = extract_metadata(raw);
        assert_eq!(metadata.participants, vec!["Ana", "Rui"]);
        assert_eq!(metadata.objective, "Revisar proposta");

        let partial = extract_metadata(r#"{"date": "ontem"}"#);
        assert_eq!(partial.date, "ontem");
        assert_eq!(partial.time, MeetingMetadata::default().time);

        assert_eq!(extract_metadata("não sei"), MeetingMetadata::default());
        assert!(extract_metadata("{quebrado").known_participants().is_empty());
    }
}
