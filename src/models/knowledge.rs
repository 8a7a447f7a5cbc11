use serde::{Deserialize, Serialize};
use serde_json::Value;

const CONTENT_KEYS: [&str; 4] = ["content", "text", "page_content", "conteudo"];
const SOURCE_KEYS: [&str; 4] = ["source", "title", "fonte", "titulo"];

/// Reference text stored in the vector database, retrieved read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl KnowledgeDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            source: None,
            similarity: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Build from an untyped document returned by the vector database
    ///
    /// The text body is taken from the first recognised content key; a
    /// document without one has empty content.
    pub fn from_value(doc: &Value) -> Self {
        let first_string = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| doc.get(*k).and_then(Value::as_str))
                .map(str::to_string)
        };

        let id = doc.get("_id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Self {
            id,
            content: first_string(&CONTENT_KEYS).unwrap_or_default(),
            source: first_string(&SOURCE_KEYS),
            similarity: doc.get("$similarity").and_then(Value::as_f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_reads_known_keys() {
        let doc = serde_json::json!({
            "_id": "abc",
            "text": "Metodologia SPIN",
            "title": "Playbook de vendas",
            "$similarity": 0.91
        });
        let parsed = KnowledgeDocument::from_value(&doc);
        assert_eq!(parsed.id.as_deref(), Some("abc"));
        assert_eq!(parsed.content, "Metodologia SPIN");
        assert_eq!(parsed.source.as_deref(), Some("Playbook de vendas"));
        assert_eq!(parsed.similarity, Some(0.91));
    }

    #[test]
    fn test_from_value_missing_content() {
        let parsed = KnowledgeDocument::from_value(&serde_json::json!({"_id": 7}));
        assert_eq!(parsed.id.as_deref(), Some("7"));
        assert!(parsed.content.is_empty());
        assert!(parsed.source.is_none());
    }
}
