use crate::models::{KnowledgeDocument, truncate_chars};

/// Characters stripped from retrieved text so it cannot be mistaken for
/// record delimiters inside the prompt
const DELIMITER_CHARS: [char; 4] = ['{', '}', '"', '\''];

fn sanitize(text: &str) -> String {
    text.replace(DELIMITER_CHARS, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format retrieved documents into a bounded context block
///
/// Documents keep their rank order and are labelled `[Fonte N]`. Each snippet
/// is cut to `per_doc_chars` characters. An empty slice, or one whose
/// documents have no usable text, gives an empty string.
pub fn assemble_context(docs: &[KnowledgeDocument], per_doc_chars: usize) -> String {
    let mut lines = Vec::with_capacity(docs.len());

    for doc in docs {
        let content = sanitize(&doc.content);
        if content.is_empty() {
            continue;
        }
        let snippet = truncate_chars(&content, per_doc_chars);
        let ordinal = lines.len() + 1;
        let source = doc.source.as_deref().map(sanitize).filter(|s| !s.is_empty());

        lines.push(match source {
            Some(source) => format!("[Fonte {}] {}: {}", ordinal, source, snippet),
            None => format!("[Fonte {}] {}", ordinal, snippet),
        });
    }

    lines.join("\n")
}
