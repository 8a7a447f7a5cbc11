use tracing::{info, warn};

use crate::config::AnalysisSettings;
use crate::llm::{
    CompletionClient, CompletionRequest, PromptTemplates, SchemaDescriptor,
    build_structured_prompt, extract, fallback_record,
};
use crate::models::StructuredRecord;

/// Configuration for Stage 2
#[derive(Debug, Clone)]
pub struct Stage2Config {
    /// Zero by default; parseable output matters more than variety here
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for Stage2Config {
    fn default() -> Self {
        Self::from(&AnalysisSettings::default())
    }
}

impl From<&AnalysisSettings> for Stage2Config {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            temperature: settings.structured_temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Execute Stage 2: structured extraction
///
/// Never fails. A completion error or unparseable answer yields the default
/// record with a diagnostic.
pub async fn execute_stage2(
    client: &dyn CompletionClient,
    templates: &PromptTemplates,
    schema: &SchemaDescriptor,
    narrative: &str,
    transcript: &str,
    context_block: &str,
    config: &Stage2Config,
) -> StructuredRecord {
    let prompt = build_structured_prompt(schema, narrative, transcript, context_block);
    let request = CompletionRequest::new(prompt, config.temperature, config.max_tokens)
        .with_system(templates.structured_system.clone());

    let record = match client.complete(&request).await {
        Ok(raw) => extract(&raw, schema),
        Err(e) => {
            warn!("Stage 2: structured generation failed: {}", e);
            fallback_record(schema, String::new(), e.to_string())
        }
    };

    info!(
        "Stage 2: {} agreements, {} tasks, {} deliverables{}",
        record.agreements.len(),
        record.tasks.len(),
        record.deliverables.len(),
        if record.is_fallback() { " (defaults)" } else { "" }
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage2_config_default() {
        let config = Stage2Config::default();
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 4000);
    }
}
