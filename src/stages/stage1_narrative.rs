use tracing::{debug, info, warn};

use crate::config::AnalysisSettings;
use crate::error::CompletionError;
use crate::llm::{CompletionClient, CompletionRequest, PromptTemplates, build_narrative_prompt};
use crate::models::MeetingInfo;

/// Configuration for Stage 1
#[derive(Debug, Clone)]
pub struct Stage1Config {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self::from(&AnalysisSettings::default())
    }
}

impl From<&AnalysisSettings> for Stage1Config {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            temperature: settings.narrative_temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Execute Stage 1: narrative analysis
///
/// `transcript` must already be capped. A failure here ends the analysis,
/// since the structured prompt is seeded with this narrative.
pub async fn execute_stage1(
    client: &dyn CompletionClient,
    templates: &PromptTemplates,
    context_block: &str,
    transcript: &str,
    meeting_info: Option<&MeetingInfo>,
    config: &Stage1Config,
) -> Result<String, CompletionError> {
    let prompt = build_narrative_prompt(templates, context_block, transcript, meeting_info);
    debug!(prompt_chars = prompt.chars().count(), "narrative prompt built");

    let request = CompletionRequest::new(prompt, config.temperature, config.max_tokens)
        .with_system(templates.narrative_system.clone());

    match client.complete(&request).await {
        Ok(narrative) => {
            info!(
                "Stage 1: narrative generated by {} ({} chars)",
                client.model(),
                narrative.chars().count()
            );
            Ok(narrative)
        }
        Err(e) => {
            warn!("Stage 1: narrative generation failed: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage1_config_default() {
        let config = Stage1Config::default();
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, 4000);
    }
}
