use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{AnthropicClient, GeminiClient, OpenAiClient};
use crate::config::{CompletionConfig, CompletionProvider};
use crate::error::CompletionError;

/// One text-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// External text-generation service returning raw text
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// Model identifier, for logs
    fn model(&self) -> &str;
}

/// Build the client for the configured provider
pub fn build_completion_client(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>> {
    Ok(match config.provider {
        CompletionProvider::Anthropic => Arc::new(AnthropicClient::new(config)?),
        CompletionProvider::OpenAi => Arc::new(OpenAiClient::new(config)?),
        CompletionProvider::Gemini => Arc::new(GeminiClient::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new("analise", 0.1, 4000).with_system("persona");
        assert_eq!(request.system.as_deref(), Some("persona"));
        assert_eq!(request.prompt, "analise");
        assert_eq!(request.max_tokens, 4000);
    }

    #[test]
    fn test_factory_uses_provider_model() {
        for provider in [
            CompletionProvider::Anthropic,
            CompletionProvider::OpenAi,
            CompletionProvider::Gemini,
        ] {
            let config = CompletionConfig {
                provider,
                api_key: "key".to_string(),
                model: provider.default_model().to_string(),
                base_url: provider.default_base_url().to_string(),
                timeout: Duration::from_secs(120),
            };
            let client = build_completion_client(&config).unwrap();
            assert_eq!(client.model(), provider.default_model());
        }
    }
}
