use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CompletionClient, CompletionRequest};
use crate::config::CompletionConfig;
use crate::error::CompletionError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout_secs: u64,
}

impl AnthropicClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        anyhow::ensure!(!config.api_key.trim().is_empty(), "missing Anthropic API key");
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build Anthropic HTTP client")?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{}/messages", config.base_url.trim_end_matches('/')),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            system: request.system.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = self.build_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = %status, "Anthropic API error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::from_reqwest(e, self.timeout_secs))?;

        // Concatenate every text block; tool and thinking blocks are ignored
        let text: String = response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(CompletionError::MalformedResponse(
                "no text content in response".to_string(),
            ));
        }
        debug!(model = %self.model, chars = text.len(), "Anthropic completion");
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
