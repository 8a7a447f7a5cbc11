use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::models::truncate_chars;

/// Embedding with a length fixed by the model contract
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    /// Wrap `values` if it has exactly `dimensions` entries
    pub fn new(values: Vec<f32>, dimensions: usize) -> Option<Self> {
        (values.len() == dimensions).then_some(Self(values))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Deterministic placeholder vector for when the embedding service is down
///
/// Non-semantic: it keeps the shape, not the meaning. SHA-256 of the text is
/// read as big-endian byte pairs scaled into [0, 1] and repeated cyclically to
/// `dimensions` values.
pub fn fallback_embedding(text: &str, dimensions: usize) -> EmbeddingVector {
    let digest = Sha256::digest(text.as_bytes());
    let base: Vec<f32> = digest
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) as f32 / u16::MAX as f32)
        .collect();
    EmbeddingVector((0..dimensions).map(|i| base[i % base.len()]).collect())
}

/// Turns text into a fixed-length vector; never fails
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed the first `max_chars` characters of `text`
    async fn embed(&self, text: &str, max_chars: usize) -> EmbeddingVector;

    /// Length of every vector this provider returns
    fn dimensions(&self) -> usize;
}

/// Provider that always uses the hash fallback
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str, max_chars: usize) -> EmbeddingVector {
        fallback_embedding(truncate_chars(text, max_chars), self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embeddings client for OpenAI-compatible endpoints
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        anyhow::ensure!(!config.api_key.trim().is_empty(), "missing embedding API key");
        anyhow::ensure!(!config.model.trim().is_empty(), "missing embedding model name");

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid embedding API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("failed to build embedding HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    async fn request_embedding(&self, input: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .context("embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("embedding request failed ({}): {}", status, body);
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("failed to parse embedding response")?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .context("embedding response contained no vectors")
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str, max_chars: usize) -> EmbeddingVector {
        let input = truncate_chars(text, max_chars);
        match self.request_embedding(input).await {
            Ok(values) => {
                let len = values.len();
                match EmbeddingVector::new(values, self.dimensions) {
                    Some(vector) => {
                        debug!(dimensions = len, "embedding received");
                        vector
                    }
                    None => {
                        warn!(
                            expected = self.dimensions,
                            received = len,
                            "embedding has wrong dimensionality, using fallback vector"
                        );
                        fallback_embedding(input, self.dimensions)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "embedding unavailable, using fallback vector");
                fallback_embedding(input, self.dimensions)
            }
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_fallback_has_exact_length() {
        for dims in [1, 15, 16, 17, 768, 1536, 3072] {
            assert_eq!(fallback_embedding("Cliente: bom dia", dims).len(), dims);
        }
        assert!(fallback_embedding("", 0).is_empty());
    }

    #[test]
    fn test_fallback_is_deterministic_and_bounded() {
        let a = fallback_embedding("proposta comercial", 1536);
        let b = fallback_embedding("proposta comercial", 1536);
        let c = fallback_embedding("proposta técnica", 1536);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_vector_rejects_wrong_length() {
        assert!(EmbeddingVector::new(vec![0.0; 10], 1536).is_none());
        assert!(EmbeddingVector::new(vec![0.0; 1536], 1536).is_some());
    }

    #[tokio::test]
    async fn test_hash_embedder_truncates_before_hashing() {
        let embedder = HashEmbedder::new(64);
        let long = format!("{}{}", "a".repeat(100), "b".repeat(100));
        let vector = embedder.embed(&long, 100).await;
        assert_eq!(vector, fallback_embedding(&"a".repeat(100), 64));
    }

    #[tokio::test]
    async fn test_unreachable_service_falls_back() {
        let config = EmbeddingConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout: Duration::from_secs(2),
        };
        let embedder = OpenAiEmbedder::new(&config).unwrap();
        let vector = embedder.embed("Vendedor: Bom dia.", 15_000).await;
        assert_eq!(vector.len(), 1536);
        assert_eq!(vector, fallback_embedding("Vendedor: Bom dia.", 1536));
    }
}
