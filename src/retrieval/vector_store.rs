use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::EmbeddingVector;
use crate::config::VectorStoreConfig;
use crate::models::KnowledgeDocument;

/// Similarity search over stored knowledge documents
///
/// Failures degrade to an empty result; they are never surfaced.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `limit` documents, most similar first
    async fn search(&self, vector: &EmbeddingVector, limit: usize) -> Vec<KnowledgeDocument>;
}

/// Collection search against a Data API (Astra-style) vector database
#[derive(Clone)]
pub struct AstraVectorStore {
    client: Client,
    url: String,
}

impl AstraVectorStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        anyhow::ensure!(!config.token.trim().is_empty(), "missing vector store token");
        anyhow::ensure!(!config.collection.trim().is_empty(), "missing vector store collection");

        let mut headers = HeaderMap::new();
        headers.insert(
            "Token",
            HeaderValue::from_str(config.token.trim()).context("invalid vector store token")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .context("failed to build vector store HTTP client")?;

        Ok(Self {
            client,
            url: format!(
                "{}/api/json/v1/{}/{}",
                config.endpoint.trim_end_matches('/'),
                config.namespace,
                config.collection
            ),
        })
    }

    /// Collection URL searched by this client
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn find(&self, vector: &EmbeddingVector, limit: usize) -> Result<Vec<KnowledgeDocument>> {
        let body = find_request(vector, limit);
        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .context("vector search request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("vector search failed ({}): {}", status, text);
        }

        let parsed: FindResponse = response
            .json()
            .await
            .context("failed to parse vector search response")?;
        parsed.into_documents(limit)
    }
}

#[async_trait]
impl VectorStore for AstraVectorStore {
    async fn search(&self, vector: &EmbeddingVector, limit: usize) -> Vec<KnowledgeDocument> {
        if limit == 0 {
            return Vec::new();
        }
        match self.find(vector, limit).await {
            Ok(docs) => {
                debug!(count = docs.len(), "vector search returned documents");
                docs
            }
            Err(e) => {
                warn!(error = %e, "retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }
}

fn find_request(vector: &EmbeddingVector, limit: usize) -> Value {
    json!({
        "find": {
            "sort": { "$vector": vector.as_slice() },
            "options": { "limit": limit, "includeSimilarity": true }
        }
    })
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    data: Option<FindData>,
    #[serde(default)]
    errors: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct FindData {
    #[serde(default)]
    documents: Vec<Value>,
}

impl FindResponse {
    fn into_documents(self, limit: usize) -> Result<Vec<KnowledgeDocument>> {
        if let Some(first) = self.errors.first() {
            anyhow::bail!("vector search returned errors: {}", first);
        }
        let documents = self.data.map(|d| d.documents).unwrap_or_default();
        Ok(documents
            .iter()
            .take(limit)
            .map(KnowledgeDocument::from_value)
            .collect())
    }
}
