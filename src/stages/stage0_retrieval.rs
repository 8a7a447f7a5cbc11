use tracing::info;

use crate::config::AnalysisSettings;
use crate::retrieval::{EmbeddingProvider, EmbeddingVector, VectorStore, assemble_context};

/// Configuration for Stage 0
#[derive(Debug, Clone)]
pub struct Stage0Config {
    /// Characters of transcript sent to the embedding service
    pub max_chars: usize,
    /// Maximum documents requested from the vector store
    pub retrieval_limit: usize,
    /// Characters kept from each retrieved document
    pub context_doc_chars: usize,
}

impl Default for Stage0Config {
    fn default() -> Self {
        Self::from(&AnalysisSettings::default())
    }
}

impl From<&AnalysisSettings> for Stage0Config {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            max_chars: settings.transcript_char_cap,
            retrieval_limit: settings.retrieval_limit,
            context_doc_chars: settings.context_doc_chars,
        }
    }
}

/// Result of Stage 0 retrieval
#[derive(Debug, Clone, Default)]
pub struct Stage0Result {
    /// Assembled reference context; empty when nothing was retrieved
    pub context_block: String,
    /// Number of documents returned by the vector store
    pub retrieval_count: usize,
}

/// Stage 0a: embed the transcript
///
/// Always yields a vector of the provider's dimensionality.
pub async fn embed_transcript(
    embedder: &dyn EmbeddingProvider,
    transcript: &str,
    config: &Stage0Config,
) -> EmbeddingVector {
    let vector = embedder.embed(transcript, config.max_chars).await;
    info!("Stage 0: embedded transcript ({} dimensions)", vector.len());
    vector
}

/// Stage 0b: similarity search and context assembly
///
/// A failed or empty search gives an empty context block.
pub async fn retrieve_context(
    store: &dyn VectorStore,
    vector: &EmbeddingVector,
    config: &Stage0Config,
) -> Stage0Result {
    let docs = store.search(vector, config.retrieval_limit).await;
    let context_block = assemble_context(&docs, config.context_doc_chars);

    info!(
        "Stage 0: {} documents retrieved, {} context chars",
        docs.len(),
        context_block.chars().count()
    );

    Stage0Result {
        context_block,
        retrieval_count: docs.len(),
    }
}
