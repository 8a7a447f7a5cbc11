//! Sequences one analysis through its stages and records every state
//! transition.
//!
//! ```text
//! Idle -> Embedding -> Retrieving -> NarrativeGeneration -> StructuredGeneration -> Done
//!                                          |
//!                                          +-> Failed
//! ```
//!
//! Only a narrative failure or cancellation reaches `Failed`. Embedding and
//! retrieval degrade to a hash vector and an empty context, and structured
//! extraction degrades to the default record.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AnalysisSettings, AnalyzerConfig};
use crate::error::{AnalysisError, CompletionError};
use crate::llm::{
    CompletionClient, CompletionRequest, PromptTemplates, SchemaDescriptor,
    build_completion_client, build_metadata_prompt, build_summary_prompt,
};
use crate::models::{AnalysisResult, AnalysisState, MeetingInfo, MeetingMetadata, truncate_chars};
use crate::retrieval::{AstraVectorStore, EmbeddingProvider, OpenAiEmbedder, VectorStore};
use crate::stages::{
    Stage0Config, Stage1Config, Stage2Config, embed_transcript, execute_stage1, execute_stage2,
    retrieve_context,
};

/// Temperature for the summary and metadata helper calls
const HELPER_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 500;
const METADATA_MAX_TOKENS: u32 = 500;

/// States visited by one run, and how it ended
#[derive(Debug)]
pub struct Orchestration {
    pub states: Vec<AnalysisState>,
    pub outcome: Result<AnalysisResult, AnalysisError>,
}

impl Orchestration {
    pub fn final_state(&self) -> AnalysisState {
        self.states.last().copied().unwrap_or(AnalysisState::Idle)
    }
}

/// Transition log for a single run
struct StateLog {
    states: Vec<AnalysisState>,
}

impl StateLog {
    fn new() -> Self {
        Self {
            states: vec![AnalysisState::Idle],
        }
    }

    fn enter(&mut self, state: AnalysisState) {
        info!(%state, "analysis state");
        self.states.push(state);
    }
}

/// Await `future` unless `cancel` fires first; the future is dropped on cancel
async fn until_cancelled<F: Future>(cancel: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = future => Some(output),
    }
}

/// Runs transcript analyses against injected collaborators
///
/// Holds no per-run state, so one instance can serve concurrent analyses.
pub struct AnalysisOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    completion: Arc<dyn CompletionClient>,
    settings: AnalysisSettings,
    templates: PromptTemplates,
    schema: SchemaDescriptor,
}

impl AnalysisOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        completion: Arc<dyn CompletionClient>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            completion,
            settings,
            templates: PromptTemplates::default(),
            schema: SchemaDescriptor::default(),
        }
    }

    /// Build the HTTP-backed collaborators described by `config`
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
        let store = Arc::new(AstraVectorStore::new(&config.vector_store)?);
        let completion = build_completion_client(&config.completion)?;
        Ok(Self::new(embedder, store, completion, config.analysis.clone()))
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.schema = schema;
        self
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyze a transcript without cancellation
    pub async fn analyze(
        &self,
        transcript: &str,
        meeting_info: Option<&MeetingInfo>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(transcript, meeting_info, &CancellationToken::new())
            .await
            .outcome
    }

    /// Analyze a transcript, stopping early if `cancel` fires
    ///
    /// The transcript is capped once here; the embedding, the narrative
    /// prompt and the structured prompt all see the same prefix.
    pub async fn run(
        &self,
        transcript: &str,
        meeting_info: Option<&MeetingInfo>,
        cancel: &CancellationToken,
    ) -> Orchestration {
        let mut log = StateLog::new();
        let transcript = truncate_chars(transcript, self.settings.transcript_char_cap);

        let outcome = self.run_stages(transcript, meeting_info, cancel, &mut log).await;

        match &outcome {
            Ok(result) => {
                log.enter(AnalysisState::Done);
                info!(
                    retrieval_count = result.retrieval_count,
                    tasks = result.structured.tasks.len(),
                    "analysis complete"
                );
            }
            Err(e) => {
                log.enter(AnalysisState::Failed);
                warn!("analysis failed: {}", e);
            }
        }

        Orchestration {
            states: log.states,
            outcome,
        }
    }

    async fn run_stages(
        &self,
        transcript: &str,
        meeting_info: Option<&MeetingInfo>,
        cancel: &CancellationToken,
        log: &mut StateLog,
    ) -> Result<AnalysisResult, AnalysisError> {
        let stage0 = Stage0Config::from(&self.settings);

        log.enter(AnalysisState::Embedding);
        let vector = until_cancelled(cancel, embed_transcript(&*self.embedder, transcript, &stage0))
            .await
            .ok_or(AnalysisError::Cancelled)?;

        log.enter(AnalysisState::Retrieving);
        let retrieval = until_cancelled(cancel, retrieve_context(&*self.store, &vector, &stage0))
            .await
            .ok_or(AnalysisError::Cancelled)?;

        log.enter(AnalysisState::NarrativeGeneration);
        let narrative = until_cancelled(
            cancel,
            execute_stage1(
                &*self.completion,
                &self.templates,
                &retrieval.context_block,
                transcript,
                meeting_info,
                &Stage1Config::from(&self.settings),
            ),
        )
        .await
        .ok_or(AnalysisError::Cancelled)?
        .map_err(AnalysisError::NarrativeGenerationFailed)?;

        log.enter(AnalysisState::StructuredGeneration);
        let structured = until_cancelled(
            cancel,
            execute_stage2(
                &*self.completion,
                &self.templates,
                &self.schema,
                &narrative,
                transcript,
                &retrieval.context_block,
                &Stage2Config::from(&self.settings),
            ),
        )
        .await
        .ok_or(AnalysisError::Cancelled)?;

        Ok(AnalysisResult {
            narrative,
            structured,
            retrieval_count: retrieval.retrieval_count,
        })
    }

    /// One-paragraph executive summary of a narrative report
    pub async fn executive_summary(&self, narrative: &str) -> Result<String, CompletionError> {
        let request =
            CompletionRequest::new(build_summary_prompt(narrative), HELPER_TEMPERATURE, SUMMARY_MAX_TOKENS);
        let summary = self.completion.complete(&request).await?;
        Ok(summary.trim().to_string())
    }

    /// Recover date, participants and topics from a transcript
    ///
    /// Falls back to placeholder values when the call or the parse fails.
    pub async fn extract_metadata(&self, transcript: &str) -> MeetingMetadata {
        let prompt = build_metadata_prompt(transcript, self.settings.metadata_char_cap);
        let request = CompletionRequest::new(prompt, HELPER_TEMPERATURE, METADATA_MAX_TOKENS);

        match self.completion.complete(&request).await {
            Ok(raw) => crate::llm::extract_metadata(&raw),
            Err(e) => {
                warn!("metadata extraction failed: {}", e);
                MeetingMetadata::default()
            }
        }
    }
}
