pub mod config;
pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod retrieval;
pub mod stages;

pub use config::{AnalysisSettings, AnalyzerConfig, CompletionProvider};
pub use error::{AnalysisError, CompletionError, ConfigError};
pub use io::{AnalysisReport, read_transcript_file, render_actions_csv, render_markdown};
pub use llm::{
    CompletionClient, CompletionRequest, PromptTemplates, SchemaDescriptor, build_completion_client,
    extract,
};
pub use models::{
    AnalysisResult, AnalysisState, MeetingInfo, MeetingMetadata, StructuredRecord,
};
pub use orchestrator::{AnalysisOrchestrator, Orchestration};
pub use retrieval::{EmbeddingProvider, HashEmbedder, VectorStore, fallback_embedding};
pub use stages::{RenderTargets, Stage3Config, execute_stage3};
