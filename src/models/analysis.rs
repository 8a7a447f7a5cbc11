use std::fmt;

use serde::{Deserialize, Serialize};

use super::StructuredRecord;

/// Output of one successful analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Free-text report from the first model call
    pub narrative: String,
    /// Record extracted from the second model call
    pub structured: StructuredRecord,
    /// Knowledge documents that contributed context
    pub retrieval_count: usize,
}

/// Step of the analysis state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Embedding,
    Retrieving,
    NarrativeGeneration,
    StructuredGeneration,
    Done,
    Failed,
}

impl AnalysisState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Embedding => "embedding",
            Self::Retrieving => "retrieving",
            Self::NarrativeGeneration => "narrative_generation",
            Self::StructuredGeneration => "structured_generation",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
