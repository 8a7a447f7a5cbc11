use serde::{Deserialize, Serialize};

/// Basic facts recovered from a transcript before analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingMetadata {
    #[serde(default = "unknown_date")]
    pub date: String,
    #[serde(default = "unknown_time")]
    pub time: String,
    #[serde(default = "unknown_participants")]
    pub participants: Vec<String>,
    #[serde(default = "unknown_objective")]
    pub objective: String,
    #[serde(default = "unknown_topics")]
    pub topics: Vec<String>,
}

fn unknown_date() -> String {
    "Não identificada".to_string()
}

fn unknown_time() -> String {
    "Não identificado".to_string()
}

fn unknown_participants() -> Vec<String> {
    vec!["Participantes não identificados".to_string()]
}

fn unknown_objective() -> String {
    "Não identificado".to_string()
}

fn unknown_topics() -> Vec<String> {
    vec!["Tópicos não identificados".to_string()]
}

impl Default for MeetingMetadata {
    fn default() -> Self {
        Self {
            date: unknown_date(),
            time: unknown_time(),
            participants: unknown_participants(),
            objective: unknown_objective(),
            topics: unknown_topics(),
        }
    }
}

impl MeetingMetadata {
    /// Participants actually found, excluding the placeholder
    pub fn known_participants(&self) -> Vec<String> {
        self.participants
            .iter()
            .filter(|p| **p != unknown_participants()[0])
            .cloned()
            .collect()
    }
}
