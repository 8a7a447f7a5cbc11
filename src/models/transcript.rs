use serde::{Deserialize, Serialize};

/// Default character cap applied to transcripts before embedding and prompting
pub const DEFAULT_TRANSCRIPT_CHAR_CAP: usize = 15_000;

/// Return the prefix of `text` holding at most `max_chars` characters
///
/// Counts Unicode scalar values, so multi-byte characters are never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Caller-supplied facts about the meeting, prepended to the narrative prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Meeting kind (e.g. "Planejamento", "Status", "Venda")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

impl MeetingInfo {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.time.is_none()
            && self.meeting_type.is_none()
            && self.participants.is_empty()
            && self.objective.is_none()
    }

    /// Render as the labelled block used in prompts
    pub fn to_prompt_block(&self) -> String {
        let mut block = String::new();
        if let Some(date) = &self.date {
            block.push_str(&format!("DATA: {}\n", date));
        }
        if let Some(time) = &self.time {
            block.push_str(&format!("HORÁRIO: {}\n", time));
        }
        if let Some(kind) = &self.meeting_type {
            block.push_str(&format!("TIPO: {}\n", kind));
        }
        if !self.participants.is_empty() {
            block.push_str(&format!("PARTICIPANTES: {}\n", self.participants.join(", ")));
        }
        if let Some(objective) = &self.objective {
            block.push_str(&format!("OBJETIVO: {}\n", objective));
        }
        block
    }
}
