use thiserror::Error;

/// Failure of a single text-generation call
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// Connection failed before a response arrived
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded its configured timeout
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx response from the provider
    #[error("provider error {status}: {message}")]
    Api { status: u16, message: String },

    /// 2xx response without usable text
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// The caller abandoned the request
    #[error("request cancelled")]
    Cancelled,
}

impl CompletionError {
    /// Map a reqwest transport error, keeping timeouts distinguishable
    pub fn from_reqwest(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Terminal failure of an analysis run
///
/// Embedding, retrieval and structured-parse failures are absorbed inside the
/// pipeline and never appear here.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("narrative analysis failed: {0}")]
    NarrativeGenerationFailed(#[source] CompletionError),

    #[error("analysis cancelled")]
    Cancelled,
}

/// Invalid or missing startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_failure_message_carries_provider_text() {
        let err = AnalysisError::NarrativeGenerationFailed(CompletionError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        });
        let message = err.to_string();
        assert!(message.contains("narrative analysis failed"));
        assert!(message.contains("429"));
        assert!(message.contains("quota exceeded"));
    }

    #[test]
    fn test_config_error_names_variable() {
        let err = ConfigError::Missing("ASTRA_DB_COLLECTION");
        assert_eq!(
            err.to_string(),
            "ASTRA_DB_COLLECTION environment variable not set"
        );
    }
}
