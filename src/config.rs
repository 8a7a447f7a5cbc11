//! Startup configuration.
//!
//! All endpoints and credentials are read once, validated, and passed to the
//! client constructors explicitly. Nothing downstream reads the environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::DEFAULT_TRANSCRIPT_CHAR_CAP;

/// Embedding service settings (OpenAI-compatible `/embeddings`)
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Vector length every embedding must have
    pub dimensions: usize,
    pub timeout: Duration,
}

/// Vector database settings (Data API collection search)
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    pub endpoint: String,
    pub token: String,
    pub namespace: String,
    pub collection: String,
    pub timeout: Duration,
}

/// Text-generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionProvider {
    Gemini,
    Anthropic,
    OpenAi,
}

impl CompletionProvider {
    /// Environment variable holding this provider's key
    pub fn key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::Anthropic => "claude-3-haiku-20240307",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }
}

impl FromStr for CompletionProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::Invalid {
                name: "LLM_PROVIDER",
                reason: format!("unknown provider '{}' (expected gemini, anthropic or openai)", other),
            }),
        }
    }
}

impl fmt::Display for CompletionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        })
    }
}

/// Text-generation service settings
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub provider: CompletionProvider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Pipeline tunables
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Characters of transcript kept for embedding and prompting
    pub transcript_char_cap: usize,
    /// Maximum knowledge documents requested from the vector store
    pub retrieval_limit: usize,
    /// Characters kept from each retrieved document
    pub context_doc_chars: usize,
    /// Characters of transcript sent for metadata extraction
    pub metadata_char_cap: usize,
    pub narrative_temperature: f32,
    /// Kept at zero so the record comes back machine-parseable
    pub structured_temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            transcript_char_cap: DEFAULT_TRANSCRIPT_CHAR_CAP,
            retrieval_limit: 5,
            context_doc_chars: 400,
            metadata_char_cap: 5_000,
            narrative_temperature: 0.1,
            structured_temperature: 0.0,
            max_tokens: 4000,
        }
    }
}

/// Complete configuration for an analyzer process
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub completion: CompletionConfig,
    pub analysis: AnalysisSettings,
}

impl AnalyzerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let embedding = EmbeddingConfig {
            api_key: get("EMBEDDING_API_KEY")
                .or_else(|| get("OPENAI_API_KEY"))
                .ok_or(ConfigError::Missing("EMBEDDING_API_KEY"))?,
            base_url: get("EMBEDDING_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: get("EMBEDDING_MODEL").unwrap_or_else(|| "text-embedding-3-small".to_string()),
            dimensions: parse_or("EMBEDDING_DIMENSIONS", get("EMBEDDING_DIMENSIONS"), 1536)?,
            timeout: Duration::from_secs(30),
        };

        let vector_store = VectorStoreConfig {
            endpoint: require("ASTRA_DB_API_ENDPOINT")?,
            token: require("ASTRA_DB_APPLICATION_TOKEN")?,
            namespace: get("ASTRA_DB_NAMESPACE").unwrap_or_else(|| "default_keyspace".to_string()),
            collection: require("ASTRA_DB_COLLECTION")?,
            timeout: Duration::from_secs(30),
        };

        let provider = match get("LLM_PROVIDER") {
            Some(name) => name.parse()?,
            None => CompletionProvider::Gemini,
        };
        let completion = CompletionConfig {
            provider,
            api_key: require(provider.key_var())?,
            model: get("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: get("LLM_BASE_URL").unwrap_or_else(|| provider.default_base_url().to_string()),
            timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), 120)?),
        };

        let defaults = AnalysisSettings::default();
        let analysis = AnalysisSettings {
            transcript_char_cap: parse_or(
                "TRANSCRIPT_CHAR_CAP",
                get("TRANSCRIPT_CHAR_CAP"),
                defaults.transcript_char_cap,
            )?,
            retrieval_limit: parse_or("RETRIEVAL_LIMIT", get("RETRIEVAL_LIMIT"), defaults.retrieval_limit)?,
            ..defaults
        };

        let config = Self {
            embedding,
            vector_store,
            completion,
            analysis,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("EMBEDDING_BASE_URL", &self.embedding.base_url)?;
        check_url("ASTRA_DB_API_ENDPOINT", &self.vector_store.endpoint)?;
        check_url("LLM_BASE_URL", &self.completion.base_url)?;

        if self.embedding.dimensions == 0 {
            return Err(invalid("EMBEDDING_DIMENSIONS", "must be greater than zero"));
        }
        if self.analysis.transcript_char_cap == 0 {
            return Err(invalid("TRANSCRIPT_CHAR_CAP", "must be greater than zero"));
        }
        if self.analysis.retrieval_limit == 0 {
            return Err(invalid("RETRIEVAL_LIMIT", "must be greater than zero"));
        }
        if self.completion.timeout.is_zero() {
            return Err(invalid("LLM_TIMEOUT_SECS", "must be greater than zero"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

fn check_url(name: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(invalid(name, "must be an http(s) URL"))
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("'{}' is not a valid number", value),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("OPENAI_API_KEY", "sk-test"),
            ("ASTRA_DB_API_ENDPOINT", "https://db-id.apps.astra.datastax.com"),
            ("ASTRA_DB_APPLICATION_TOKEN", "AstraCS:token"),
            ("ASTRA_DB_COLLECTION", "playbooks"),
            ("GEMINI_API_KEY", "gm-test"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AnalyzerConfig, ConfigError> {
        AnalyzerConfig::from_lookup(|name| env.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults_from_minimal_env() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.embedding.api_key, "sk-test");
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.vector_store.namespace, "default_keyspace");
        assert_eq!(config.completion.provider, CompletionProvider::Gemini);
        assert_eq!(config.completion.model, "gemini-2.5-flash");
        assert_eq!(config.completion.timeout, Duration::from_secs(120));
        assert_eq!(config.analysis.transcript_char_cap, 15_000);
        assert_eq!(config.analysis.structured_temperature, 0.0);
    }

    #[test]
    fn test_missing_collection_fails_fast() {
        let mut env = base_env();
        env.remove("ASTRA_DB_COLLECTION");
        assert_eq!(
            load(&env).unwrap_err(),
            ConfigError::Missing("ASTRA_DB_COLLECTION")
        );
    }

    #[test]
    fn test_provider_key_required() {
        let mut env = base_env();
        env.insert("LLM_PROVIDER", "anthropic");
        assert_eq!(
            load(&env).unwrap_err(),
            ConfigError::Missing("ANTHROPIC_API_KEY")
        );

        env.insert("ANTHROPIC_API_KEY", "sk-ant");
        let config = load(&env).unwrap();
        assert_eq!(config.completion.provider, CompletionProvider::Anthropic);
        assert_eq!(config.completion.base_url, "https://api.anthropic.com/v1");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut env = base_env();
        env.insert("LLM_PROVIDER", "perplexity");
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { name: "LLM_PROVIDER", .. }
        ));
    }

    #[test]
    fn test_invalid_endpoint_and_numbers() {
        let mut env = base_env();
        env.insert("ASTRA_DB_API_ENDPOINT", "db.local");
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { name: "ASTRA_DB_API_ENDPOINT", .. }
        ));

        let mut env = base_env();
        env.insert("TRANSCRIPT_CHAR_CAP", "lots");
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { name: "TRANSCRIPT_CHAR_CAP", .. }
        ));

        let mut env = base_env();
        env.insert("RETRIEVAL_LIMIT", "0");
        assert!(matches!(
            load(&env).unwrap_err(),
            ConfigError::Invalid { name: "RETRIEVAL_LIMIT", .. }
        ));
    }
}
