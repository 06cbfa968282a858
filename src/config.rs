//! Runtime configuration utilities for trial-scope.

use std::env;

use serde::Deserialize;

pub const DEFAULT_CTGOV_BASE_URL: &str = "https://clinicaltrials.gov/api/v2";
pub const DEFAULT_OPENFDA_LABEL_URL: &str = "https://api.fda.gov/drug/label.json";
pub const DEFAULT_LLM_CHAT_URL: &str = "https://llmfoundry.straive.com/openai/v1/chat/completions";
pub const DEFAULT_LLM_SIMILARITY_URL: &str = "https://llmfoundry.straive.com/similarity";

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// ClinicalTrials.gov v2 API root, without a trailing slash.
    pub ctgov_base_url: String,
    /// OpenFDA drug label endpoint.
    pub openfda_label_url: String,
    /// OpenAI-compatible chat completions endpoint.
    pub llm_chat_url: String,
    /// Pairwise document similarity endpoint.
    pub llm_similarity_url: String,
    /// Bearer token for the LLM endpoints; omitted from requests when unset.
    pub llm_api_key: Option<String>,
    /// Chat model used for both the tool call and the summary.
    pub llm_model: String,
    /// Embedding model passed to the similarity endpoint.
    pub embedding_model: String,
    /// Initial minimum similarity for drawing graph edges.
    pub similarity_threshold: f64,
    /// Contact address advertised in the User-Agent header.
    pub contact: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ctgov_base_url: DEFAULT_CTGOV_BASE_URL.to_string(),
            openfda_label_url: DEFAULT_OPENFDA_LABEL_URL.to_string(),
            llm_chat_url: DEFAULT_LLM_CHAT_URL.to_string(),
            llm_similarity_url: DEFAULT_LLM_SIMILARITY_URL.to_string(),
            llm_api_key: None,
            llm_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            similarity_threshold: 0.7,
            contact: "research@example.com".to_string(),
        }
    }
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        let var = |name: &str, fallback: String| env::var(name).unwrap_or(fallback);

        let similarity_threshold = env::var("SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| (0.0..=1.0).contains(v))
            .unwrap_or(defaults.similarity_threshold);

        Ok(Self {
            ctgov_base_url: trim_slash(var("CTGOV_BASE_URL", defaults.ctgov_base_url)),
            openfda_label_url: var("OPENFDA_LABEL_URL", defaults.openfda_label_url),
            llm_chat_url: var("LLM_CHAT_URL", defaults.llm_chat_url),
            llm_similarity_url: var("LLM_SIMILARITY_URL", defaults.llm_similarity_url),
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|v| !v.trim().is_empty()),
            llm_model: var("LLM_MODEL", defaults.llm_model),
            embedding_model: var("EMBEDDING_MODEL", defaults.embedding_model),
            similarity_threshold,
            contact: var("USER_AGENT_CONTACT", defaults.contact),
        })
    }

    /// User-Agent sent with every outbound request.
    pub fn user_agent(&self) -> String {
        format!("trial-scope/{} (+{})", env!("CARGO_PKG_VERSION"), self.contact)
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
