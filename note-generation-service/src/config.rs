use crate::error::{GenerationError, GenerationResult};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini connection settings
#[derive(Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
        }
    }

    /// The key is read from `GOOGLE_GEMINI_API_KEY`, falling back to `GEMINI_API_KEY`
    pub fn from_env() -> GenerationResult<Self> {
        let api_key = api_key_from_env().ok_or_else(|| {
            GenerationError::Config("GOOGLE_GEMINI_API_KEY / GEMINI_API_KEY not set".to_string())
        })?;

        Ok(Self {
            api_key,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            api_url: std::env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_API_URL.to_string()),
        })
    }
}

pub fn api_key_from_env() -> Option<String> {
    ["GOOGLE_GEMINI_API_KEY", "GEMINI_API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}
