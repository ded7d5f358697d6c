pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::error::{GenerationError, GenerationResult};

/// Prompt feedback value meaning "not blocked"
pub const BLOCK_REASON_UNSPECIFIED: &str = "BLOCK_REASON_UNSPECIFIED";

/// Output format requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    PlainText,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Json => "application/json",
            OutputFormat::PlainText => "text/plain",
        }
    }
}

/// One generated alternative
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub parts: Vec<String>,
    pub finish_reason: Option<String>,
}

/// Provider-neutral view of a generation response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationResponse {
    pub candidates: Vec<Candidate>,
    pub block_reason: Option<String>,
}

impl GenerationResponse {
    /// Text of the single candidate, parts concatenated.
    ///
    /// Fails unless there is exactly one candidate carrying at least one part.
    pub fn direct_text(&self) -> GenerationResult<String> {
        match self.candidates.as_slice() {
            [only] if !only.parts.is_empty() => Ok(only.parts.concat()),
            [_] => Err(GenerationError::ResponseShape(
                "candidate has no text parts".to_string(),
            )),
            candidates => Err(GenerationError::ResponseShape(format!(
                "expected one candidate, got {}",
                candidates.len()
            ))),
        }
    }

    /// [`Self::direct_text`], falling back to every non-empty part of every
    /// candidate joined with newlines
    pub fn extract_text(&self) -> String {
        if let Ok(text) = self.direct_text() {
            if !text.trim().is_empty() {
                return text;
            }
        }
        self.candidates
            .iter()
            .flat_map(|candidate| candidate.parts.iter())
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.block_reason
            .as_deref()
            .filter(|reason| !reason.is_empty() && *reason != BLOCK_REASON_UNSPECIFIED)
    }
}

/// Hosted text-generation model
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str, format: OutputFormat) -> GenerationResult<GenerationResponse>;

    fn name(&self) -> &'static str;
}

pub fn create_provider(config: &GenerationConfig) -> Arc<dyn GenerationProvider> {
    Arc::new(gemini::GeminiProvider::new(config.clone()))
}
