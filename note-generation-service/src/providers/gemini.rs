//! Gemini `generateContent` REST provider

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use error_common::{truncate_chars, DataSanitizer};

use crate::config::GenerationConfig;
use crate::error::{GenerationError, GenerationResult};
use crate::providers::{Candidate, GenerationProvider, GenerationResponse, OutputFormat};

pub struct GeminiProvider {
    config: GenerationConfig,
    http: Client,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Deserialize)]
struct WirePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl From<GenerateContentResponse> for GenerationResponse {
    fn from(wire: GenerateContentResponse) -> Self {
        GenerationResponse {
            candidates: wire
                .candidates
                .into_iter()
                .map(|candidate| Candidate {
                    parts: candidate
                        .content
                        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
                        .unwrap_or_default(),
                    finish_reason: candidate.finish_reason,
                })
                .collect(),
            block_reason: wire.prompt_feedback.and_then(|feedback| feedback.block_reason),
        }
    }
}

impl GeminiProvider {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    async fn generate(&self, prompt: &str, format: OutputFormat) -> GenerationResult<GenerationResponse> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": format.mime_type() },
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message =
                DataSanitizer::new().sanitize_for_logging(truncate_chars(&text, 300));
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerationError::Authentication(message)
                }
                _ => GenerationError::Provider {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let wire: GenerateContentResponse = serde_json::from_str(&text)?;
        debug!(model = %self.config.model, candidates = wire.candidates.len(), "Gemini response received");
        Ok(wire.into())
    }

    fn name(&self) -> &'static str {
        "google_gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let mut config = GenerationConfig::new("key");
        config.api_url = "https://gen.example.test/".to_string();
        assert_eq!(
            GeminiProvider::new(config).endpoint(),
            "https://gen.example.test/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );
    }

    #[test]
    fn test_wire_response_conversion() {
        let wire: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"s\": \"a\"}" }, { "inlineData": {} }] },
                "finishReason": "STOP"
            }],
            "promptFeedback": { "blockReason": "BLOCK_REASON_UNSPECIFIED" }
        }))
        .unwrap();
        let response: GenerationResponse = wire.into();
        assert_eq!(response.candidates.len(), 1);
        assert_eq!(response.candidates[0].parts, vec!["{\"s\": \"a\"}".to_string()]);
        assert_eq!(response.block_reason(), None);
    }

    #[test]
    fn test_blocked_prompt_has_no_candidates() {
        let wire: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap();
        let response: GenerationResponse = wire.into();
        assert!(response.candidates.is_empty());
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }
}
