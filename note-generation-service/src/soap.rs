use std::sync::Arc;

use database_layer::SoapNote;
use error_common::truncate_chars;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{GenerationError, GenerationResult};
use crate::prompts::{soap_prompt, translation_prompt};
use crate::providers::{GenerationProvider, OutputFormat};

const INPUT_ECHO_CHARS: usize = 100;
const RESPONSE_ECHO_CHARS: usize = 200;

pub const EMPTY_INPUT_MESSAGE: &str = "Input text is empty";
pub const VALIDATION_FAILED_MESSAGE: &str = "Data validation failed";
pub const SYSTEM_ERROR_MESSAGE: &str = "A system error occurred";

/// Why a generation attempt produced no usable note
enum Failure {
    /// The model answered but the answer is not a SOAP object
    Validation { error: String, raw: String },
    Unexpected(GenerationError),
}

impl From<GenerationError> for Failure {
    fn from(error: GenerationError) -> Self {
        Failure::Unexpected(error)
    }
}

/// SOAP note generation that never fails.
///
/// Every failure is reported inside the returned note so the caller always
/// gets something to show.
pub struct SoapGenerator {
    provider: Arc<dyn GenerationProvider>,
}

impl SoapGenerator {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub async fn generate_soap_from_text(&self, text: &str) -> SoapNote {
        if text.trim().is_empty() {
            warn!("SOAP generation requested with empty input");
            return SoapNote::new(EMPTY_INPUT_MESSAGE, "", "", "");
        }

        debug!(chars = text.chars().count(), "Generating SOAP note");
        match self.try_generate(text).await {
            Ok(note) => {
                info!(provider = self.provider.name(), "SOAP note generated");
                note
            }
            Err(Failure::Validation { error, raw }) => {
                warn!(error = %error, "Model response failed SOAP validation");
                SoapNote::new(
                    format!(
                        "JSON parse error: {}. Original text: {}...",
                        error,
                        truncate_chars(text, INPUT_ECHO_CHARS)
                    ),
                    format!("Raw response: {}...", truncate_chars(&raw, RESPONSE_ECHO_CHARS)),
                    VALIDATION_FAILED_MESSAGE,
                    "Please try again",
                )
            }
            Err(Failure::Unexpected(cause)) => {
                error!(error = %cause, code = cause.code(), "SOAP generation failed");
                SoapNote::new(
                    format!(
                        "Unexpected error: {}. Original text: {}...",
                        cause,
                        truncate_chars(text, INPUT_ECHO_CHARS)
                    ),
                    "",
                    SYSTEM_ERROR_MESSAGE,
                    "Please try again later",
                )
            }
        }
    }

    async fn try_generate(&self, text: &str) -> Result<SoapNote, Failure> {
        let response = self
            .provider
            .generate(&soap_prompt(text), OutputFormat::Json)
            .await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::Blocked(reason.to_string()).into());
        }

        let raw = response.extract_text();
        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }

        parse_soap(&raw).map_err(|error| Failure::Validation { error, raw })
    }

    /// Translate `text`; any failure yields `text` unchanged
    pub async fn translate_text(&self, text: &str, target_lang: &str) -> String {
        if text.trim().is_empty() || target_lang.trim().is_empty() {
            return text.to_string();
        }
        match self.try_translate(text, target_lang).await {
            Ok(translated) => translated,
            Err(cause) => {
                warn!(error = %cause, target_lang, "Translation failed; returning original text");
                text.to_string()
            }
        }
    }

    async fn try_translate(&self, text: &str, target_lang: &str) -> GenerationResult<String> {
        let response = self
            .provider
            .generate(&translation_prompt(text, target_lang), OutputFormat::PlainText)
            .await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::Blocked(reason.to_string()));
        }
        let translated = response.extract_text();
        if translated.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(translated.trim().to_string())
    }

    /// Translate each field of a note independently
    pub async fn translate_note(&self, note: &SoapNote, target_lang: &str) -> SoapNote {
        SoapNote::new(
            self.translate_text(&note.subjective, target_lang).await,
            self.translate_text(&note.objective, target_lang).await,
            self.translate_text(&note.assessment, target_lang).await,
            self.translate_text(&note.plan, target_lang).await,
        )
    }
}

/// The model sometimes wraps JSON in a Markdown fence despite JSON mode
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|inner| inner.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

fn parse_soap(raw: &str) -> Result<SoapNote, String> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("expected a JSON object with keys s, o, a, p".to_string());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Candidate, GenerationResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        reply: GenerationResult<GenerationResponse>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn replying(parts: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(GenerationResponse {
                    candidates: vec![Candidate {
                        parts: parts.iter().map(|p| (*p).to_string()).collect(),
                        finish_reason: Some("STOP".to_string()),
                    }],
                    block_reason: None,
                }),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: GenerationError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(error),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationProvider for StubProvider {
        async fn generate(&self, _prompt: &str, _format: OutputFormat) -> GenerationResult<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(response) => Ok(response.clone()),
                Err(error) => Err(GenerationError::Config(error.to_string())),
            }
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    #[tokio::test]
    async fn test_valid_response_becomes_note() {
        let provider = StubProvider::replying(&[r#"{"s": "off feed", "o": "T 40.1", "a": "ketosis", "p": "glucose IV"}"#]);
        let note = SoapGenerator::new(provider.clone())
            .generate_soap_from_text("cow off feed")
            .await;
        assert_eq!(note, SoapNote::new("off feed", "T 40.1", "ketosis", "glucose IV"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_skips_provider() {
        let provider = StubProvider::replying(&["{}"]);
        let generator = SoapGenerator::new(provider.clone());
        for input in ["", "   \n\t"] {
            let note = generator.generate_soap_from_text(input).await;
            assert_eq!(note.subjective, EMPTY_INPUT_MESSAGE);
            assert_eq!(note.objective, "");
            assert_eq!(note.assessment, "");
            assert_eq!(note.plan, "");
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_reported_in_band() {
        let malformed = format!("{{\"s\": \"unterminated {}", "x".repeat(400));
        let input = format!("visit notes {}", "y".repeat(300));
        let note = SoapGenerator::new(StubProvider::replying(&[&malformed]))
            .generate_soap_from_text(&input)
            .await;

        assert_eq!(note.assessment, VALIDATION_FAILED_MESSAGE);
        assert!(note.subjective.contains(truncate_chars(&input, 100)));
        assert!(!note.subjective.contains(&input));
        assert!(note.objective.contains(truncate_chars(&malformed, 200)));
        assert!(!note.objective.contains(&malformed));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_validation_failure() {
        let note = SoapGenerator::new(StubProvider::replying(&[r#"["s", "o"]"#]))
            .generate_soap_from_text("text")
            .await;
        assert_eq!(note.assessment, VALIDATION_FAILED_MESSAGE);

        let note = SoapGenerator::new(StubProvider::replying(&[r#"{"s": 12}"#]))
            .generate_soap_from_text("text")
            .await;
        assert_eq!(note.assessment, VALIDATION_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_fenced_json_is_accepted() {
        let note = SoapGenerator::new(StubProvider::replying(&["```json\n{\"s\": \"a\", \"p\": \"b\"}\n```"]))
            .generate_soap_from_text("text")
            .await;
        assert_eq!(note, SoapNote::new("a", "", "", "b"));
    }

    #[tokio::test]
    async fn test_provider_error_is_system_error_note() {
        let note = SoapGenerator::new(StubProvider::failing(GenerationError::EmptyResponse))
            .generate_soap_from_text("text")
            .await;
        assert_eq!(note.assessment, SYSTEM_ERROR_MESSAGE);
        assert!(note.subjective.starts_with("Unexpected error"));
    }

    #[tokio::test]
    async fn test_blocked_and_empty_responses_are_failures() {
        let provider = Arc::new(StubProvider {
            reply: Ok(GenerationResponse {
                candidates: Vec::new(),
                block_reason: Some("SAFETY".to_string()),
            }),
            calls: AtomicUsize::new(0),
        });
        let note = SoapGenerator::new(provider).generate_soap_from_text("text").await;
        assert_eq!(note.assessment, SYSTEM_ERROR_MESSAGE);
        assert!(note.subjective.contains("SAFETY"));

        let note = SoapGenerator::new(StubProvider::replying(&["  "]))
            .generate_soap_from_text("text")
            .await;
        assert_eq!(note.assessment, SYSTEM_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_translate_returns_original_on_failure() {
        let generator = SoapGenerator::new(StubProvider::failing(GenerationError::EmptyResponse));
        assert_eq!(generator.translate_text("食欲不振", "en").await, "食欲不振");

        let generator = SoapGenerator::new(StubProvider::replying(&["Loss of appetite\n"]));
        assert_eq!(generator.translate_text("食欲不振", "en").await, "Loss of appetite");
    }

    #[tokio::test]
    async fn test_translate_note_skips_empty_fields() {
        let provider = StubProvider::replying(&["translated"]);
        let generator = SoapGenerator::new(provider.clone());
        let note = generator
            .translate_note(&SoapNote::new("a", "", "c", ""), "en")
            .await;
        assert_eq!(note, SoapNote::new("translated", "", "translated", ""));
        assert_eq!(provider.calls(), 2);
    }
}
