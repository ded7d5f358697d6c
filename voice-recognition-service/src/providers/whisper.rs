//! OpenAI-compatible Whisper provider
//!
//! Works against the hosted API or a self-hosted server exposing
//! `/v1/audio/transcriptions`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::VoiceProvider;
use crate::error::{VoiceError, VoiceResult};
use crate::providers::{error_body, VoiceProviderTrait};
use crate::transcription::TranscriptionRequest;

pub struct WhisperProvider {
    api_url: String,
    api_key: Option<String>,
    model: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    #[serde(default)]
    text: String,
}

impl WhisperProvider {
    pub fn new(config: &VoiceProvider) -> VoiceResult<Self> {
        match config {
            VoiceProvider::Whisper {
                api_url,
                api_key,
                model,
            } => Ok(Self {
                api_url: api_url.trim_end_matches('/').to_string(),
                api_key: api_key.clone(),
                model: model.clone(),
                http: Client::new(),
            }),
            VoiceProvider::Google { .. } => Err(VoiceError::Config(
                "Whisper provider built from non-Whisper configuration".to_string(),
            )),
        }
    }
}

/// Whisper takes ISO-639-1 codes: `ja-JP` → `ja`
fn iso_language(language_code: &str) -> String {
    language_code
        .split(['-', '_'])
        .next()
        .unwrap_or(language_code)
        .to_lowercase()
}

#[async_trait]
impl VoiceProviderTrait for WhisperProvider {
    async fn transcribe(&self, audio_data: &[u8], request: &TranscriptionRequest) -> VoiceResult<String> {
        let file = Part::bytes(audio_data.to_vec()).file_name(request.filename.clone());
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", iso_language(&request.language_code))
            .text("response_format", "json");

        let mut builder = self
            .http
            .post(format!("{}/v1/audio/transcriptions", self.api_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    VoiceError::Authentication(error_body(&body))
                }
                StatusCode::BAD_REQUEST | StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                    VoiceError::AudioProcessing(error_body(&body))
                }
                _ => VoiceError::Provider(format!("{}: {}", status, error_body(&body))),
            });
        }

        let parsed: WhisperResponse = serde_json::from_str(&response.text().await?)?;
        debug!(model = %self.model, chars = parsed.text.chars().count(), "Whisper transcription finished");
        Ok(parsed.text.trim().to_string())
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}
