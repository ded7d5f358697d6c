//! Google Cloud Speech-to-Text provider (v1 synchronous `speech:recognize`)

use std::sync::Arc;

use async_trait::async_trait;
use auth_oauth::TokenSource;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::VoiceProvider;
use crate::error::{VoiceError, VoiceResult};
use crate::providers::{error_body, VoiceProviderTrait};
use crate::transcription::TranscriptionRequest;

pub struct GoogleProvider {
    api_url: String,
    model: String,
    tokens: Arc<dyn TokenSource>,
    http: Client,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl GoogleProvider {
    pub fn new(config: &VoiceProvider, tokens: Arc<dyn TokenSource>) -> VoiceResult<Self> {
        match config {
            VoiceProvider::Google { api_url, model } => Ok(Self {
                api_url: api_url.trim_end_matches('/').to_string(),
                model: model.clone(),
                tokens,
                http: Client::new(),
            }),
            VoiceProvider::Whisper { .. } => Err(VoiceError::Config(
                "Google provider built from non-Google configuration".to_string(),
            )),
        }
    }

    fn request_body(&self, audio_data: &[u8], request: &TranscriptionRequest) -> Value {
        let encoding = request.encoding();
        let mut config = json!({
            "encoding": encoding.as_str(),
            "languageCode": request.language_code,
            "model": self.model,
            "useEnhanced": true,
            "enableAutomaticPunctuation": true,
        });
        if encoding.needs_sample_rate() {
            config["sampleRateHertz"] = json!(request.sample_rate_hertz);
        }
        json!({
            "config": config,
            "audio": { "content": base64::engine::general_purpose::STANDARD.encode(audio_data) },
        })
    }
}

/// First alternative of every result, space-joined
fn join_transcripts(response: &RecognizeResponse) -> String {
    response
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl VoiceProviderTrait for GoogleProvider {
    async fn transcribe(&self, audio_data: &[u8], request: &TranscriptionRequest) -> VoiceResult<String> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| VoiceError::Authentication(e.to_string()))?;

        let response = self
            .http
            .post(format!("{}/v1/speech:recognize", self.api_url))
            .bearer_auth(token)
            .json(&self.request_body(audio_data, request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    VoiceError::Authentication(error_body(&body))
                }
                StatusCode::BAD_REQUEST => VoiceError::AudioProcessing(error_body(&body)),
                _ => VoiceError::Provider(format!("{}: {}", status, error_body(&body))),
            });
        }

        let parsed: RecognizeResponse = serde_json::from_str(&response.text().await?)?;
        let transcript = join_transcripts(&parsed);
        debug!(
            language = %request.language_code,
            chars = transcript.chars().count(),
            "Google Speech transcription finished"
        );
        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SAMPLE_RATE_HERTZ;

    struct NoToken;

    #[async_trait]
    impl TokenSource for NoToken {
        async fn access_token(&self) -> auth_oauth::Result<String> {
            Err(auth_oauth::OAuthError::MissingCredentials("test".to_string()))
        }
    }

    fn provider() -> GoogleProvider {
        let config = VoiceProvider::Google {
            api_url: "https://speech.example.test/".to_string(),
            model: "medical".to_string(),
        };
        GoogleProvider::new(&config, Arc::new(NoToken)).unwrap()
    }

    fn request(filename: &str) -> TranscriptionRequest {
        TranscriptionRequest {
            filename: filename.to_string(),
            language_code: "ja-JP".to_string(),
            sample_rate_hertz: DEFAULT_SAMPLE_RATE_HERTZ,
        }
    }

    #[test]
    fn test_request_body_for_wav() {
        let body = provider().request_body(b"RIFF", &request("visit.wav"));
        assert_eq!(body["config"]["encoding"], "LINEAR16");
        assert_eq!(body["config"]["sampleRateHertz"], 16_000);
        assert_eq!(body["config"]["languageCode"], "ja-JP");
        assert_eq!(body["config"]["enableAutomaticPunctuation"], true);
        assert_eq!(body["audio"]["content"], "UklGRg==");
    }

    #[test]
    fn test_request_body_omits_rate_for_containers() {
        let body = provider().request_body(b"x", &request("visit.webm"));
        assert_eq!(body["config"]["encoding"], "WEBM_OPUS");
        assert!(body["config"].get("sampleRateHertz").is_none());
    }

    #[test]
    fn test_join_transcripts() {
        let response: RecognizeResponse = serde_json::from_value(json!({
            "results": [
                {"alternatives": [{"transcript": "cow is coughing "}, {"transcript": "ignored"}]},
                {"alternatives": []},
                {"alternatives": [{"transcript": "since yesterday"}]}
            ]
        }))
        .unwrap();
        assert_eq!(join_transcripts(&response), "cow is coughing since yesterday");
        assert_eq!(join_transcripts(&RecognizeResponse::default()), "");
    }

    #[tokio::test]
    async fn test_token_failure_is_authentication_error() {
        let error = provider().transcribe(b"x", &request("a.wav")).await.unwrap_err();
        assert_eq!(error.code(), "voice_authentication");
    }
}
