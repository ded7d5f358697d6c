use std::sync::Arc;
use std::time::Instant;

use auth_oauth::TokenSource;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::audio::SUPPORTED_AUDIO_FORMATS;
use crate::config::VoiceConfig;
use crate::error::{VoiceError, VoiceResult};
use crate::providers::{create_provider, VoiceProviderTrait};
use crate::transcription::{TranscriptionRequest, TranscriptionResult};

/// Audio transcription with size limits and language selection
pub struct VoiceService {
    config: VoiceConfig,
    provider: Arc<dyn VoiceProviderTrait>,
}

impl VoiceService {
    /// Create a new voice recognition service
    pub fn new(config: VoiceConfig, tokens: Option<Arc<dyn TokenSource>>) -> VoiceResult<Self> {
        let provider = create_provider(&config.provider, tokens)?;
        info!(provider = provider.name(), language = %config.default_language, "Voice recognition service ready");
        Ok(Self { config, provider })
    }

    pub fn with_provider(config: VoiceConfig, provider: Arc<dyn VoiceProviderTrait>) -> Self {
        Self { config, provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn max_audio_bytes(&self) -> usize {
        self.config.max_audio_bytes
    }

    pub fn supported_formats(&self) -> &'static [&'static str] {
        &SUPPORTED_AUDIO_FORMATS
    }

    /// Request argument, then the configured default
    pub fn resolve_language(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map_or_else(|| self.config.default_language.clone(), str::to_string)
    }

    /// Transcribe audio data
    pub async fn transcribe_audio(
        &self,
        audio_data: &[u8],
        filename: &str,
        language: Option<&str>,
    ) -> VoiceResult<TranscriptionResult> {
        if audio_data.is_empty() {
            return Err(VoiceError::AudioProcessing("audio file is empty".to_string()));
        }
        if audio_data.len() > self.config.max_audio_bytes {
            return Err(VoiceError::PayloadTooLarge {
                size: audio_data.len(),
                limit: self.config.max_audio_bytes,
            });
        }

        let request = TranscriptionRequest {
            filename: filename.to_string(),
            language_code: self.resolve_language(language),
            sample_rate_hertz: self.config.sample_rate_hertz,
        };
        debug!(
            audio_size = audio_data.len(),
            filename = %filename,
            encoding = request.encoding().as_str(),
            language = %request.language_code,
            "Transcribing audio"
        );

        let started = Instant::now();
        let text = self.provider.transcribe(audio_data, &request).await?;
        if text.trim().is_empty() {
            warn!(filename = %filename, "Transcription returned no text");
            return Err(VoiceError::EmptyTranscript);
        }

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(provider = self.provider.name(), duration_ms, "Transcription completed");
        Ok(TranscriptionResult {
            text,
            language: request.language_code,
            provider: self.provider.name().to_string(),
            duration_ms,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        reply: String,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl VoiceProviderTrait for StubProvider {
        async fn transcribe(&self, _audio: &[u8], request: &TranscriptionRequest) -> VoiceResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reply.is_empty() {
                return Ok(String::new());
            }
            Ok(format!("{}{}", self.reply, request.language_code))
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn service(provider: Arc<StubProvider>) -> VoiceService {
        VoiceService::with_provider(VoiceConfig::default(), provider)
    }

    #[tokio::test]
    async fn test_transcribe_uses_default_language() {
        let provider = StubProvider::new("heard:");
        let result = service(provider.clone())
            .transcribe_audio(b"data", "memo.wav", None)
            .await
            .unwrap();
        assert_eq!(result.text, "heard:ja-JP");
        assert_eq!(result.language, "ja-JP");
        assert_eq!(result.provider, "stub");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_requested_language_wins() {
        let result = service(StubProvider::new("heard:"))
            .transcribe_audio(b"data", "memo.wav", Some("en-US"))
            .await
            .unwrap();
        assert_eq!(result.language, "en-US");
    }

    #[tokio::test]
    async fn test_oversized_audio_is_rejected_before_provider() {
        let provider = StubProvider::new("x");
        let mut config = VoiceConfig::default();
        config.max_audio_bytes = 4;
        let voice = VoiceService::with_provider(config, provider.clone());

        let error = voice.transcribe_audio(b"12345", "a.wav", None).await.unwrap_err();
        assert_eq!(error.code(), "payload_too_large");
        assert!(error.is_client_error());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_input_and_empty_transcript() {
        let voice = service(StubProvider::new(""));
        assert_eq!(
            voice.transcribe_audio(b"", "a.wav", None).await.unwrap_err().code(),
            "invalid_audio"
        );
        assert_eq!(
            voice.transcribe_audio(b"x", "a.wav", None).await.unwrap_err().code(),
            "empty_transcript"
        );
    }

    #[test]
    fn test_google_without_credentials_is_config_error() {
        let error = VoiceService::new(VoiceConfig::default(), None).err().unwrap();
        assert_eq!(error.code(), "voice_config");
    }
}
