pub mod google;
pub mod whisper;

use std::sync::Arc;

use async_trait::async_trait;
use auth_oauth::TokenSource;

use crate::config::VoiceProvider;
use crate::error::{VoiceError, VoiceResult};
use crate::transcription::TranscriptionRequest;

/// Trait for voice recognition providers
#[async_trait]
pub trait VoiceProviderTrait: Send + Sync {
    /// Transcribe audio data to text; an empty string means nothing was recognised
    async fn transcribe(&self, audio_data: &[u8], request: &TranscriptionRequest) -> VoiceResult<String>;

    fn name(&self) -> &'static str;
}

/// Create a provider instance based on configuration.
///
/// The Google provider authenticates with `tokens`; Whisper uses its own key.
pub fn create_provider(
    config: &VoiceProvider,
    tokens: Option<Arc<dyn TokenSource>>,
) -> VoiceResult<Arc<dyn VoiceProviderTrait>> {
    match config {
        VoiceProvider::Google { .. } => {
            let tokens = tokens.ok_or_else(|| {
                VoiceError::Config("Google Speech requires service-account credentials".to_string())
            })?;
            Ok(Arc::new(google::GoogleProvider::new(config, tokens)?))
        }
        VoiceProvider::Whisper { .. } => Ok(Arc::new(whisper::WhisperProvider::new(config)?)),
    }
}

/// Shorten provider error bodies before they reach logs or responses
pub(crate) fn error_body(body: &str) -> String {
    error_common::DataSanitizer::new()
        .sanitize_for_logging(error_common::truncate_chars(body, 300))
}
