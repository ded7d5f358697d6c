use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("Audio file too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Transcription produced no text")]
    EmptyTranscript,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VoiceError {
    pub fn code(&self) -> &'static str {
        match self {
            VoiceError::Config(_) => "voice_config",
            VoiceError::Provider(_) => "voice_provider",
            VoiceError::Authentication(_) => "voice_authentication",
            VoiceError::AudioProcessing(_) => "invalid_audio",
            VoiceError::PayloadTooLarge { .. } => "payload_too_large",
            VoiceError::EmptyTranscript => "empty_transcript",
            VoiceError::Network(_) => "voice_unreachable",
            VoiceError::Serialization(_) => "voice_decode",
        }
    }

    /// True when the caller sent something unusable, as opposed to a provider failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VoiceError::AudioProcessing(_) | VoiceError::PayloadTooLarge { .. }
        )
    }
}

pub type VoiceResult<T> = Result<T, VoiceError>;
