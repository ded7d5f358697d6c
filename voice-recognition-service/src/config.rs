use serde::{Deserialize, Serialize};

use crate::error::{VoiceError, VoiceResult};

pub const DEFAULT_LANGUAGE_CODE: &str = "ja-JP";
pub const DEFAULT_SAMPLE_RATE_HERTZ: u32 = 16_000;
pub const DEFAULT_SPEECH_API_URL: &str = "https://speech.googleapis.com";
pub const DEFAULT_SPEECH_MODEL: &str = "medical";
pub const DEFAULT_WHISPER_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";

/// Uploads above this size are rejected before any provider call
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VoiceProvider {
    /// Google Cloud Speech-to-Text v1 `speech:recognize`
    Google { api_url: String, model: String },
    /// OpenAI-compatible `/v1/audio/transcriptions`, hosted or self-hosted
    Whisper {
        api_url: String,
        api_key: Option<String>,
        model: String,
    },
}

impl VoiceProvider {
    pub fn name(&self) -> &'static str {
        match self {
            VoiceProvider::Google { .. } => "google",
            VoiceProvider::Whisper { .. } => "whisper",
        }
    }
}

/// Voice recognition service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceConfig {
    pub provider: VoiceProvider,
    pub default_language: String,
    pub sample_rate_hertz: u32,
    pub max_audio_bytes: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            provider: VoiceProvider::Google {
                api_url: DEFAULT_SPEECH_API_URL.to_string(),
                model: DEFAULT_SPEECH_MODEL.to_string(),
            },
            default_language: DEFAULT_LANGUAGE_CODE.to_string(),
            sample_rate_hertz: DEFAULT_SAMPLE_RATE_HERTZ,
            max_audio_bytes: MAX_AUDIO_BYTES,
        }
    }
}

impl VoiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> VoiceResult<Self> {
        let provider = match std::env::var("VOICE_PROVIDER")
            .unwrap_or_else(|_| "google".to_string())
            .to_lowercase()
            .as_str()
        {
            "google" => VoiceProvider::Google {
                api_url: std::env::var("SPEECH_API_URL")
                    .unwrap_or_else(|_| DEFAULT_SPEECH_API_URL.to_string()),
                model: std::env::var("SPEECH_MODEL")
                    .unwrap_or_else(|_| DEFAULT_SPEECH_MODEL.to_string()),
            },
            "whisper" => VoiceProvider::Whisper {
                api_url: std::env::var("WHISPER_API_URL")
                    .unwrap_or_else(|_| DEFAULT_WHISPER_API_URL.to_string()),
                api_key: std::env::var("WHISPER_API_KEY").ok(),
                model: std::env::var("WHISPER_MODEL")
                    .unwrap_or_else(|_| DEFAULT_WHISPER_MODEL.to_string()),
            },
            other => {
                return Err(VoiceError::Config(format!(
                    "Unknown voice provider: {}",
                    other
                )))
            }
        };

        let default_language = std::env::var("SPEECH_LANGUAGE_CODE")
            .ok()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE_CODE.to_string());

        Ok(Self {
            provider,
            default_language,
            ..Self::default()
        })
    }
}
