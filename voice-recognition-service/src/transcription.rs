use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::AudioEncoding;

/// Parameters for one transcription call
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub filename: String,
    pub language_code: String,
    pub sample_rate_hertz: u32,
}

impl TranscriptionRequest {
    pub fn encoding(&self) -> AudioEncoding {
        AudioEncoding::from_filename(&self.filename)
    }
}

/// Transcription result from voice recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: String,
    pub provider: String,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}
