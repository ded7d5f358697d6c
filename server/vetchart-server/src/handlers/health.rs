use axum::{extract::State, response::Json};
use serde::Serialize;
use voice_recognition_service::SUPPORTED_AUDIO_FORMATS;

use crate::server::VetChartServer;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    /// `sheets` or `local`
    pub storage: String,
    pub animals: usize,
    pub generation_enabled: bool,
    pub transcription_enabled: bool,
    pub supported_audio_formats: Vec<String>,
}

/// Health check handler
pub async fn health_check(State(server): State<VetChartServer>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: server.storage_mode().to_string(),
        animals: server.repository.animal_count(),
        generation_enabled: server.notes.is_some(),
        transcription_enabled: server.voice.is_some(),
        supported_audio_formats: SUPPORTED_AUDIO_FORMATS.iter().map(|f| (*f).to_string()).collect(),
    })
}
