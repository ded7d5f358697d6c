use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;
use voice_recognition_service::{TranscriptionResult, VoiceService};

use crate::error::{ApiError, ApiResult};
use crate::handlers::form::{FormData, UploadedFile};
use crate::server::VetChartServer;

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub transcription: String,
    /// Same text under the field name the record form uses
    pub transcribed_text: String,
    pub filename: String,
    pub file_size: usize,
    pub language: String,
    pub status: String,
    pub service: String,
}

/// Transcribe one uploaded recording
pub async fn transcribe(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<Json<TranscriptionResponse>> {
    let voice = voice_service(&server)?;
    let audio = audio_part(&form)
        .ok_or_else(|| ApiError::validation("An audio file is required in field 'audio'"))?;
    let result = transcribe_upload(voice, audio, form.first_text(&["lang", "language"])).await?;

    Ok(Json(TranscriptionResponse {
        transcribed_text: result.text.clone(),
        transcription: result.text,
        filename: audio.filename.clone(),
        file_size: audio.size(),
        language: result.language,
        status: "success".to_string(),
        service: result.provider,
    }))
}

pub(crate) fn voice_service(server: &VetChartServer) -> ApiResult<&Arc<VoiceService>> {
    server
        .voice
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("Transcription service is not configured"))
}

pub(crate) fn audio_part(form: &FormData) -> Option<&UploadedFile> {
    form.file("audio").or_else(|| form.file("file"))
}

pub(crate) async fn transcribe_upload(
    voice: &VoiceService,
    audio: &UploadedFile,
    language: Option<&str>,
) -> ApiResult<TranscriptionResult> {
    Ok(voice
        .transcribe_audio(&audio.data, &audio.filename, language)
        .await?)
}
