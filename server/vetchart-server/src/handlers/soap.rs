use std::sync::Arc;

use axum::{extract::State, response::Json};
use database_layer::SoapNote;
use note_generation_service::SoapGenerator;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers::form::FormData;
use crate::handlers::transcription::{audio_part, transcribe_upload, voice_service};
use crate::server::VetChartServer;

pub const DEFAULT_TARGET_LANG: &str = "en";

#[derive(Debug, Serialize)]
pub struct SoapResponse {
    pub soap_notes: SoapNote,
    pub original_text: String,
    pub status: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslationResponse {
    pub translated: String,
    pub target_lang: String,
    /// `None` when no generation service is configured and the text is echoed back
    pub service: Option<String>,
}

/// SOAP note from a recording or from already transcribed text, optionally translated
pub async fn generate_soap(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<Json<SoapResponse>> {
    let notes = soap_generator(&server)?;

    let (text, transcription_service) = match audio_part(&form) {
        Some(audio) => {
            let voice = voice_service(&server)?;
            let result = transcribe_upload(voice, audio, form.first_text(&["lang", "language"])).await?;
            (result.text, Some(result.provider))
        }
        None => {
            let text = form.first_text(&["transcribed_text", "text"]).ok_or_else(|| {
                ApiError::validation("Either an 'audio' file or 'transcribed_text' is required")
            })?;
            (text.to_string(), None)
        }
    };

    let mut note = notes.generate_soap_from_text(&text).await;
    let target_lang = form.text("target_lang").map(str::to_string);
    if let Some(target) = target_lang.as_deref() {
        note = notes.translate_note(&note, target).await;
    }
    info!(chars = text.chars().count(), translated = target_lang.is_some(), "SOAP note generated");

    Ok(Json(SoapResponse {
        soap_notes: note,
        original_text: text,
        status: "success".to_string(),
        service: notes.provider_name().to_string(),
        transcription_service,
        target_lang,
    }))
}

/// SOAP note from free text
pub async fn generate_soap_from_text(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<Json<SoapResponse>> {
    let text = form
        .first_text(&["text", "transcribed_text"])
        .ok_or_else(|| ApiError::validation("Field 'text' is required"))?;
    let notes = soap_generator(&server)?;

    Ok(Json(SoapResponse {
        soap_notes: notes.generate_soap_from_text(text).await,
        original_text: text.to_string(),
        status: "success".to_string(),
        service: notes.provider_name().to_string(),
        transcription_service: None,
        target_lang: None,
    }))
}

/// Translate free text; echoes it back untouched without a generation service
pub async fn translate(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<Json<TranslationResponse>> {
    let text = form.require("text")?;
    let target_lang = form.text("target_lang").unwrap_or(DEFAULT_TARGET_LANG);

    let (translated, service) = match server.notes.as_ref() {
        Some(notes) => (
            notes.translate_text(text, target_lang).await,
            Some(notes.provider_name().to_string()),
        ),
        None => (text.to_string(), None),
    };

    Ok(Json(TranslationResponse {
        translated,
        target_lang: target_lang.to_string(),
        service,
    }))
}

pub(crate) fn soap_generator(server: &VetChartServer) -> ApiResult<&Arc<SoapGenerator>> {
    server
        .notes
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("SOAP generation service is not configured"))
}
