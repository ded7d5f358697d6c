use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use database_layer::{MedicationEntry, Record, SoapNote};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use voice_recognition_service::MAX_AUDIO_BYTES;

use crate::error::{ApiError, ApiResult};
use crate::handlers::animals::require_image;
use crate::handlers::form::FormData;
use crate::handlers::transcription::transcribe_upload;
use crate::server::VetChartServer;

#[derive(Debug, Serialize)]
pub struct CreateRecordResponse {
    pub record: Record,
    pub transcribed_text: Option<String>,
    pub auto_transcribe: bool,
    pub record_id: String,
    pub message: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordResponse {
    pub record_id: String,
    pub status: String,
}

/// Create a visit record from the record form.
///
/// SOAP content comes from `soap_json` or the four `soap_*` fields. With
/// `auto_transcribe` and no SOAP content, an attached recording is transcribed
/// and turned into a note; a failed transcription still saves the record.
pub async fn create_record(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<(StatusCode, Json<CreateRecordResponse>)> {
    let animal_id = form
        .first_text(&["animalId", "animal_id"])
        .ok_or_else(|| ApiError::validation("Field 'animalId' is required"))?;
    if server.repository.get_animal(animal_id).is_none() {
        return Err(ApiError::not_found(format!("Animal {}", animal_id)));
    }

    // Validate every field before anything is written to disk
    let mut soap = soap_from_form(&form)?;
    let medications = medications_from_form(&form)?;
    let billing_points = form
        .text("nosai_points")
        .map(|points| {
            points
                .parse::<i64>()
                .map_err(|_| ApiError::validation("Field 'nosai_points' must be an integer"))
        })
        .transpose()?;
    let audio = form.file("audio");
    let audio_limit = server
        .voice
        .as_ref()
        .map_or(MAX_AUDIO_BYTES, |voice| voice.max_audio_bytes());
    if audio.is_some_and(|audio| audio.size() > audio_limit) {
        return Err(ApiError::validation(format!(
            "Audio file must be at most {} MB",
            audio_limit / (1024 * 1024)
        )));
    }
    for image in form.files("images") {
        require_image(image)?;
    }

    let mut stored = Vec::new();
    let mut images = Vec::new();
    for image in form.files("images") {
        let file = server.file_store.save(&image.data, &image.filename).await?;
        images.push(file.url.clone());
        stored.push(file);
    }

    let auto_transcribe = form.flag("auto_transcribe");
    let mut audio_url = None;
    let mut transcribed_text = None;
    if let Some(audio) = audio {
        let file = server.file_store.save(&audio.data, &audio.filename).await?;
        audio_url = Some(file.url.clone());
        stored.push(file);

        if auto_transcribe && soap.is_empty() {
            match server.voice.as_ref() {
                Some(voice) => match transcribe_upload(voice, audio, form.text("lang")).await {
                    Ok(result) => {
                        if let Some(notes) = server.notes.as_ref() {
                            soap = notes.generate_soap_from_text(&result.text).await;
                        }
                        transcribed_text = Some(result.text);
                    }
                    Err(e) => warn!(error = %e, "Auto-transcription failed; saving record without it"),
                },
                None => warn!("Auto-transcription requested but no transcription service is configured"),
            }
        }
    }

    let mut record = Record::new(animal_id, soap);
    record.images = images;
    record.audio_url = audio_url;
    record.medications = medications;
    record.billing_points = billing_points;
    record.next_visit_date = form.text("next_visit_date").map(str::to_string);
    record.next_visit_time = form.text("next_visit_time").map(str::to_string);
    record.doctor = form.text("doctor").map(str::to_string);
    record.external_case_id = form.text("external_case_id").map(str::to_string);
    record.external_ref_url = form.text("external_ref_url").map(str::to_string);

    let record = match server.repository.add_record(record).await {
        Ok(record) => record,
        Err(e) => {
            server.file_store.discard(&stored).await;
            return Err(e.into());
        }
    };
    info!(animal_id = %record.animal_id, record_id = %record.id, "Record created");

    Ok((
        StatusCode::CREATED,
        Json(CreateRecordResponse {
            record_id: record.id.clone(),
            record,
            transcribed_text,
            auto_transcribe,
            message: "Record saved".to_string(),
            status: "success".to_string(),
        }),
    ))
}

/// Get one record by id
pub async fn get_record(
    State(server): State<VetChartServer>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<Record>> {
    server
        .repository
        .get_record(&record_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Record {}", record_id)))
}

/// Replace a record; the id comes from the path and the owning animal is kept
pub async fn update_record(
    State(server): State<VetChartServer>,
    Path(record_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Record>> {
    let location = server
        .repository
        .find_record(&record_id)
        .ok_or_else(|| ApiError::not_found(format!("Record {}", record_id)))?;

    let Value::Object(mut fields) = body else {
        return Err(ApiError::validation("Record body must be a JSON object"));
    };
    fields.insert("id".to_string(), Value::String(record_id.clone()));
    fields.insert("animalId".to_string(), Value::String(location.animal_id));
    let record: Record = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::validation(format!("Invalid record: {}", e)))?;

    let updated = server.repository.update_record(&record_id, record).await?;
    info!(record_id = %record_id, "Record updated");
    Ok(Json(updated))
}

/// Delete a record
pub async fn delete_record(
    State(server): State<VetChartServer>,
    Path(record_id): Path<String>,
) -> ApiResult<Json<DeleteRecordResponse>> {
    server.repository.delete_record(&record_id).await?;
    info!(record_id = %record_id, "Record deleted");
    Ok(Json(DeleteRecordResponse {
        record_id,
        status: "deleted".to_string(),
    }))
}

fn soap_from_form(form: &FormData) -> ApiResult<SoapNote> {
    if let Some(raw) = form.text("soap_json") {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ApiError::validation(format!("Invalid soap_json: {}", e)))?;
        if !value.is_object() {
            return Err(ApiError::validation("Invalid soap_json: expected a JSON object"));
        }
        return serde_json::from_value(value)
            .map_err(|e| ApiError::validation(format!("Invalid soap_json: {}", e)));
    }

    let field = |name: &str| form.text(name).unwrap_or_default().to_string();
    Ok(SoapNote::new(
        field("soap_s"),
        field("soap_o"),
        field("soap_a"),
        field("soap_p"),
    ))
}

fn medications_from_form(form: &FormData) -> ApiResult<Vec<MedicationEntry>> {
    form.text("medications_json")
        .map(|raw| {
            serde_json::from_str(raw)
                .map_err(|e| ApiError::validation(format!("Invalid medications_json: {}", e)))
        })
        .transpose()
        .map(Option::unwrap_or_default)
}
