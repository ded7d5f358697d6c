//! Operator diagnostics, mounted only when `ENABLE_DEBUG_ENDPOINTS` is on

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::DataSanitizer;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::server::{IntegrationStatus, VetChartServer};

const PREVIEW_ANIMALS: usize = 5;

#[derive(Debug, Serialize)]
pub struct GoogleApisReport {
    pub spreadsheet_id_preview: Option<String>,
    pub animals_tab: String,
    pub records_tab: String,
    pub storage: String,
    pub write_policy: String,
    pub gemini_key_present: bool,
    pub transcription_provider: Option<String>,
    pub gcp: IntegrationStatus,
}

/// Configuration presence report; never includes key material
pub async fn google_apis(State(server): State<VetChartServer>) -> Json<GoogleApisReport> {
    let settings = server.repository.settings();
    Json(GoogleApisReport {
        spreadsheet_id_preview: server.integrations.spreadsheet_id_preview(),
        animals_tab: settings.animals_tab.clone(),
        records_tab: settings.records_tab.clone(),
        storage: server.storage_mode().to_string(),
        write_policy: format!("{:?}", settings.write_policy).to_lowercase(),
        gemini_key_present: server.integrations.gemini_key_present,
        transcription_provider: server.voice.as_ref().map(|v| v.provider_name().to_string()),
        gcp: server.integrations.as_ref().clone(),
    })
}

/// Rebuild the index from the spreadsheet on demand
pub async fn reload_sheets(State(server): State<VetChartServer>) -> Response {
    match server.repository.load_from_remote().await {
        Ok(summary) => {
            let preview: Vec<String> = server
                .repository
                .list_animals()
                .into_iter()
                .take(PREVIEW_ANIMALS)
                .map(|animal| animal.id)
                .collect();
            info!(animals = summary.animals, records = summary.records, "Manual reload complete");
            Json(json!({
                "ok": true,
                "animals_count": server.repository.animal_count(),
                "records_count": summary.records,
                "skipped_rows": summary.skipped_rows,
                "animals_preview": preview,
            }))
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, code = e.code(), "Manual reload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": DataSanitizer::new().sanitize_for_logging(&e.to_string()),
                    "code": e.code(),
                })),
            )
                .into_response()
        }
    }
}
