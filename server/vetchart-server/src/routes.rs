use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::{
    handlers::{animals, appointments, debug, health, records, soap, transcription, uploads},
    server::VetChartServer,
};

/// Create health check routes
pub fn health_routes() -> Router<VetChartServer> {
    Router::new().route("/health", get(health::health_check))
}

/// Create animal routes
pub fn animal_routes() -> Router<VetChartServer> {
    Router::new()
        .route("/animals", get(animals::list_animals).post(animals::create_animal))
        .route("/animals/:id", get(animals::get_animal))
}

/// Create visit record routes
pub fn record_routes() -> Router<VetChartServer> {
    Router::new()
        .route("/records", post(records::create_record))
        .route(
            "/records/:id",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
}

/// Create upload routes
pub fn upload_routes() -> Router<VetChartServer> {
    Router::new().route("/uploads/images", post(uploads::upload_image))
}

/// Create transcription, SOAP generation and translation routes
pub fn ai_routes() -> Router<VetChartServer> {
    Router::new()
        .route("/transcribe", post(transcription::transcribe))
        .route("/generateSoap", post(soap::generate_soap))
        .route("/generateSoapFromText", post(soap::generate_soap_from_text))
        .route("/translate", post(soap::translate))
}

/// Create appointment routes
pub fn appointment_routes() -> Router<VetChartServer> {
    Router::new().route("/appointments", get(appointments::list_appointments))
}

/// Create debug routes
pub fn debug_routes() -> Router<VetChartServer> {
    Router::new()
        .route("/debug/google-apis", get(debug::google_apis))
        .route(
            "/debug/reload-sheets",
            get(debug::reload_sheets).post(debug::reload_sheets),
        )
}

/// Create all API routes
pub fn create_routes(enable_debug: bool, upload_dir: &std::path::Path) -> Router<VetChartServer> {
    let mut api = Router::new()
        .merge(animal_routes())
        .merge(record_routes())
        .merge(upload_routes())
        .merge(ai_routes())
        .merge(appointment_routes());
    if enable_debug {
        api = api.merge(debug_routes());
    }

    Router::new()
        .merge(health_routes())
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(upload_dir))
}
