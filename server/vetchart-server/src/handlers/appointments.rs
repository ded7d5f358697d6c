use axum::{
    extract::{Query, State},
    response::Json,
};
use database_layer::Appointment;
use serde::Deserialize;

use crate::server::VetChartServer;

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentQuery {
    /// `YYYY-MM-DD`; omitted lists every scheduled visit
    pub date: Option<String>,
}

/// Upcoming visits derived from records' next-visit fields
pub async fn list_appointments(
    State(server): State<VetChartServer>,
    Query(query): Query<AppointmentQuery>,
) -> Json<Vec<Appointment>> {
    let date = query.date.as_deref().map(str::trim).filter(|d| !d.is_empty());
    Json(server.repository.appointments(date))
}
