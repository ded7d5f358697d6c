use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use database_layer::{Animal, AnimalFilter, Record};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers::form::{FormData, UploadedFile};
use crate::server::VetChartServer;

/// Animal with its visit history and a digest of it
#[derive(Debug, Serialize)]
pub struct AnimalDetail {
    pub animal: Animal,
    pub records: Vec<Record>,
    pub summary: String,
}

/// List animals, optionally searched and filtered
pub async fn list_animals(
    State(server): State<VetChartServer>,
    Query(filter): Query<AnimalFilter>,
) -> Json<Vec<Animal>> {
    Json(server.repository.filter_animals(&filter))
}

/// Get one animal with records and summary
pub async fn get_animal(
    State(server): State<VetChartServer>,
    Path(animal_id): Path<String>,
) -> ApiResult<Json<AnimalDetail>> {
    let animal = server
        .repository
        .get_animal(&animal_id)
        .ok_or_else(|| ApiError::not_found(format!("Animal {}", animal_id)))?;
    let summary = server.repository.summary(&animal_id)?;

    Ok(Json(AnimalDetail {
        records: animal.records.clone(),
        animal,
        summary,
    }))
}

/// Register an animal from the intake form, storing its photo if one was attached
pub async fn create_animal(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<(StatusCode, Json<Animal>)> {
    let microchip = form.require("microchip_number")?;
    let name = form.require("name")?;
    if server.repository.get_animal(microchip).is_some() {
        return Err(ApiError::conflict(format!(
            "Animal with microchip {} already exists",
            microchip
        )));
    }

    let mut animal = Animal::new(microchip, name);
    animal.age = form
        .text("age")
        .map(|age| {
            age.parse::<u32>()
                .map_err(|_| ApiError::validation("Field 'age' must be a non-negative integer"))
        })
        .transpose()?;
    animal.sex = form.text("sex").map(str::to_string);
    animal.breed = form.text("breed").map(str::to_string);
    animal.farm_id = form.first_text(&["farm_id", "owner"]).map(str::to_string);

    let mut thumbnail = None;
    if let Some(photo) = form.file("file").or_else(|| form.file("thumbnail")) {
        require_image(photo)?;
        let stored = server.file_store.save(&photo.data, &photo.filename).await?;
        animal.thumbnail_url = Some(stored.url.clone());
        thumbnail = Some(stored);
    }

    let created = match server.repository.add_animal(animal).await {
        Ok(created) => created,
        Err(e) => {
            if let Some(stored) = thumbnail {
                server.file_store.discard(&[stored]).await;
            }
            return Err(e.into());
        }
    };
    info!(animal_id = %created.id, "Animal registered");
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) fn require_image(file: &UploadedFile) -> ApiResult<()> {
    match file.content_type.as_deref() {
        Some(content_type)
            if !content_type.starts_with("image/") && content_type != "application/octet-stream" =>
        {
            Err(ApiError::validation(
                format!("'{}' is not an image ({})", file.filename, content_type),
            ))
        }
        _ => Ok(()),
    }
}
