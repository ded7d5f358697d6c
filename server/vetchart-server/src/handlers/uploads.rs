use axum::{extract::State, response::Json};

use crate::error::{ApiError, ApiResult};
use crate::handlers::animals::require_image;
use crate::handlers::form::FormData;
use crate::server::VetChartServer;
use crate::storage::StoredFile;

/// Store one image and return where it is served from
pub async fn upload_image(
    State(server): State<VetChartServer>,
    form: FormData,
) -> ApiResult<Json<StoredFile>> {
    let image = form
        .file("file")
        .or_else(|| form.file("image"))
        .ok_or_else(|| ApiError::validation("An image file is required in field 'file'"))?;
    if image.data.is_empty() {
        return Err(ApiError::validation("Uploaded image is empty"));
    }
    require_image(image)?;

    Ok(Json(server.file_store.save(&image.data, &image.filename).await?))
}
