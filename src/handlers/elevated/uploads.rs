use axum::extract::{Multipart, State};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{StoredUpload, UploadService};
use crate::state::AppState;

/// POST /api/uploads - Multipart image upload (field `file`)
///
/// The image is scaled down to the configured maximum width and stored as JPEG.
/// The response carries the public `/uploads/...` URL.
pub async fn create(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<StoredUpload> {
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| {
            if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::PayloadTooLarge("Upload too large".to_string())
            } else {
                ApiError::bad_request(format!("Failed to read upload: {}", e))
            }
        })?;
        data = Some(bytes.to_vec());
        break;
    }

    let data = data.ok_or_else(|| ApiError::invalid_field("file", "is required"))?;

    let service = UploadService::new(&state.config.uploads, state.config.api.max_request_size_bytes);
    let stored = service.store(data).await?;
    Ok(ApiResponse::created(stored))
}
