use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::OrgPosition;
use crate::handlers::validate::{double_option, non_blank, FieldErrors, MAX_NAME_LENGTH, MAX_TITLE_LENGTH};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{NewPosition, OrgService, PositionUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePositionRequest {
    pub title: String,
    pub occupant_name: Option<String>,
    pub parent_id: Option<i64>,
    /// Defaults to true when no occupant is named
    pub is_vacant: Option<bool>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePositionRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub occupant_name: Option<Option<String>>,
    /// `null` moves the position to the root
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
    pub is_vacant: Option<bool>,
    pub sort_order: Option<i32>,
}

/// POST /api/org/positions
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePositionRequest>,
) -> ApiResult<OrgPosition> {
    let mut errors = FieldErrors::new();
    errors.required("title", &payload.title, MAX_TITLE_LENGTH);
    errors.max_len("occupant_name", payload.occupant_name.as_deref(), MAX_NAME_LENGTH);
    errors.finish()?;

    let occupant_name = non_blank(payload.occupant_name);
    let is_vacant = payload.is_vacant.unwrap_or(occupant_name.is_none());

    let position = OrgService::new(state.pool.clone())
        .create(NewPosition {
            title: payload.title.trim().to_string(),
            occupant_name,
            parent_id: payload.parent_id,
            is_vacant,
            sort_order: payload.sort_order,
        })
        .await?;
    Ok(ApiResponse::created(position))
}

/// PUT /api/org/positions/:id - Rename, re-staff or move a position
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdatePositionRequest>,
) -> ApiResult<OrgPosition> {
    let mut errors = FieldErrors::new();
    errors.required_if_present("title", payload.title.as_deref(), MAX_TITLE_LENGTH);
    errors.max_len(
        "occupant_name",
        payload.occupant_name.as_ref().and_then(|o| o.as_deref()),
        MAX_NAME_LENGTH,
    );
    if payload.parent_id == Some(Some(id)) {
        errors.add("parent_id", "a position cannot be its own parent");
    }
    errors.finish()?;

    let position = OrgService::new(state.pool.clone())
        .update(
            id,
            PositionUpdate {
                title: payload.title.map(|t| t.trim().to_string()),
                occupant_name: payload.occupant_name.map(non_blank),
                parent_id: payload.parent_id,
                is_vacant: payload.is_vacant,
                sort_order: payload.sort_order,
            },
        )
        .await?;
    Ok(ApiResponse::success(position))
}

/// DELETE /api/org/positions/:id - Only positions without subordinates
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    OrgService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::no_content())
}
