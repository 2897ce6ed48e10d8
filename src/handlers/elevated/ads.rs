use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::database::models::Ad;
use crate::handlers::validate::{double_option, non_blank, FieldErrors, MAX_NAME_LENGTH, MAX_TITLE_LENGTH};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{AdService, AdUpdate, NewAd};
use crate::state::AppState;

const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Deserialize)]
pub struct CreateAdRequest {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub placement: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub link_url: Option<Option<String>>,
    pub placement: Option<String>,
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub starts_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

/// GET /api/admin/ads - Every ad, including inactive and expired ones
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Ad>> {
    let ads = AdService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(ads))
}

/// POST /api/admin/ads
pub async fn create(State(state): State<AppState>, ApiJson(payload): ApiJson<CreateAdRequest>) -> ApiResult<Ad> {
    let mut errors = FieldErrors::new();
    errors.required("title", &payload.title, MAX_TITLE_LENGTH);
    errors.required("image_url", &payload.image_url, MAX_URL_LENGTH);
    errors.required("placement", &payload.placement, MAX_NAME_LENGTH);
    errors.max_len("link_url", payload.link_url.as_deref(), MAX_URL_LENGTH);
    errors.finish()?;

    let ad = AdService::new(state.pool.clone())
        .create(NewAd {
            title: payload.title.trim().to_string(),
            image_url: payload.image_url.trim().to_string(),
            link_url: non_blank(payload.link_url),
            placement: payload.placement.trim().to_string(),
            active: payload.active,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
        })
        .await?;
    Ok(ApiResponse::created(ad))
}

/// PUT /api/admin/ads/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateAdRequest>,
) -> ApiResult<Ad> {
    let mut errors = FieldErrors::new();
    errors.required_if_present("title", payload.title.as_deref(), MAX_TITLE_LENGTH);
    errors.required_if_present("image_url", payload.image_url.as_deref(), MAX_URL_LENGTH);
    errors.required_if_present("placement", payload.placement.as_deref(), MAX_NAME_LENGTH);
    errors.max_len("link_url", payload.link_url.as_ref().and_then(|l| l.as_deref()), MAX_URL_LENGTH);
    errors.finish()?;

    let ad = AdService::new(state.pool.clone())
        .update(
            id,
            AdUpdate {
                title: payload.title.map(|t| t.trim().to_string()),
                image_url: payload.image_url.map(|u| u.trim().to_string()),
                link_url: payload.link_url.map(non_blank),
                placement: payload.placement.map(|p| p.trim().to_string()),
                active: payload.active,
                starts_at: payload.starts_at,
                ends_at: payload.ends_at,
            },
        )
        .await?;
    Ok(ApiResponse::success(ad))
}

/// DELETE /api/admin/ads/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    AdService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::no_content())
}
