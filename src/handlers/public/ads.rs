use axum::extract::State;
use serde::Deserialize;

use crate::database::models::Ad;
use crate::handlers::ApiQuery;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::AdService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdQuery {
    pub placement: Option<String>,
}

/// GET /api/ads?placement= - Active ads inside their schedule
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<AdQuery>) -> ApiResult<Vec<Ad>> {
    let placement = query.placement.as_deref().map(str::trim).filter(|p| !p.is_empty());
    let ads = AdService::new(state.pool.clone()).live(placement).await?;
    Ok(ApiResponse::success(ads))
}
