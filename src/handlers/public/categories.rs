use axum::extract::{Path, State};

use crate::database::models::Category;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::CategoryService;
use crate::state::AppState;

/// GET /api/categories - All categories by name
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    let categories = CategoryService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/categories/:slug
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Category> {
    let category = CategoryService::new(state.pool.clone()).get_by_slug(&slug).await?;
    Ok(ApiResponse::success(category))
}
