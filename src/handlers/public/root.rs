use axum::extract::State;
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET / - Service name, version and route map
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "endpoints": {
            "auth": "/api/auth",
            "articles": "/api/articles",
            "categories": "/api/categories",
            "org": "/api/org",
            "ads": "/api/ads",
            "uploads": "/uploads"
        }
    }))
}

/// GET /health - Database ping; 503 while the store is unreachable
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    DatabaseManager::health_check(&state.pool).await.map_err(|e| {
        tracing::warn!("Health check failed: {}", e);
        ApiError::service_unavailable("Database unavailable")
    })?;

    Ok(ApiResponse::success(json!({
        "status": "ok",
        "database": "ok"
    })))
}
