use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::database::models::{VoteTally, VoteTarget};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::VoteService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub target: VoteTarget,
    pub target_id: i64,
    /// +1 or -1
    pub value: i16,
}

/// POST /api/votes - Vote on an article or comment
///
/// Repeating the same vote withdraws it; the opposite value replaces it.
pub async fn cast(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<VoteRequest>,
) -> ApiResult<VoteTally> {
    if payload.value != 1 && payload.value != -1 {
        return Err(crate::error::ApiError::invalid_field("value", "must be 1 or -1"));
    }

    let tally = VoteService::new(state.pool.clone())
        .cast(user.id, payload.target, payload.target_id, payload.value)
        .await?;
    Ok(ApiResponse::success(tally))
}

/// GET /api/votes/:target/:id - Tally for one target, with the caller's vote
pub async fn tally(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((target, id)): Path<(VoteTarget, i64)>,
) -> ApiResult<VoteTally> {
    let tally = VoteService::new(state.pool.clone())
        .tally(target, id, Some(user.id))
        .await?;
    Ok(ApiResponse::success(tally))
}
