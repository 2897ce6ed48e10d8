use axum::extract::State;

use crate::database::models::OrgPosition;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tree::TreeNode;
use crate::services::OrgService;
use crate::state::AppState;

/// GET /api/org/tree - Org chart as nested positions
///
/// Siblings are ordered by `sort_order`, then id. Stored data that does not form
/// a forest (a parent cycle, a dangling parent, nesting deeper than `ORG_MAX_DEPTH`)
/// answers 500 instead of a partial chart.
pub async fn tree(State(state): State<AppState>) -> ApiResult<Vec<TreeNode<OrgPosition>>> {
    let forest = OrgService::new(state.pool.clone())
        .tree(state.config.org.max_depth)
        .await?;
    Ok(ApiResponse::success(forest))
}

/// GET /api/org/positions - Flat list of positions
pub async fn positions(State(state): State<AppState>) -> ApiResult<Vec<OrgPosition>> {
    let positions = OrgService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(positions))
}
