use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::auth::Role;
use crate::database::models::PublicUser;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// GET /api/admin/users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<PublicUser>> {
    let users = UserService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(users.into_iter().map(PublicUser::from).collect()))
}

/// PUT /api/admin/users/:id/role - Change a user's role
///
/// Takes effect at the user's next sign-in; existing tokens keep their role until
/// they expire. Demoting the last admin answers 409.
pub async fn set_role(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<RoleRequest>,
) -> ApiResult<PublicUser> {
    let user = UserService::new(state.pool.clone()).set_role(id, payload.role).await?;
    tracing::info!("Admin '{}' set role of '{}' to {}", admin.username, user.username, user.role);
    Ok(ApiResponse::success(PublicUser::from(user)))
}

/// DELETE /api/admin/users/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    if admin.id == id {
        return Err(ApiError::conflict("Admins cannot delete their own account"));
    }
    UserService::new(state.pool.clone()).delete(id).await?;
    tracing::info!("Admin '{}' deleted user {}", admin.username, id);
    Ok(ApiResponse::no_content())
}
