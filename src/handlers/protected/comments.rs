use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::auth::Role;
use crate::database::models::Comment;
use crate::error::ApiError;
use crate::handlers::validate::{FieldErrors, MAX_COMMENT_LENGTH};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{CommentService, NewComment};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
    pub parent_id: Option<i64>,
}

/// POST /api/articles/:id/comments - Comment on an approved article, or reply to a comment
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(article_id): Path<i64>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> ApiResult<Comment> {
    let mut errors = FieldErrors::new();
    errors.required("body", &payload.body, MAX_COMMENT_LENGTH);
    errors.finish()?;

    let comment = CommentService::new(state.pool.clone())
        .create(
            article_id,
            user.id,
            NewComment {
                parent_id: payload.parent_id,
                body: payload.body.trim().to_string(),
            },
            state.config.comments.max_depth,
        )
        .await?;
    Ok(ApiResponse::created(comment))
}

/// DELETE /api/comments/:id - Authors delete their own comments; editors any
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    let service = CommentService::new(state.pool.clone());
    let comment = service.get(id).await?;

    if !user.owns_or_has(comment.author_id, Role::Editor) {
        tracing::warn!("User '{}' tried to delete comment {} by another author", user.username, id);
        return Err(ApiError::forbidden("Only the author or an editor can delete this comment"));
    }

    service.delete(id).await?;
    Ok(ApiResponse::no_content())
}
