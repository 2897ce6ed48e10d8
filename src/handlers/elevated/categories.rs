use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::Category;
use crate::handlers::validate::{double_option, non_blank, FieldErrors, MAX_NAME_LENGTH};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::slug::{is_valid_slug, slugify};
use crate::services::{CategoryService, CategoryUpdate, NewCategory};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    /// Derived from `name` when absent
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// POST /api/categories
pub async fn create(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> ApiResult<Category> {
    let slug = match non_blank(payload.slug) {
        Some(slug) => slug,
        None => slugify(&payload.name),
    };

    let mut errors = FieldErrors::new();
    errors.required("name", &payload.name, MAX_NAME_LENGTH);
    if !is_valid_slug(&slug) {
        errors.add("slug", "must be lowercase letters, digits and single hyphens");
    }
    errors.finish()?;

    let category = CategoryService::new(state.pool.clone())
        .create(NewCategory {
            name: payload.name.trim().to_string(),
            slug,
            description: non_blank(payload.description),
        })
        .await?;
    Ok(ApiResponse::created(category))
}

/// PUT /api/categories/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    let mut errors = FieldErrors::new();
    errors.required_if_present("name", payload.name.as_deref(), MAX_NAME_LENGTH);
    if let Some(slug) = payload.slug.as_deref() {
        if !is_valid_slug(slug) {
            errors.add("slug", "must be lowercase letters, digits and single hyphens");
        }
    }
    errors.finish()?;

    let category = CategoryService::new(state.pool.clone())
        .update(
            id,
            CategoryUpdate {
                name: payload.name.map(|n| n.trim().to_string()),
                slug: payload.slug,
                description: payload.description.map(non_blank),
            },
        )
        .await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /api/categories/:id - Its articles become uncategorised
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    CategoryService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::no_content())
}
