use axum::extract::{Extension, Path, State};
use serde::Deserialize;

use crate::database::models::{Article, ArticleStatus};
use crate::handlers::validate::{double_option, non_blank, FieldErrors, MAX_TITLE_LENGTH};
use crate::handlers::{ApiJson, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Page};
use crate::services::{ArticleQuery, ArticleService, ArticleUpdate, NewArticle, PageRequest};
use crate::state::AppState;

const MAX_SUMMARY_LENGTH: usize = 500;
const MAX_BODY_LENGTH: usize = 200_000;

#[derive(Debug, Deserialize)]
pub struct ManageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<ArticleStatus>,
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub summary: Option<Option<String>>,
    pub body: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
}

/// GET /api/manage/articles?status= - Every article regardless of status
pub async fn manage_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ManageQuery>,
) -> ApiResult<Page<Article>> {
    let api = &state.config.api;
    let page = PageRequest::new(query.page, query.per_page, api.default_page_size, api.max_page_size);
    let filter = ArticleQuery {
        status: query.status,
        category: query.category.filter(|c| !c.trim().is_empty()),
        search: query.q,
    };

    let (items, total) = ArticleService::new(state.pool.clone()).list(&filter, page).await?;
    Ok(ApiResponse::success(Page::new(items, page, total)))
}

/// POST /api/articles - Draft a new article; it stays pending until approved
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateArticleRequest>,
) -> ApiResult<Article> {
    let mut errors = FieldErrors::new();
    errors.required("title", &payload.title, MAX_TITLE_LENGTH);
    errors.required("body", &payload.body, MAX_BODY_LENGTH);
    errors.max_len("summary", payload.summary.as_deref(), MAX_SUMMARY_LENGTH);
    errors.finish()?;

    let article = ArticleService::new(state.pool.clone())
        .create(
            user.id,
            NewArticle {
                title: payload.title.trim().to_string(),
                summary: non_blank(payload.summary),
                body: payload.body,
                image_url: non_blank(payload.image_url),
                category_id: payload.category_id,
            },
        )
        .await?;
    Ok(ApiResponse::created(article))
}

/// PUT /api/articles/:id - Partial update; `null` clears optional fields
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateArticleRequest>,
) -> ApiResult<Article> {
    let mut errors = FieldErrors::new();
    errors.required_if_present("title", payload.title.as_deref(), MAX_TITLE_LENGTH);
    errors.required_if_present("body", payload.body.as_deref(), MAX_BODY_LENGTH);
    errors.max_len("summary", payload.summary.as_ref().and_then(|s| s.as_deref()), MAX_SUMMARY_LENGTH);
    errors.finish()?;

    let update = ArticleUpdate {
        title: payload.title.map(|t| t.trim().to_string()),
        summary: payload.summary.map(non_blank),
        body: payload.body,
        image_url: payload.image_url.map(non_blank),
        category_id: payload.category_id,
    };

    let article = ArticleService::new(state.pool.clone()).update(id, update).await?;
    Ok(ApiResponse::success(article))
}

/// DELETE /api/articles/:id - Remove an article with its comments and votes
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    ArticleService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// PUT /api/articles/:id/feature - Make this the only featured article
pub async fn feature(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Article> {
    let article = ArticleService::new(state.pool.clone()).set_featured(id).await?;
    Ok(ApiResponse::success(article))
}

/// DELETE /api/articles/:id/feature - Stop featuring this article
pub async fn unfeature(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Article> {
    let article = ArticleService::new(state.pool.clone()).unset_featured(id).await?;
    Ok(ApiResponse::success(article))
}

/// PUT /api/articles/:id/approve - Publish a pending article (admin)
pub async fn approve(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Article> {
    let article = ArticleService::new(state.pool.clone()).approve(id).await?;
    tracing::info!("Article {} approved by '{}'", id, user.username);
    Ok(ApiResponse::success(article))
}
