use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::{Article, ArticleStatus, Comment};
use crate::handlers::ApiQuery;
use crate::middleware::{ApiResponse, ApiResult, Page};
use crate::services::tree::TreeNode;
use crate::services::{ArticleQuery, ArticleService, CommentService, PageRequest};
use crate::state::AppState;

const POPULAR_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Category slug
    pub category: Option<String>,
    /// Full-text search, websearch syntax
    pub q: Option<String>,
}

/// GET /api/articles - Approved articles, newest first (or by relevance when `q` is set)
pub async fn list(State(state): State<AppState>, ApiQuery(query): ApiQuery<ListQuery>) -> ApiResult<Page<Article>> {
    let api = &state.config.api;
    let page = PageRequest::new(query.page, query.per_page, api.default_page_size, api.max_page_size);
    let filter = ArticleQuery {
        status: Some(ArticleStatus::Approved),
        category: query.category.filter(|c| !c.trim().is_empty()),
        search: query.q,
    };

    let (items, total) = ArticleService::new(state.pool.clone()).list(&filter, page).await?;
    Ok(ApiResponse::success(Page::new(items, page, total)))
}

/// GET /api/articles/featured - The featured article, or null
pub async fn featured(State(state): State<AppState>) -> ApiResult<Option<Article>> {
    let article = ArticleService::new(state.pool.clone()).featured().await?;
    Ok(ApiResponse::success(article))
}

/// GET /api/articles/popular - Most viewed approved articles
pub async fn popular(State(state): State<AppState>) -> ApiResult<Vec<Article>> {
    let articles = ArticleService::new(state.pool.clone()).popular(POPULAR_LIMIT).await?;
    Ok(ApiResponse::success(articles))
}

/// GET /api/articles/:id - One approved article; counts as a view
pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Article> {
    let article = ArticleService::new(state.pool.clone()).view(id).await?;
    Ok(ApiResponse::success(article))
}

/// GET /api/articles/:id/comments - Comment threads, oldest first at every level
pub async fn comments(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Vec<TreeNode<Comment>>> {
    let threads = CommentService::new(state.pool.clone())
        .thread(id, state.config.comments.max_depth)
        .await?;
    Ok(ApiResponse::success(threads))
}
