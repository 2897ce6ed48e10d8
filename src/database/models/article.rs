use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Approved,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub status: ArticleStatus,
    pub featured: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Select list shared by every article query; expects `articles a`, `categories c`, `users u`.
pub(crate) const ARTICLE_COLUMNS: &str = r#"
    a.id, a.title, a.slug, a.summary, a.body, a.image_url,
    a.category_id, c.slug AS category_slug,
    a.author_id, u.username AS author_username,
    a.status, a.featured, a.views, a.created_at, a.updated_at
"#;

pub(crate) const ARTICLE_FROM: &str = r#"
    FROM articles a
    LEFT JOIN categories c ON c.id = a.category_id
    LEFT JOIN users u ON u.id = a.author_id
"#;
