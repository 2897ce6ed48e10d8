use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::article::{ARTICLE_COLUMNS, ARTICLE_FROM};
use crate::database::models::{Article, ArticleStatus};
use crate::database::DatabaseError;
use crate::services::slug::slugify;
use crate::services::PageRequest;

/// Listing filters; `status: None` means every status (management views).
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub status: Option<ArticleStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
}

/// Partial update. The outer `Option` says "field present", the inner one allows
/// clearing nullable columns.
#[derive(Debug, Clone, Default)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub body: Option<String>,
    pub image_url: Option<Option<String>>,
    pub category_id: Option<Option<i64>>,
}

impl ArticleUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.body.is_none()
            && self.image_url.is_none()
            && self.category_id.is_none()
    }
}

pub struct ArticleService {
    pool: PgPool,
}

impl ArticleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of articles plus the total matching count.
    pub async fn list(&self, query: &ArticleQuery, page: PageRequest) -> Result<(Vec<Article>, i64), DatabaseError> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        builder.push(ARTICLE_COLUMNS).push(ARTICLE_FROM);
        push_filters(&mut builder, query, search);

        match search {
            Some(q) => {
                builder
                    .push(" ORDER BY ts_rank(a.search, websearch_to_tsquery('simple', ")
                    .push_bind(q.to_string())
                    .push(")) DESC, a.created_at DESC, a.id DESC");
            }
            None => {
                builder.push(" ORDER BY a.created_at DESC, a.id DESC");
            }
        }
        builder
            .push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;

        let mut counter: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) ");
        counter.push(ARTICLE_FROM);
        push_filters(&mut counter, query, search);
        let total: i64 = counter.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((articles, total))
    }

    /// The featured article, if it is approved.
    pub async fn featured(&self) -> Result<Option<Article>, DatabaseError> {
        let sql = format!(
            "SELECT {} {} WHERE a.featured AND a.status = 'approved'",
            ARTICLE_COLUMNS, ARTICLE_FROM
        );
        let article = sqlx::query_as::<_, Article>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    pub async fn popular(&self, limit: i64) -> Result<Vec<Article>, DatabaseError> {
        let sql = format!(
            "SELECT {} {} WHERE a.status = 'approved'
             ORDER BY a.views DESC, a.created_at DESC, a.id DESC
             LIMIT $1",
            ARTICLE_COLUMNS, ARTICLE_FROM
        );
        let articles = sqlx::query_as::<_, Article>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    /// Public read: approved articles only, bumping the view counter.
    pub async fn view(&self, id: i64) -> Result<Article, DatabaseError> {
        let sql = format!(
            "WITH a AS (
                UPDATE articles SET views = views + 1
                WHERE id = $1 AND status = 'approved'
                RETURNING *
             )
             SELECT {} FROM a
             LEFT JOIN categories c ON c.id = a.category_id
             LEFT JOIN users u ON u.id = a.author_id",
            ARTICLE_COLUMNS
        );
        sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Article {} not found", id)))
    }

    /// Any status, no side effects.
    pub async fn get(&self, id: i64) -> Result<Article, DatabaseError> {
        let sql = format!("SELECT {} {} WHERE a.id = $1", ARTICLE_COLUMNS, ARTICLE_FROM);
        sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Article {} not found", id)))
    }

    /// New articles start pending. The slug comes from the title, suffixed until unique.
    pub async fn create(&self, author_id: i64, new_article: NewArticle) -> Result<Article, DatabaseError> {
        let base = match slugify(&new_article.title) {
            s if s.is_empty() => "article".to_string(),
            s => s,
        };
        let slug = self.unique_slug(&base).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO articles (title, slug, summary, body, image_url, category_id, author_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id",
        )
        .bind(&new_article.title)
        .bind(&slug)
        .bind(&new_article.summary)
        .bind(&new_article.body)
        .bind(&new_article.image_url)
        .bind(new_article.category_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::on_reference(e, "Category does not exist", "Slug already in use")
        })?;

        tracing::info!("Created article {} ({})", id, slug);
        self.get(id).await
    }

    /// Apply the fields present in `update`; the slug stays stable.
    pub async fn update(&self, id: i64, update: ArticleUpdate) -> Result<Article, DatabaseError> {
        if update.is_empty() {
            return self.get(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE articles SET updated_at = now()");
        if let Some(title) = update.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(summary) = update.summary {
            builder.push(", summary = ").push_bind(summary);
        }
        if let Some(body) = update.body {
            builder.push(", body = ").push_bind(body);
        }
        if let Some(image_url) = update.image_url {
            builder.push(", image_url = ").push_bind(image_url);
        }
        if let Some(category_id) = update.category_id {
            builder.push(", category_id = ").push_bind(category_id);
        }
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING id");

        let updated: Option<i64> = builder
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::on_reference(e, "Category does not exist", "Slug already in use")
            })?;

        match updated {
            Some(id) => {
                tracing::info!("Updated article {}", id);
                self.get(id).await
            }
            None => Err(DatabaseError::NotFound(format!("Article {} not found", id))),
        }
    }

    pub async fn approve(&self, id: i64) -> Result<Article, DatabaseError> {
        let updated = sqlx::query("UPDATE articles SET status = 'approved', updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Article {} not found", id)));
        }
        tracing::info!("Approved article {}", id);
        self.get(id).await
    }

    /// Make `id` the single featured article.
    pub async fn set_featured(&self, id: i64) -> Result<Article, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM articles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DatabaseError::NotFound(format!("Article {} not found", id)));
        }

        sqlx::query("UPDATE articles SET featured = false WHERE featured AND id <> $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE articles SET featured = true, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::on_unique(e, "Another article was featured concurrently"))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::on_unique(e, "Another article was featured concurrently"))?;

        tracing::info!("Article {} is now featured", id);
        self.get(id).await
    }

    pub async fn unset_featured(&self, id: i64) -> Result<Article, DatabaseError> {
        let updated = sqlx::query("UPDATE articles SET featured = false, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Article {} not found", id)));
        }
        tracing::info!("Article {} is no longer featured", id);
        self.get(id).await
    }

    /// Delete the article with its comments (cascade) and every vote on either.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM votes
             WHERE (target_type = 'article' AND target_id = $1)
                OR (target_type = 'comment' AND target_id IN (SELECT id FROM comments WHERE article_id = $1))",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Article {} not found", id)));
        }

        tx.commit().await?;
        tracing::info!("Deleted article {}", id);
        Ok(())
    }

    async fn unique_slug(&self, base: &str) -> Result<String, DatabaseError> {
        let taken: Vec<String> = sqlx::query_scalar("SELECT slug FROM articles WHERE slug = $1 OR slug LIKE $2")
            .bind(base)
            .bind(format!("{}-%", base))
            .fetch_all(&self.pool)
            .await?;
        Ok(next_free_slug(base, &taken))
    }
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a ArticleQuery, search: Option<&'a str>) {
    builder.push(" WHERE true");
    if let Some(status) = query.status {
        builder.push(" AND a.status = ").push_bind(status);
    }
    if let Some(category) = query.category.as_deref() {
        builder.push(" AND c.slug = ").push_bind(category);
    }
    if let Some(q) = search {
        builder
            .push(" AND a.search @@ websearch_to_tsquery('simple', ")
            .push_bind(q)
            .push(")");
    }
}

/// `base`, else the lowest `base-N` (N >= 2) not in `taken`.
fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.iter().any(|s| *s == candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_slug_keeps_base_when_unused() {
        assert_eq!(next_free_slug("budget-2025", &[]), "budget-2025");
        assert_eq!(next_free_slug("budget", &["budget-talks".to_string()]), "budget");
    }

    #[test]
    fn free_slug_suffixes_lowest_gap() {
        let taken = vec!["budget".to_string(), "budget-2".to_string(), "budget-4".to_string()];
        assert_eq!(next_free_slug("budget", &taken), "budget-3");
    }

    #[test]
    fn empty_update_detected() {
        assert!(ArticleUpdate::default().is_empty());
        let update = ArticleUpdate {
            summary: Some(None),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
