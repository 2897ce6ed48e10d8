use sqlx::PgPool;

use crate::database::models::Comment;
use crate::database::DatabaseError;
use crate::services::tree::{build_forest, TreeNode};
use crate::services::ServiceError;

const COMMENT_SELECT: &str = "
    SELECT cm.id, cm.article_id, cm.parent_id, cm.author_id, u.username AS author_username,
           cm.body, cm.created_at
    FROM comments cm
    JOIN users u ON u.id = cm.author_id";

#[derive(Debug, Clone)]
pub struct NewComment {
    pub parent_id: Option<i64>,
    pub body: String,
}

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Comments on an approved article, as reply threads.
    pub async fn thread(&self, article_id: i64, max_depth: usize) -> Result<Vec<TreeNode<Comment>>, ServiceError> {
        self.ensure_public_article(article_id).await?;

        let sql = format!("{} WHERE cm.article_id = $1", COMMENT_SELECT);
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(article_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        Ok(build_forest(comments, max_depth)?)
    }

    pub async fn get(&self, id: i64) -> Result<Comment, DatabaseError> {
        let sql = format!("{} WHERE cm.id = $1", COMMENT_SELECT);
        sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Comment {} not found", id)))
    }

    /// Post to an approved article. A reply's parent must sit on the same article, and
    /// the reply may not nest deeper than `max_depth` (a top-level comment is depth 1).
    pub async fn create(
        &self,
        article_id: i64,
        author_id: i64,
        new_comment: NewComment,
        max_depth: usize,
    ) -> Result<Comment, DatabaseError> {
        self.ensure_public_article(article_id).await?;

        if let Some(parent_id) = new_comment.parent_id {
            let parent_article: Option<i64> = sqlx::query_scalar("SELECT article_id FROM comments WHERE id = $1")
                .bind(parent_id)
                .fetch_optional(&self.pool)
                .await?;
            match parent_article {
                Some(a) if a == article_id => {}
                Some(_) => {
                    return Err(DatabaseError::Invalid(
                        "Parent comment belongs to a different article".to_string(),
                    ))
                }
                None => return Err(DatabaseError::Invalid(format!("Parent comment {} does not exist", parent_id))),
            }

            let parent_depth = self.depth_of(parent_id, max_depth).await?;
            if parent_depth >= max_depth {
                return Err(DatabaseError::Invalid(format!(
                    "Replies cannot nest deeper than {} levels",
                    max_depth
                )));
            }
        }

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO comments (article_id, parent_id, author_id, body)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(article_id)
        .bind(new_comment.parent_id)
        .bind(author_id)
        .bind(&new_comment.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DatabaseError::on_reference(e, "Article or parent comment no longer exists", "Comment already exists")
        })?;

        tracing::info!("User {} commented on article {}", author_id, article_id);
        self.get(id).await
    }

    /// Delete a comment with its replies and the votes on all of them.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "WITH RECURSIVE subtree AS (
                SELECT id FROM comments WHERE id = $1
                UNION
                SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
             )
             DELETE FROM votes
             WHERE target_type = 'comment' AND target_id IN (SELECT id FROM subtree)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Comment {} not found", id)));
        }

        tx.commit().await?;
        tracing::info!("Deleted comment {}", id);
        Ok(())
    }

    /// Levels from the thread root down to `id` inclusive, counted up to `limit + 1`.
    async fn depth_of(&self, id: i64, limit: usize) -> Result<usize, DatabaseError> {
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);
        let depth: Option<i32> = sqlx::query_scalar(
            "WITH RECURSIVE chain AS (
                SELECT id, parent_id, 1 AS depth FROM comments WHERE id = $1
                UNION ALL
                SELECT c.id, c.parent_id, chain.depth + 1
                FROM comments c JOIN chain ON c.id = chain.parent_id
                WHERE chain.depth <= $2
             )
             SELECT MAX(depth) FROM chain",
        )
        .bind(id)
        .bind(limit)
        .fetch_one(&self.pool)
        .await?;
        Ok(depth.map_or(0, |d| d.max(0) as usize))
    }

    async fn ensure_public_article(&self, article_id: i64) -> Result<(), DatabaseError> {
        let approved: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM articles WHERE id = $1 AND status = 'approved')",
        )
        .bind(article_id)
        .fetch_one(&self.pool)
        .await?;
        if !approved {
            return Err(DatabaseError::NotFound(format!("Article {} not found", article_id)));
        }
        Ok(())
    }
}
