use sqlx::PgPool;

use crate::database::models::{VoteTally, VoteTarget};
use crate::database::DatabaseError;

pub struct VoteService {
    pool: PgPool,
}

impl VoteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cast `value` (+1/-1). Casting the same value again withdraws the vote;
    /// the opposite value replaces it. Returns the fresh tally.
    pub async fn cast(
        &self,
        user_id: i64,
        target: VoteTarget,
        target_id: i64,
        value: i16,
    ) -> Result<VoteTally, DatabaseError> {
        if value != 1 && value != -1 {
            return Err(DatabaseError::Invalid("Vote value must be 1 or -1".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        // Locking the target row serializes casts on it. Without it two identical first
        // votes both miss the vote row below and both upsert instead of toggling.
        // `table()` is a fixed identifier per enum variant.
        let lock_sql = format!("SELECT id FROM {} WHERE id = $1 FOR NO KEY UPDATE", target.table());
        let locked: Option<i64> = sqlx::query_scalar(&lock_sql)
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(DatabaseError::NotFound(format!("{} {} not found", target, target_id)));
        }

        let existing: Option<i16> = sqlx::query_scalar(
            "SELECT value FROM votes
             WHERE user_id = $1 AND target_type = $2 AND target_id = $3
             FOR UPDATE",
        )
        .bind(user_id)
        .bind(target)
        .bind(target_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing == Some(value) {
            sqlx::query("DELETE FROM votes WHERE user_id = $1 AND target_type = $2 AND target_id = $3")
                .bind(user_id)
                .bind(target)
                .bind(target_id)
                .execute(&mut *tx)
                .await?;
            tracing::info!("User {} withdrew vote on {} {}", user_id, target, target_id);
        } else {
            sqlx::query(
                "INSERT INTO votes (user_id, target_type, target_id, value)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (user_id, target_type, target_id)
                 DO UPDATE SET value = EXCLUDED.value, created_at = now()",
            )
            .bind(user_id)
            .bind(target)
            .bind(target_id)
            .bind(value)
            .execute(&mut *tx)
            .await?;
            tracing::info!("User {} voted {} on {} {}", user_id, value, target, target_id);
        }

        let tally = Self::tally_in(&mut tx, target, target_id, Some(user_id)).await?;
        tx.commit().await?;
        Ok(tally)
    }

    pub async fn tally(&self, target: VoteTarget, target_id: i64, viewer: Option<i64>) -> Result<VoteTally, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::tally_in(&mut conn, target, target_id, viewer).await
    }

    async fn tally_in(
        conn: &mut sqlx::PgConnection,
        target: VoteTarget,
        target_id: i64,
        viewer: Option<i64>,
    ) -> Result<VoteTally, DatabaseError> {
        let tally = sqlx::query_as::<_, VoteTally>(
            "SELECT
                COUNT(*) FILTER (WHERE value > 0) AS up,
                COUNT(*) FILTER (WHERE value < 0) AS down,
                COALESCE(SUM(value), 0)::BIGINT AS score,
                MAX(value) FILTER (WHERE user_id = $3) AS mine
             FROM votes
             WHERE target_type = $1 AND target_id = $2",
        )
        .bind(target)
        .bind(target_id)
        .bind(viewer)
        .fetch_one(conn)
        .await?;
        Ok(tally)
    }
}
