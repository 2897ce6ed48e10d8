use sqlx::PgPool;

use crate::database::models::OrgPosition;
use crate::database::DatabaseError;
use crate::services::tree::{build_forest, TreeNode};
use crate::services::ServiceError;

/// Serialises re-parenting so two concurrent moves cannot close a loop between them.
const ORG_LOCK_KEY: i64 = 0x6e65_7773_0002;

const POSITION_COLUMNS: &str = "id, title, occupant_name, parent_id, is_vacant, sort_order, created_at";

#[derive(Debug, Clone)]
pub struct NewPosition {
    pub title: String,
    pub occupant_name: Option<String>,
    pub parent_id: Option<i64>,
    pub is_vacant: bool,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default)]
pub struct PositionUpdate {
    pub title: Option<String>,
    pub occupant_name: Option<Option<String>>,
    pub parent_id: Option<Option<i64>>,
    pub is_vacant: Option<bool>,
    pub sort_order: Option<i32>,
}

pub struct OrgService {
    pool: PgPool,
}

impl OrgService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flat list, parents before their ordering peers.
    pub async fn list(&self) -> Result<Vec<OrgPosition>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM org_positions ORDER BY parent_id NULLS FIRST, sort_order, id",
            POSITION_COLUMNS
        );
        let positions = sqlx::query_as::<_, OrgPosition>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(positions)
    }

    /// The whole chart as a forest rooted at parentless positions.
    pub async fn tree(&self, max_depth: usize) -> Result<Vec<TreeNode<OrgPosition>>, ServiceError> {
        let positions = self.list().await?;
        Ok(build_forest(positions, max_depth)?)
    }

    pub async fn get(&self, id: i64) -> Result<OrgPosition, DatabaseError> {
        let sql = format!("SELECT {} FROM org_positions WHERE id = $1", POSITION_COLUMNS);
        sqlx::query_as::<_, OrgPosition>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Position {} not found", id)))
    }

    pub async fn create(&self, new_position: NewPosition) -> Result<OrgPosition, DatabaseError> {
        let sql = format!(
            "INSERT INTO org_positions (title, occupant_name, parent_id, is_vacant, sort_order)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            POSITION_COLUMNS
        );
        let position = sqlx::query_as::<_, OrgPosition>(&sql)
            .bind(&new_position.title)
            .bind(&new_position.occupant_name)
            .bind(new_position.parent_id)
            .bind(new_position.is_vacant)
            .bind(new_position.sort_order)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                DatabaseError::on_reference(e, "Parent position does not exist", "Position already exists")
            })?;

        tracing::info!("Created position {} '{}'", position.id, position.title);
        Ok(position)
    }

    /// Apply the present fields. Moving a position under itself or one of its
    /// descendants is rejected.
    pub async fn update(&self, id: i64, update: PositionUpdate) -> Result<OrgPosition, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ORG_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let select = format!("SELECT {} FROM org_positions WHERE id = $1 FOR UPDATE", POSITION_COLUMNS);
        let current = sqlx::query_as::<_, OrgPosition>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Position {} not found", id)))?;

        if let Some(Some(parent_id)) = update.parent_id {
            if parent_id == id {
                return Err(DatabaseError::Invalid("A position cannot be its own parent".to_string()));
            }

            let creates_cycle: bool = sqlx::query_scalar(
                "WITH RECURSIVE subtree AS (
                    SELECT id FROM org_positions WHERE id = $1
                    UNION
                    SELECT p.id FROM org_positions p JOIN subtree s ON p.parent_id = s.id
                 )
                 SELECT EXISTS (SELECT 1 FROM subtree WHERE id = $2)",
            )
            .bind(id)
            .bind(parent_id)
            .fetch_one(&mut *tx)
            .await?;
            if creates_cycle {
                return Err(DatabaseError::Invalid(format!(
                    "Position {} is a descendant of position {}",
                    parent_id, id
                )));
            }
        }

        let sql = format!(
            "UPDATE org_positions SET title = $2, occupant_name = $3, parent_id = $4,
                is_vacant = $5, sort_order = $6
             WHERE id = $1
             RETURNING {}",
            POSITION_COLUMNS
        );
        let position = sqlx::query_as::<_, OrgPosition>(&sql)
            .bind(id)
            .bind(update.title.unwrap_or(current.title))
            .bind(update.occupant_name.unwrap_or(current.occupant_name))
            .bind(update.parent_id.unwrap_or(current.parent_id))
            .bind(update.is_vacant.unwrap_or(current.is_vacant))
            .bind(update.sort_order.unwrap_or(current.sort_order))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                DatabaseError::on_reference(e, "Parent position does not exist", "Position already exists")
            })?;

        tx.commit().await?;
        tracing::info!("Updated position {}", id);
        Ok(position)
    }

    /// Remove a leaf position. Positions with children are refused.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM org_positions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DatabaseError::NotFound(format!("Position {} not found", id)));
        }

        let children: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM org_positions WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if children > 0 {
            return Err(DatabaseError::HasDependents(format!(
                "Position {} has {} subordinate position(s)",
                id, children
            )));
        }

        sqlx::query("DELETE FROM org_positions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::on_foreign_key(e, format!("Position {} has subordinate positions", id)))?;

        tx.commit().await?;
        tracing::info!("Deleted position {}", id);
        Ok(())
    }
}
