use sqlx::PgPool;

use crate::auth::Role;
use crate::database::models::User;
use crate::database::DatabaseError;

/// Serialises registrations and role changes so "first user" and "last admin"
/// decisions see a stable user table.
const USERS_LOCK_KEY: i64 = 0x6e65_7773_0001;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, display_name, bio, avatar_url, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an account. The first account ever registered becomes an admin.
    pub async fn register(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(USERS_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let has_users: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&mut *tx)
            .await?;
        let role = if has_users { Role::User } else { Role::Admin };

        let sql = format!(
            "INSERT INTO users (username, email, password_hash, display_name, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.display_name)
            .bind(role)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DatabaseError::on_unique(e, "Username or email already taken"))?;

        tx.commit().await?;

        if role == Role::Admin {
            tracing::info!("First user '{}' registered and promoted to admin", user.username);
        } else {
            tracing::info!("Registered user '{}'", user.username);
        }
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> Result<User, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Overwrite only the profile fields that are present.
    pub async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET
                email = COALESCE($2, email),
                display_name = COALESCE($3, display_name),
                bio = COALESCE($4, bio),
                avatar_url = COALESCE($5, avatar_url),
                password_hash = COALESCE($6, password_hash),
                updated_at = now()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&update.email)
            .bind(&update.display_name)
            .bind(&update.bio)
            .bind(&update.avatar_url)
            .bind(&update.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::on_unique(e, "Email already taken"))?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    /// Change a user's role. Demoting the last admin is refused.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(USERS_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let current: Role = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;

        if current == Role::Admin && role != Role::Admin {
            Self::ensure_other_admin(&mut tx).await?;
        }

        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("User '{}' role changed {} -> {}", user.username, current, role);
        Ok(user)
    }

    pub async fn set_role_by_username(&self, username: &str, role: Role) -> Result<User, DatabaseError> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User '{}' not found", username)))?;
        self.set_role(user.id, role).await
    }

    /// Remove an account. Deleting the last admin is refused.
    ///
    /// The user's comments go with them, replies included, so every vote on that
    /// subtree is removed here as well as the user's own votes.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(USERS_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let current: Role = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;

        if current == Role::Admin {
            Self::ensure_other_admin(&mut tx).await?;
        }

        sqlx::query(
            "WITH RECURSIVE subtree AS (
                SELECT id FROM comments WHERE author_id = $1
                UNION
                SELECT c.id FROM comments c JOIN subtree s ON c.parent_id = s.id
             )
             DELETE FROM votes
             WHERE user_id = $1
                OR (target_type = 'comment' AND target_id IN (SELECT id FROM subtree))",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    async fn ensure_other_admin(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<(), DatabaseError> {
        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&mut **tx)
            .await?;
        if admins <= 1 {
            return Err(DatabaseError::Conflict("Cannot remove the last admin".to_string()));
        }
        Ok(())
    }
}
