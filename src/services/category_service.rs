use sqlx::PgPool;

use crate::database::models::Category;
use crate::database::DatabaseError;

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
}

pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Category>, DatabaseError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, DatabaseError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Category '{}' not found", slug)))
    }

    pub async fn create(&self, new_category: NewCategory) -> Result<Category, DatabaseError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug, description)
             VALUES ($1, $2, $3)
             RETURNING id, name, slug, description, created_at",
        )
        .bind(&new_category.name)
        .bind(&new_category.slug)
        .bind(&new_category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique(e, format!("Category slug '{}' already exists", new_category.slug)))?;

        tracing::info!("Created category '{}'", category.slug);
        Ok(category)
    }

    /// Insert or refresh by slug; used by fixture loading.
    pub async fn upsert(&self, new_category: NewCategory) -> Result<Category, DatabaseError> {
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, description = EXCLUDED.description
             RETURNING id, name, slug, description, created_at",
        )
        .bind(&new_category.name)
        .bind(&new_category.slug)
        .bind(&new_category.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    pub async fn update(&self, id: i64, update: CategoryUpdate) -> Result<Category, DatabaseError> {
        let (description_set, description) = match update.description {
            Some(value) => (true, value),
            None => (false, None),
        };

        sqlx::query_as::<_, Category>(
            "UPDATE categories SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = CASE WHEN $4 THEN $5 ELSE description END
             WHERE id = $1
             RETURNING id, name, slug, description, created_at",
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.slug)
        .bind(description_set)
        .bind(&description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::on_unique(e, "Category slug already exists"))?
        .ok_or_else(|| DatabaseError::NotFound(format!("Category {} not found", id)))
    }

    /// Articles in the category become uncategorised.
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Category {} not found", id)));
        }
        tracing::info!("Deleted category {}", id);
        Ok(())
    }
}
