use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::models::Ad;
use crate::database::DatabaseError;

const AD_COLUMNS: &str = "id, title, image_url, link_url, placement, active, starts_at, ends_at, created_at";

#[derive(Debug, Clone)]
pub struct NewAd {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub placement: String,
    pub active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct AdUpdate {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<Option<String>>,
    pub placement: Option<String>,
    pub active: Option<bool>,
    pub starts_at: Option<Option<DateTime<Utc>>>,
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

pub struct AdService {
    pool: PgPool,
}

impl AdService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active ads whose schedule covers now, optionally for one placement.
    pub async fn live(&self, placement: Option<&str>) -> Result<Vec<Ad>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM ads
             WHERE active
               AND (starts_at IS NULL OR starts_at <= now())
               AND (ends_at IS NULL OR ends_at > now())
               AND ($1::TEXT IS NULL OR placement = $1)
             ORDER BY created_at DESC, id DESC",
            AD_COLUMNS
        );
        let ads = sqlx::query_as::<_, Ad>(&sql)
            .bind(placement)
            .fetch_all(&self.pool)
            .await?;
        Ok(ads)
    }

    pub async fn list(&self) -> Result<Vec<Ad>, DatabaseError> {
        let sql = format!("SELECT {} FROM ads ORDER BY id", AD_COLUMNS);
        let ads = sqlx::query_as::<_, Ad>(&sql).fetch_all(&self.pool).await?;
        Ok(ads)
    }

    pub async fn create(&self, new_ad: NewAd) -> Result<Ad, DatabaseError> {
        check_schedule(new_ad.starts_at, new_ad.ends_at)?;

        let sql = format!(
            "INSERT INTO ads (title, image_url, link_url, placement, active, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            AD_COLUMNS
        );
        let ad = sqlx::query_as::<_, Ad>(&sql)
            .bind(&new_ad.title)
            .bind(&new_ad.image_url)
            .bind(&new_ad.link_url)
            .bind(&new_ad.placement)
            .bind(new_ad.active)
            .bind(new_ad.starts_at)
            .bind(new_ad.ends_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created ad {} for placement '{}'", ad.id, ad.placement);
        Ok(ad)
    }

    pub async fn update(&self, id: i64, update: AdUpdate) -> Result<Ad, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM ads WHERE id = $1 FOR UPDATE", AD_COLUMNS);
        let current = sqlx::query_as::<_, Ad>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Ad {} not found", id)))?;

        let merged = NewAd {
            title: update.title.unwrap_or(current.title),
            image_url: update.image_url.unwrap_or(current.image_url),
            link_url: update.link_url.unwrap_or(current.link_url),
            placement: update.placement.unwrap_or(current.placement),
            active: update.active.unwrap_or(current.active),
            starts_at: update.starts_at.unwrap_or(current.starts_at),
            ends_at: update.ends_at.unwrap_or(current.ends_at),
        };
        check_schedule(merged.starts_at, merged.ends_at)?;

        let sql = format!(
            "UPDATE ads SET title = $2, image_url = $3, link_url = $4, placement = $5,
                active = $6, starts_at = $7, ends_at = $8
             WHERE id = $1
             RETURNING {}",
            AD_COLUMNS
        );
        let ad = sqlx::query_as::<_, Ad>(&sql)
            .bind(id)
            .bind(&merged.title)
            .bind(&merged.image_url)
            .bind(&merged.link_url)
            .bind(&merged.placement)
            .bind(merged.active)
            .bind(merged.starts_at)
            .bind(merged.ends_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!("Updated ad {}", id);
        Ok(ad)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let deleted = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Ad {} not found", id)));
        }
        tracing::info!("Deleted ad {}", id);
        Ok(())
    }
}

fn check_schedule(starts_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> Result<(), DatabaseError> {
    match (starts_at, ends_at) {
        (Some(start), Some(end)) if start >= end => {
            Err(DatabaseError::Invalid("Ad must end after it starts".to_string()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn schedule_must_be_ordered() {
        let now = Utc::now();
        assert!(check_schedule(None, None).is_ok());
        assert!(check_schedule(Some(now), None).is_ok());
        assert!(check_schedule(Some(now), Some(now + Duration::days(1))).is_ok());
        assert!(matches!(
            check_schedule(Some(now), Some(now)),
            Err(DatabaseError::Invalid(_))
        ));
    }
}
