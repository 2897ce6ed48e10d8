use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::services::tree::TreeItem;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub parent_id: Option<i64>,
    pub author_id: i64,
    pub author_username: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl TreeItem for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    // Oldest reply first
    fn sort_key(&self) -> i64 {
        self.created_at.timestamp_micros()
    }
}
