use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::services::tree::TreeItem;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OrgPosition {
    pub id: i64,
    pub title: String,
    pub occupant_name: Option<String>,
    pub parent_id: Option<i64>,
    pub is_vacant: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl TreeItem for OrgPosition {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn sort_key(&self) -> i64 {
        i64::from(self.sort_order)
    }
}
