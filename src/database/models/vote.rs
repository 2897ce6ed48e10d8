use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum VoteTarget {
    Article,
    Comment,
}

impl VoteTarget {
    pub fn table(self) -> &'static str {
        match self {
            VoteTarget::Article => "articles",
            VoteTarget::Comment => "comments",
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteTarget::Article => f.write_str("article"),
            VoteTarget::Comment => f.write_str("comment"),
        }
    }
}

/// Aggregate votes on one target, plus the caller's own vote when known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct VoteTally {
    pub up: i64,
    pub down: i64,
    pub score: i64,
    pub mine: Option<i16>,
}
