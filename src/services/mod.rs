pub mod ad_service;
pub mod article_service;
pub mod category_service;
pub mod comment_service;
pub mod org_service;
pub mod slug;
pub mod tree;
pub mod upload_service;
pub mod user_service;
pub mod vote_service;

pub use ad_service::{AdService, AdUpdate, NewAd};
pub use article_service::{ArticleQuery, ArticleService, ArticleUpdate, NewArticle};
pub use category_service::{CategoryService, CategoryUpdate, NewCategory};
pub use comment_service::{CommentService, NewComment};
pub use org_service::{NewPosition, OrgService, PositionUpdate};
pub use upload_service::{StoredUpload, UploadError, UploadService};
pub use user_service::{NewUser, ProfileUpdate, UserService};
pub use vote_service::VoteService;

use crate::database::DatabaseError;
use tree::TreeError;

/// Failure of a read that assembles a tree from stored rows
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Offset paging with both bounds clamped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_size: i64, max_size: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_size).clamp(1, max_size.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}
