pub mod ad;
pub mod article;
pub mod category;
pub mod comment;
pub mod org_position;
pub mod user;
pub mod vote;

pub use ad::Ad;
pub use article::{Article, ArticleStatus};
pub use category::Category;
pub use comment::Comment;
pub use org_position::OrgPosition;
pub use user::{PublicUser, User};
pub use vote::{VoteTally, VoteTarget};
