pub mod auth;
pub mod rate_limit;
pub mod response;

pub use auth::{require_role, AuthUser, RoleGate};
pub use rate_limit::{rate_limit_middleware, ClientRateLimiter};
pub use response::{ApiResponse, ApiResult, Page};
