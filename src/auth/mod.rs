pub mod password;
pub mod role;
pub mod token;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
pub use role::Role;
pub use token::{Claims, TokenKeys};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Session lifetime of {0} hours is out of range")]
    InvalidExpiry(u64),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token expired")]
    Expired,
    #[error("Password hashing error: {0}")]
    Hashing(String),
}
