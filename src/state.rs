use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthError, TokenKeys};
use crate::config::AppConfig;
use crate::middleware::rate_limit::ClientRateLimiter;

/// Shared handles cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenKeys>,
    /// `None` when rate limiting is disabled.
    pub limiter: Option<Arc<ClientRateLimiter>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self, AuthError> {
        let tokens = TokenKeys::new(&config.security.jwt_secret, config.security.jwt_expiry_hours)?;

        let limiter = if config.api.enable_rate_limiting {
            ClientRateLimiter::new(
                config.api.rate_limit_requests,
                Duration::from_secs(config.api.rate_limit_window_secs),
                config.api.trust_forwarded_for,
            )
            .map(Arc::new)
        } else {
            None
        };

        Ok(Self {
            pool,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            limiter,
        })
    }
}
