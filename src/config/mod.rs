use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Signing secret used when none is configured. Refused in production.
pub const DEVELOPMENT_JWT_SECRET: &str = "newsdesk-development-secret";

/// One year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub org: OrgConfig,
    pub comments: CommentConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub trust_forwarded_for: bool,
    pub max_request_size_bytes: usize,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgConfig {
    pub max_depth: usize,
}

/// Reply nesting limit; posting below it is refused, and thread assembly uses the same bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentConfig {
    pub max_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_width: u32,
    pub jpeg_quality: u8,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("NEWSDESK_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_TRUST_FORWARDED_FOR") {
            self.api.trust_forwarded_for = v.parse().unwrap_or(self.api.trust_forwarded_for);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_NAME") {
            self.security.cookie_name = v;
        }
        if let Ok(v) = env::var("SECURITY_COOKIE_SECURE") {
            self.security.cookie_secure = v.parse().unwrap_or(self.security.cookie_secure);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        // Org chart overrides
        if let Ok(v) = env::var("ORG_MAX_DEPTH") {
            self.org.max_depth = v.parse().unwrap_or(self.org.max_depth);
        }

        if let Ok(v) = env::var("COMMENT_MAX_DEPTH") {
            self.comments.max_depth = v.parse().unwrap_or(self.comments.max_depth);
        }

        // Upload overrides
        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(v);
        }
        if let Ok(v) = env::var("UPLOAD_MAX_WIDTH") {
            self.uploads.max_width = v.parse().unwrap_or(self.uploads.max_width);
        }
        if let Ok(v) = env::var("UPLOAD_JPEG_QUALITY") {
            self.uploads.jpeg_quality = v.parse().unwrap_or(self.uploads.jpeg_quality);
        }

        self
    }

    /// Startup checks that should stop the server rather than run misconfigured.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }
        if self.environment == Environment::Production
            && self.security.jwt_secret == DEVELOPMENT_JWT_SECRET
        {
            return Err("JWT_SECRET must be set in production".to_string());
        }
        if self.api.rate_limit_requests == 0 || self.api.rate_limit_window_secs == 0 {
            return Err("rate limit requests and window must be positive".to_string());
        }
        if self.org.max_depth == 0 {
            return Err("ORG_MAX_DEPTH must be positive".to_string());
        }
        if self.comments.max_depth == 0 {
            return Err("COMMENT_MAX_DEPTH must be positive".to_string());
        }
        if self.security.jwt_expiry_hours == 0 || self.security.jwt_expiry_hours > MAX_JWT_EXPIRY_HOURS {
            return Err(format!(
                "SECURITY_JWT_EXPIRY_HOURS must be between 1 and {}",
                MAX_JWT_EXPIRY_HOURS
            ));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                trust_forwarded_for: false,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                default_page_size: 20,
                max_page_size: 100,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cookie_name: "access_token".to_string(),
                cookie_secure: false,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                bcrypt_cost: 4,
            },
            org: OrgConfig { max_depth: 32 },
            comments: CommentConfig { max_depth: 16 },
            uploads: UploadConfig {
                dir: PathBuf::from("uploads"),
                max_width: 1600,
                jpeg_quality: 85,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 300,
                rate_limit_window_secs: 60,
                trust_forwarded_for: true,
                max_request_size_bytes: 8 * 1024 * 1024, // 8MB
                default_page_size: 20,
                max_page_size: 100,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                cookie_name: "access_token".to_string(),
                cookie_secure: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                bcrypt_cost: 10,
            },
            org: OrgConfig { max_depth: 32 },
            comments: CommentConfig { max_depth: 16 },
            uploads: UploadConfig {
                dir: PathBuf::from("uploads"),
                max_width: 1600,
                jpeg_quality: 82,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 120,
                rate_limit_window_secs: 60,
                trust_forwarded_for: true,
                max_request_size_bytes: 8 * 1024 * 1024, // 8MB
                default_page_size: 20,
                max_page_size: 50,
            },
            security: SecurityConfig {
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 12,
                cookie_name: "access_token".to_string(),
                cookie_secure: true,
                cors_origins: vec!["https://news.example.com".to_string()],
                bcrypt_cost: 12,
            },
            org: OrgConfig { max_depth: 32 },
            comments: CommentConfig { max_depth: 16 },
            uploads: UploadConfig {
                dir: PathBuf::from("/var/lib/newsdesk/uploads"),
                max_width: 1600,
                jpeg_quality: 80,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert!(config.database.run_migrations);
        assert_eq!(config.security.cookie_name, "access_token");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert!(config.security.cookie_secure);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn production_refuses_development_secret() {
        let mut config = AppConfig::production();
        assert!(config.validate().is_err());

        config.security.jwt_secret = "a-real-secret-from-the-vault".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = u64::MAX;
        assert!(config.validate().is_err());
        config.security.jwt_expiry_hours = 0;
        assert!(config.validate().is_err());
        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn comment_depth_is_separate_from_org_depth() {
        let mut config = AppConfig::development();
        assert!(config.comments.max_depth < config.org.max_depth);
        config.comments.max_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rate_limit_window_is_rejected() {
        let mut config = AppConfig::staging();
        config.api.rate_limit_window_secs = 0;
        assert!(config.validate().is_err());
    }
}
