use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::database::models::PublicUser;
use crate::error::{removal_cookie, ApiError};
use crate::handlers::validate::{is_plausible_email, is_valid_username, non_blank, FieldErrors, MAX_NAME_LENGTH};
use crate::handlers::ApiJson;
use crate::middleware::ApiResponse;
use crate::services::{NewUser, UserService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Session payload; the token is also set as an HttpOnly cookie
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub token: String,
    pub expires_in: i64,
}

/// POST /api/auth/register - Create an account and start a session
///
/// The first account registered on a fresh install becomes an admin.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let username = payload.username.trim().to_string();
    let email = non_blank(payload.email);
    let display_name = non_blank(payload.display_name);

    let mut errors = FieldErrors::new();
    if !is_valid_username(&username) {
        errors.add("username", "must be 3-32 letters, digits or underscores");
    }
    if payload.password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add("password", format!("must be at least {} characters", MIN_PASSWORD_LENGTH));
    }
    if let Some(email) = email.as_deref() {
        if !is_plausible_email(email) {
            errors.add("email", "is not a valid address");
        }
    }
    errors.max_len("display_name", display_name.as_deref(), MAX_NAME_LENGTH);
    errors.finish()?;

    let password_hash = hash_blocking(payload.password, state.config.security.bcrypt_cost).await?;

    let user = UserService::new(state.pool.clone())
        .register(NewUser {
            username,
            email,
            password_hash: Some(password_hash),
            display_name,
        })
        .await?;

    let session = start_session(&state, user)?;
    let jar = jar.add(session_cookie(&state, &session.token));
    Ok((jar, ApiResponse::created(session)))
}

/// POST /api/auth/login - Exchange credentials for a session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<SessionResponse>), ApiError> {
    let cookie_name = state.config.security.cookie_name.clone();
    let invalid = || ApiError::unauthorized("Invalid username or password", cookie_name.as_str());

    let mut errors = FieldErrors::new();
    errors.required("username", &payload.username, MAX_NAME_LENGTH);
    if payload.password.is_empty() {
        errors.add("password", "must not be empty");
    }
    errors.finish()?;

    let user = UserService::new(state.pool.clone())
        .find_by_username(payload.username.trim())
        .await?;

    let Some(user) = user else {
        tracing::warn!("Login failed for unknown user '{}'", payload.username.trim());
        return Err(invalid());
    };
    let Some(hash) = user.password_hash.clone() else {
        tracing::warn!("Login refused for '{}': no local password", user.username);
        return Err(invalid());
    };

    let password = payload.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Password check aborted: {}", e)))??;
    if !matches {
        tracing::warn!("Login failed for '{}': wrong password", user.username);
        return Err(invalid());
    }

    tracing::info!("User '{}' logged in", user.username);
    let session = start_session(&state, user)?;
    let jar = jar.add(session_cookie(&state, &session.token));
    Ok((jar, ApiResponse::success(session)))
}

/// POST /api/auth/logout - Clear the session cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, ApiResponse<()>) {
    let jar = jar.add(removal_cookie(&state.config.security.cookie_name));
    (jar, ApiResponse::no_content())
}

fn start_session(state: &AppState, user: crate::database::models::User) -> Result<SessionResponse, ApiError> {
    let token = state.tokens.sign(user.id, &user.username, user.role)?;
    Ok(SessionResponse {
        expires_in: state.tokens.ttl().num_seconds(),
        user: PublicUser::from(user),
        token,
    })
}

/// HttpOnly session cookie carrying `token`, living as long as the token.
pub(crate) fn session_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    let security = &state.config.security;
    let mut cookie = Cookie::new(security.cookie_name.clone(), token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(security.cookie_secure);
    cookie.set_max_age(time::Duration::seconds(state.tokens.ttl().num_seconds()));
    cookie
}

/// bcrypt off the async executor.
pub(crate) async fn hash_blocking(password: String, cost: u32) -> Result<String, ApiError> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| ApiError::internal_server_error(format!("Password hashing aborted: {}", e)))??;
    Ok(hash)
}
