use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::auth::MIN_PASSWORD_LENGTH;
use crate::database::models::PublicUser;
use crate::handlers::public::auth::hash_blocking;
use crate::handlers::validate::{is_plausible_email, non_blank, FieldErrors, MAX_NAME_LENGTH};
use crate::handlers::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{ProfileUpdate, UserService};
use crate::state::AppState;

const MAX_BIO_LENGTH: usize = 2000;
const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub password: Option<String>,
}

/// GET /api/auth/me - The signed-in user's profile
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<PublicUser> {
    let account = UserService::new(state.pool.clone()).get(user.id).await?;
    Ok(ApiResponse::success(PublicUser::from(account)))
}

/// PUT /api/auth/me - Update profile fields; absent fields are left alone
///
/// Role cannot be changed here.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<ProfileRequest>,
) -> ApiResult<PublicUser> {
    let email = non_blank(payload.email);

    let mut errors = FieldErrors::new();
    if let Some(email) = email.as_deref() {
        if !is_plausible_email(email) {
            errors.add("email", "is not a valid address");
        }
    }
    errors.max_len("display_name", payload.display_name.as_deref(), MAX_NAME_LENGTH);
    errors.max_len("bio", payload.bio.as_deref(), MAX_BIO_LENGTH);
    errors.max_len("avatar_url", payload.avatar_url.as_deref(), MAX_URL_LENGTH);
    if let Some(password) = payload.password.as_deref() {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add("password", format!("must be at least {} characters", MIN_PASSWORD_LENGTH));
        }
    }
    errors.finish()?;

    let password_hash = match payload.password {
        Some(password) => Some(hash_blocking(password, state.config.security.bcrypt_cost).await?),
        None => None,
    };

    let account = UserService::new(state.pool.clone())
        .update_profile(
            user.id,
            ProfileUpdate {
                email,
                display_name: payload.display_name,
                bio: payload.bio,
                avatar_url: payload.avatar_url,
                password_hash,
            },
        )
        .await?;

    tracing::info!("User '{}' updated their profile", account.username);
    Ok(ApiResponse::success(PublicUser::from(account)))
}
