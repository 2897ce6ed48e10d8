use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::auth::{AuthError, Claims, Role};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller, injected into request extensions by [`require_role`]
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Owners may always act on their own content; others need `role`.
    pub fn owns_or_has(&self, owner_id: i64, role: Role) -> bool {
        self.id == owner_id || self.role.implies(role)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

/// Minimum role for a group of routes, paired with the state needed to verify tokens
#[derive(Clone)]
pub struct RoleGate {
    pub state: AppState,
    pub required: Role,
}

impl RoleGate {
    pub fn new(state: AppState, required: Role) -> Self {
        Self { state, required }
    }
}

/// Auth guard: verify the session token, then permit iff its role implies the gate's role.
///
/// Missing, invalid or expired tokens answer 401 and clear the session cookie.
/// A valid token with too little privilege answers 403 and leaves the cookie alone.
pub async fn require_role(
    State(gate): State<RoleGate>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let cookie_name = &gate.state.config.security.cookie_name;

    let token = extract_token(&jar, cookie_name, request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required", cookie_name.as_str()))?;

    let claims = gate.state.tokens.verify(&token).map_err(|e| {
        match &e {
            AuthError::Expired => tracing::debug!("Rejected expired session token"),
            other => tracing::warn!("Rejected session token: {}", other),
        }
        ApiError::unauthorized("Authentication required", cookie_name.as_str())
    })?;

    if !claims.role.implies(gate.required) {
        tracing::warn!(
            "User '{}' ({}) denied: requires {}",
            claims.username,
            claims.role,
            gate.required
        );
        return Err(ApiError::forbidden(format!("Requires {} role", gate.required)));
    }

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Session cookie first, then `Authorization: Bearer`.
fn extract_token(jar: &CookieJar, cookie_name: &str, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn prefers_cookie_over_header() {
        let jar = CookieJar::new().add(Cookie::new("access_token", "from-cookie"));
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&jar, "access_token", &headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn falls_back_to_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_token(&CookieJar::new(), "access_token", &headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn missing_or_blank_is_none() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&CookieJar::new(), "access_token", &headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(extract_token(&CookieJar::new(), "access_token", &headers).is_none());

        let jar = CookieJar::new().add(Cookie::new("access_token", ""));
        assert!(extract_token(&jar, "access_token", &HeaderMap::new()).is_none());
    }

    #[test]
    fn owner_or_role() {
        let user = AuthUser { id: 5, username: "sam".into(), role: Role::User };
        assert!(user.owns_or_has(5, Role::Editor));
        assert!(!user.owns_or_has(6, Role::Editor));

        let editor = AuthUser { id: 9, username: "eve".into(), role: Role::Editor };
        assert!(editor.owns_or_has(5, Role::Editor));
    }
}
