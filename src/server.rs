use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::Role;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{rate_limit_middleware, require_role, RoleGate};
use crate::services::upload_service::UPLOADS_ROUTE;
use crate::state::AppState;

/// Build the full router for `state`.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.uploads.dir);
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(editor_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .nest_service(UPLOADS_ROUTE, uploads)
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(public::auth::register))
        .route("/api/auth/login", post(public::auth::login))
        .route("/api/auth/logout", post(public::auth::logout))
        .route("/api/articles", get(public::articles::list))
        .route("/api/articles/featured", get(public::articles::featured))
        .route("/api/articles/popular", get(public::articles::popular))
        .route("/api/articles/:id", get(public::articles::show))
        .route("/api/articles/:id/comments", get(public::articles::comments))
        .route("/api/categories", get(public::categories::list))
        .route("/api/categories/:category", get(public::categories::show))
        .route("/api/org/tree", get(public::org::tree))
        .route("/api/org/positions", get(public::org::positions))
        .route("/api/ads", get(public::ads::list))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(protected::session::me).put(protected::session::update_me))
        .route("/api/articles/:id/comments", post(protected::comments::create))
        .route("/api/comments/:id", delete(protected::comments::delete))
        .route("/api/votes", post(protected::votes::cast))
        .route("/api/votes/:target/:id", get(protected::votes::tally))
        .route_layer(middleware::from_fn_with_state(
            RoleGate::new(state, Role::User),
            require_role,
        ))
}

fn editor_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/manage/articles", get(elevated::articles::manage_list))
        .route("/api/articles", post(elevated::articles::create))
        .route(
            "/api/articles/:id",
            put(elevated::articles::update).delete(elevated::articles::delete),
        )
        .route(
            "/api/articles/:id/feature",
            put(elevated::articles::feature).delete(elevated::articles::unfeature),
        )
        .route("/api/categories", post(elevated::categories::create))
        .route(
            "/api/categories/:category",
            put(elevated::categories::update).delete(elevated::categories::delete),
        )
        .route("/api/org/positions", post(elevated::org::create))
        .route(
            "/api/org/positions/:id",
            put(elevated::org::update).delete(elevated::org::delete),
        )
        .route("/api/uploads", post(elevated::uploads::create))
        .route_layer(middleware::from_fn_with_state(
            RoleGate::new(state, Role::Editor),
            require_role,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/articles/:id/approve", put(elevated::articles::approve))
        .route("/api/admin/users", get(elevated::users::list))
        .route("/api/admin/users/:id/role", put(elevated::users::set_role))
        .route("/api/admin/users/:id", delete(elevated::users::delete))
        .route("/api/admin/ads", get(elevated::ads::list).post(elevated::ads::create))
        .route(
            "/api/admin/ads/:id",
            put(elevated::ads::update).delete(elevated::ads::delete),
        )
        .route_layer(middleware::from_fn_with_state(
            RoleGate::new(state, Role::Admin),
            require_role,
        ))
}

/// Credentialed CORS for the configured origins; `*` allows any origin.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::AUTHORIZATION];

    if config.security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true);
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

/// Bind and serve until the process is stopped.
///
/// The pool connects lazily, so the server comes up (and `/health` reports 503)
/// even when the database is unreachable.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.validate().map_err(anyhow::Error::msg)?;

    let pool = DatabaseManager::connect(&config.database)?;
    if config.database.run_migrations {
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            tracing::error!("Migrations failed, continuing without them: {}", e);
        }
    }

    let state = AppState::new(pool, config.clone())?;
    if let Some(limiter) = &state.limiter {
        limiter.spawn_eviction();
        tracing::info!(
            "Rate limiting {} requests per {}s per client",
            config.api.rate_limit_requests,
            config.api.rate_limit_window_secs
        );
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        "Newsdesk API listening on http://{} ({:?})",
        listener.local_addr()?,
        config.environment
    );

    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
