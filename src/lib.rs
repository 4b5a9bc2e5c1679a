// Book API - authentication and authorization core
// JWT access/refresh tokens, Argon2 password storage and role-gated routes

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ip_filter;
pub mod validation;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    handlers::{get_user_handler, login_handler, me_handler, refresh_handler, register_handler},
    require_auth, AuthGate, AuthService, TokenService, UserStore,
};
use config::Config;
use ip_filter::{ip_filter, IpAllowList};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        auth::handlers::refresh_handler,
        auth::handlers::me_handler,
        auth::handlers::get_user_handler,
    ),
    components(
        schemas(
            auth::models::Role,
            auth::models::RegisterRequest,
            auth::models::LoginRequest,
            auth::models::RefreshRequest,
            auth::models::TokenResponse,
            auth::models::AccessTokenResponse,
            auth::models::UserResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and token refresh"),
        (name = "users", description = "User administration")
    ),
    info(
        title = "Book Management API",
        version = "1.0.0",
        description = "Authentication and authorization for the book management backend"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: Arc<dyn UserStore>, config: &Config) -> Self {
        let tokens = Arc::new(TokenService::from_config(config));
        let auth = Arc::new(AuthService::new(store, tokens.clone()));
        Self { auth, tokens }
    }
}

/// Creates and configures the application router
///
/// Auth endpoints are public; `/api/auth/me` needs any valid access token and
/// `/api/users/:id` needs the admin role.
pub fn create_router(state: AppState, allow_list: IpAllowList) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", post(refresh_handler));

    let authenticated = Router::new()
        .route("/api/auth/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(
            AuthGate::any(state.tokens.clone()),
            require_auth,
        ));

    let admin = Router::new()
        .route("/api/users/:id", get(get_user_handler))
        .route_layer(middleware::from_fn_with_state(
            AuthGate::admin(state.tokens.clone()),
            require_auth,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(middleware::from_fn_with_state(allow_list, ip_filter))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
