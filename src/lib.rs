use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Routing segregated by access level (Public, Admin).
pub mod routes;
use routes::{admin, public};

// --- Public Re-exports ---

pub use auth::{AuthGate, AuthUser};
pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use service::AuthService;

use password::PasswordHasher;
use repository::AccountDirectoryState;
use token::{SigningKey, TokenError, TokenIssuer, TokenVerifier};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and `ToSchema` models,
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::home_page, handlers::get_public_menu, handlers::get_public_categories,
        handlers::get_public_restaurants, handlers::register_user, handlers::login,
        handlers::add_restaurant, handlers::add_menu_item, handlers::add_categories,
        handlers::get_restaurants, handlers::get_categories, handlers::delete_restaurants,
        handlers::delete_categories
    ),
    components(
        schemas(
            models::Role, models::AccountResponse, models::RegisterRequest, models::LoginRequest,
            models::TokenResponse, models::Restaurant, models::NewRestaurant, models::Category,
            models::NewCategory, models::MenuItem, models::NewMenuItem, models::MenuOverview,
            models::RestaurantList, models::CategoryList, models::CategoryCreated,
            models::MessageResponse, error::ErrorResponse,
        )
    ),
    tags(
        (name = "restaurant-menu", description = "Restaurant menu API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of every service a request may need.
/// Built once at startup and shared by all requests.
#[derive(Clone)]
pub struct AppState {
    /// Menu persistence.
    pub repo: RepositoryState,
    /// Register / login flows.
    pub auth: Arc<AuthService>,
    /// Bearer token verification and role check.
    pub gate: AuthGate,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// build
    ///
    /// Wires the auth components from `config`. The signing key is derived here, once,
    /// and handed to both the issuer and the verifier. Fails on an empty key or a token
    /// lifetime out of range.
    pub fn build(
        config: AppConfig,
        accounts: AccountDirectoryState,
        repo: RepositoryState,
    ) -> Result<Self, TokenError> {
        let key = SigningKey::from_secret(&config.jwt_secret)?;
        let issuer = TokenIssuer::new(key.clone(), config.token_ttl_hours)?;
        let gate = AuthGate::new(TokenVerifier::new(key));
        let auth = AuthService::new(accounts, PasswordHasher::new(config.bcrypt_cost), issuer);

        Ok(Self {
            repo,
            auth: Arc::new(auth),
            gate,
            config,
        })
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(app_state: &AppState) -> AuthGate {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing table, applies the admin gate and the global middleware, and
/// registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS: a single trusted browser origin, credentials allowed.
    let origin = HeaderValue::from_str(&state.config.cors_origin)
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Admin Routes: every request passes the authorization gate before reaching a handler.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span with method, uri and the generated `x-request-id`, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
