use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no bearer token: read-only menu browsing plus the two
/// identity entry points (sign-up and login).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Restaurants, categories and menu items in a single body for the landing page.
        .route("/", get(handlers::home_page))
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /sign_up
        // Creates an account with the configured sign-up role.
        .route("/sign_up", post(handlers::register_user))
        // POST /login
        // Exchanges email and password for a bearer token valid for the configured TTL.
        .route("/login", post(handlers::login))
        // GET /api/*
        // Bare JSON arrays consumed by the frontend menu pages.
        .route("/api/menu", get(handlers::get_public_menu))
        .route("/api/categories", get(handlers::get_public_categories))
        .route("/api/restaurants", get(handlers::get_public_restaurants))
}
