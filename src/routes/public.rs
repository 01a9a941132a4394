use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client.
/// These routes serve the read-only portfolio pages and the gateway functions
/// of the identity flow (login, password recovery), both of which proxy to the
/// external auth service.
///
/// Nothing in this module mutates content: every write path lives under `/api`
/// behind the session middleware.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /publikasi?search=...&kategori=...
        // Lists publications for the portfolio site, newest year first. The kategori
        // filter normalizes synonyms so stored legacy spellings keep matching.
        .route("/publikasi", get(handlers::get_publikasi))
        // GET /pengabdian?search=...
        // Lists community-service activities, newest date first.
        .route("/pengabdian", get(handlers::get_pengabdian))
        // GET /statistik
        // Profile statistics in display order (urutan ascending).
        .route("/statistik", get(handlers::get_statistik))
        // POST /auth/login
        // Proxies the password grant to the external auth service and touches the
        // admin row's last_login on success.
        .route("/auth/login", post(handlers::login))
        // POST /auth/reset-password
        // Requests a recovery mail. The response carries the advisory client
        // cooldown (60s accepted / 300s rate-limited).
        .route("/auth/reset-password", post(handlers::reset_password))
}
