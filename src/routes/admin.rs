use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Page Router Module
///
/// Defines the `/admin` page-data subtree backing the admin panel's screens.
/// These are read endpoints; all writes go through `/api`.
///
/// Access Control:
/// The route guard layered over the whole application intercepts `/admin/*`
/// before routing: requests without a valid session token are redirected to
/// the login page (and a logged-in visit to the login page bounces back to
/// `/admin`). Handlers additionally resolve `AdminSession` so a token whose
/// subject has no active admin row is rejected even past the guard.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Landing page data: dashboard counts plus the newest audit entries.
        .route("/", get(handlers::admin_overview))
        // GET /admin/login
        // The guard's anchor route. The page itself is rendered client-side;
        // this endpoint only needs to exist and answer without a session.
        .route("/login", get(|| async { "login" }))
        // GET /admin/publikasi
        // Full publication list for the management table.
        .route("/publikasi", get(handlers::admin_publikasi_page))
        // GET /admin/pengabdian
        // Full activity list for the management table.
        .route("/pengabdian", get(handlers::admin_pengabdian_page))
        // GET /admin/statistik
        // Full statistics list for the management table.
        .route("/statistik", get(handlers::admin_statistik_page))
}
