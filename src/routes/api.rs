use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated API Router Module
///
/// Defines the CRUD surface behind `/api`. Every route here mutates or reads
/// admin-facing data and therefore requires a resolved `AdminSession`.
///
/// Access Control Strategy:
/// This router is mounted with a `route_layer` running the session middleware,
/// so no request reaches a handler without a validated session. Handlers still
/// take the `AdminSession` extractor themselves: mutations need the admin id
/// for audit attribution, and the double resolution keeps each handler safe
/// even if the layer wiring ever changes.
///
/// Path ids are plain `String` segments validated against the canonical UUID
/// shape inside the handlers, so a malformed id becomes a 400 "Invalid ID"
/// instead of an extractor-level rejection with a different body.
pub fn api_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/dashboard
        // Aggregated publication/activity counts for the dashboard cards.
        .route("/dashboard", get(handlers::get_dashboard))
        // --- Publikasi management ---
        // POST /api/publikasi
        // Creates a publication; tags land in the join table right after the row.
        .route("/publikasi", post(handlers::create_publikasi))
        // PUT/DELETE /api/publikasi/{id}
        // Sparse update (present fields only, tags replaced wholesale) and delete.
        .route(
            "/publikasi/{id}",
            axum::routing::put(handlers::update_publikasi).delete(handlers::delete_publikasi),
        )
        // --- Pengabdian management ---
        // POST /api/pengabdian
        // Creates an activity; bulan_tahun derives from tanggal server-side.
        .route("/pengabdian", post(handlers::create_pengabdian))
        // GET/PUT/DELETE /api/pengabdian/{id}
        // Detail lookup for the edit form, sparse update, delete.
        .route(
            "/pengabdian/{id}",
            get(handlers::get_pengabdian_details)
                .put(handlers::update_pengabdian)
                .delete(handlers::delete_pengabdian),
        )
        // --- Statistik management ---
        // POST /api/statistik
        .route("/statistik", post(handlers::create_statistik))
        // GET/PUT/DELETE /api/statistik/{id}
        .route(
            "/statistik/{id}",
            get(handlers::get_statistik_details)
                .put(handlers::update_statistik)
                .delete(handlers::delete_statistik),
        )
}
