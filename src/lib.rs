use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

// Module for routing segregation (Public, API, Admin pages).
pub mod routes;
use auth::AdminSession; // The resolved admin identity.
use routes::{admin, api, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use audit::ActivityLogger;
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use service::ContentService;

/// Path prefix covered by the route guard.
pub const ADMIN_PREFIX: &str = "/admin";
/// Login page inside the guarded subtree; the one path a sessionless request may reach.
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas that have been decorated with
/// the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::get_publikasi, handlers::get_pengabdian, handlers::get_statistik,
        handlers::login, handlers::reset_password,
        handlers::get_dashboard,
        handlers::create_publikasi, handlers::update_publikasi, handlers::delete_publikasi,
        handlers::create_pengabdian, handlers::get_pengabdian_details,
        handlers::update_pengabdian, handlers::delete_pengabdian,
        handlers::create_statistik, handlers::get_statistik_details,
        handlers::update_statistik, handlers::delete_statistik,
        handlers::admin_overview, handlers::admin_publikasi_page,
        handlers::admin_pengabdian_page, handlers::admin_statistik_page
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Publikasi, models::Pengabdian, models::Statistik, models::AdminUser,
            models::ActivityLog, models::CreatePublikasiRequest, models::UpdatePublikasiRequest,
            models::CreatePengabdianRequest, models::UpdatePengabdianRequest,
            models::CreateStatistikRequest, models::UpdateStatistikRequest,
            models::LoginRequest, models::ResetPasswordRequest,
            models::DashboardStats, models::AdminOverview,
        )
    ),
    tags(
        (name = "akademik-portal", description = "Academic Portfolio Portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and immutable
/// container holding all essential application services and configuration.
/// The application state is shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Content Service: the audited data access layer used by every handler
    /// that reads or mutates portfolio content.
    pub service: ContentService,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and extractors to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for ContentService {
    fn from_ref(app_state: &AppState) -> ContentService {
        app_state.service.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// A middleware function that enforces authentication for the `/api` routes.
///
/// *Mechanism*: It attempts to extract `AdminSession` from the request. Since
/// `AdminSession` implements `FromRequestParts`, if authentication (JWT
/// validation, admin row lookup, is_active check) fails, the extractor
/// immediately rejects the request with a 401 JSON envelope, preventing
/// execution of the handler. If successful, the request proceeds.
async fn auth_middleware(_session: AdminSession, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_guard
///
/// The route guard for the `/admin` page subtree. Unlike the API middleware it
/// never answers 401: browsers navigating the admin panel get redirected.
///
/// Exactly two facts are consulted, synchronously and without a database
/// round-trip: does the request carry a session token that validates against
/// the JWT secret, and is the target the login page. A sessionless request to
/// any guarded page bounces to `/admin/login`; a logged-in visit to the login
/// page bounces back to `/admin`; everything else passes. Whether the token's
/// subject still maps to an active admin row is the extractor's business,
/// behind the redirect.
async fn admin_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    let guarded = path == ADMIN_PREFIX || path.starts_with("/admin/");
    if !guarded {
        return next.run(request).await;
    }

    let has_session = auth::session_token(request.headers())
        .map(|token| auth::decode_session(&token, &state.config.jwt_secret).is_some())
        .unwrap_or(false);
    let at_login = path == ADMIN_LOGIN_PATH;

    if !has_session && !at_login {
        return Redirect::temporary(ADMIN_LOGIN_PATH).into_response();
    }
    if has_session && at_login {
        return Redirect::temporary(ADMIN_PREFIX).into_response();
    }
    next.run(request).await
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // API Routes: Nested under '/api', protected by the `auth_middleware`.
        // This implements the first layer of Defense-in-Depth for these routes.
        .nest(
            "/api",
            api::api_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin Pages: Nested under '/admin'. Protection comes from the
        // `admin_guard` below, which sees the un-stripped request path.
        .nest("/admin", admin::admin_routes())
        // Route Guard: Layered over everything registered above so it runs
        // before routing; it inspects the full path and only acts on /admin*.
        .layer(middleware::from_fn_with_state(state.clone(), admin_guard))
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    // This section implements the Production Observability Stack.
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: Generates a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: Wraps the entire request/response lifecycle in a tracing span.
                // Uses the `trace_span_logger` to include the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: Ensures the generated x-request-id header is
                // returned to the client and injected into subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last, allowing all traffic in/out after processing)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI.
///
/// *Goal*: Ensure every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // The structured log format used by the tracing macros.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
