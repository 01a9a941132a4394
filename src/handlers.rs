use crate::{
    AppState,
    auth::{
        AdminSession, RESET_COOLDOWN_SECS, RESET_RATE_LIMIT_COOLDOWN_SECS, auth_error_message,
        is_rate_limit_message,
    },
    error::{ApiError, ApiResult, StoreError},
    filter::{Kategori, filter_pengabdian, filter_publikasi},
    models::{
        AdminOverview, CreatePengabdianRequest, CreatePublikasiRequest, CreateStatistikRequest,
        DashboardStats, LoginRequest, Pengabdian, Publikasi, ResetPasswordRequest, Statistik,
        UpdatePengabdianRequest, UpdatePublikasiRequest, UpdateStatistikRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use regex_lite::Regex;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::LazyLock;
use uuid::Uuid;

// --- Filter Structs ---

/// PublikasiFilter
///
/// Accepted query parameters for the public publication listing (GET /publikasi).
/// Used by Axum's Query extractor to safely bind HTTP query parameters.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PublikasiFilter {
    /// Case-insensitive substring match over judul, penulis, keywords and deskripsi.
    pub search: Option<String>,
    /// Category filter; synonyms normalize ("book" matches stored "Buku").
    /// Absent, "all" or unrecognized values apply no category restriction.
    pub kategori: Option<String>,
}

/// PengabdianFilter
///
/// Accepted query parameters for the public activity listing (GET /pengabdian).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PengabdianFilter {
    /// Case-insensitive substring match over judul and keywords.
    pub search: Option<String>,
}

// --- Record Id Validation ---

/// Canonical v4 UUID shape: 36 chars, hyphen-grouped, version nibble `4`,
/// variant `[89ab]`. The same pattern the admin frontend applies before a
/// request ever leaves the browser; the server re-checks because the API is
/// reachable without that frontend.
static RECORD_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("record id pattern is valid")
});

/// Rejects malformed path ids before any store round-trip. The "Invalid ID"
/// message is a fixed contract with the admin UI.
fn parse_record_id(raw: &str) -> Result<Uuid, ApiError> {
    if !RECORD_ID_PATTERN.is_match(raw) {
        return Err(ApiError::InvalidId);
    }
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidId)
}

fn internal(e: StoreError) -> ApiError {
    ApiError::Internal(e.to_string())
}

// --- Public Content Handlers ---

/// get_publikasi
///
/// [Public Route] Lists publications for the portfolio site, newest year first,
/// with optional search and category narrowing. Filtering happens in-process
/// over the fetched list; the stored kategori text is normalized through the
/// synonym table so historical spellings keep matching.
#[utoipa::path(
    get,
    path = "/publikasi",
    params(PublikasiFilter),
    responses((status = 200, description = "Filtered publications", body = [Publikasi]))
)]
pub async fn get_publikasi(
    State(state): State<AppState>,
    Query(filter): Query<PublikasiFilter>,
) -> ApiResult<Json<Vec<Publikasi>>> {
    let items = state.service.list_publikasi().await.map_err(internal)?;
    let kategori = filter.kategori.as_deref().and_then(Kategori::parse);
    let search = filter.search.unwrap_or_default();
    Ok(Json(filter_publikasi(items, &search, kategori)))
}

/// get_pengabdian
///
/// [Public Route] Lists community-service activities, newest date first.
#[utoipa::path(
    get,
    path = "/pengabdian",
    params(PengabdianFilter),
    responses((status = 200, description = "Filtered activities", body = [Pengabdian]))
)]
pub async fn get_pengabdian(
    State(state): State<AppState>,
    Query(filter): Query<PengabdianFilter>,
) -> ApiResult<Json<Vec<Pengabdian>>> {
    let items = state.service.list_pengabdian().await.map_err(internal)?;
    let search = filter.search.unwrap_or_default();
    Ok(Json(filter_pengabdian(items, &search)))
}

/// get_statistik
///
/// [Public Route] Profile statistics in display order (`urutan` ascending).
#[utoipa::path(
    get,
    path = "/statistik",
    responses((status = 200, description = "Profile statistics", body = [Statistik]))
)]
pub async fn get_statistik(State(state): State<AppState>) -> ApiResult<Json<Vec<Statistik>>> {
    let items = state.service.list_statistik().await.map_err(internal)?;
    Ok(Json(items))
}

// --- Auth Proxy Handlers ---

/// login
///
/// [Public Route] Proxies the password grant to the external auth service.
///
/// *Flow*: Validates the payload shape, forwards credentials to the auth
/// service's token endpoint, and passes the session body through unchanged on
/// success. As a side effect the matching admin row's `last_login` is touched
/// (best effort; a miss is not an error since the auth service may know users
/// we hold no admin row for).
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session tokens (auth service passthrough)"),
        (status = 401, description = "Rejected credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<JsonValue>> {
    if !payload.email.contains('@') {
        return Err(ApiError::Validation("a valid email is required".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Validation("password is required".to_string()));
    }

    // Step 1: Call the external auth provider's password grant.
    let client = reqwest::Client::new();
    let token_url = format!(
        "{}/auth/v1/token?grant_type=password",
        state.config.supabase_url
    );

    let response = client
        .post(token_url)
        .header("apikey", &state.config.supabase_anon_key)
        .header("Content-Type", "application/json")
        .json(&json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|e| {
            tracing::error!("auth service unreachable: {e}");
            ApiError::Internal("authentication service unreachable".to_string())
        })?;

    let status = response.status();
    let body = response.json::<JsonValue>().await.map_err(|_| {
        ApiError::Internal("authentication service returned a malformed response".to_string())
    })?;

    if !status.is_success() {
        // Step 2: Rejection passthrough. The auth service's own message reaches
        // the client so login failures are diagnosable.
        return Err(ApiError::Unauthorized(auth_error_message(&body)));
    }

    // Step 3: Touch last_login for the authenticated identity.
    if let Some(auth_user_id) = body
        .get("user")
        .and_then(|user| user.get("id"))
        .and_then(JsonValue::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
    {
        if let Err(e) = state.repo.touch_admin_last_login(auth_user_id).await {
            tracing::error!("failed to update last_login: {e}");
        }
    }

    Ok(Json(body))
}

/// reset_password
///
/// [Public Route] Requests a recovery mail from the external auth service.
///
/// The response always carries a `retry_after` hint for the client-side
/// cooldown: 60s after an accepted request, 300s when the auth service reports
/// a rate limit. The hint is advisory; the auth service remains the
/// authoritative limiter.
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Recovery mail requested"),
        (status = 429, description = "Auth service rate limit reached")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Response {
    if !payload.email.contains('@') {
        return ApiError::Validation("a valid email is required".to_string()).into_response();
    }

    let client = reqwest::Client::new();
    let recover_url = format!("{}/auth/v1/recover", state.config.supabase_url);

    let response = match client
        .post(recover_url)
        .header("apikey", &state.config.supabase_anon_key)
        .header("Content-Type", "application/json")
        .json(&json!({ "email": payload.email }))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("auth service unreachable: {e}");
            return ApiError::Internal("authentication service unreachable".to_string())
                .into_response();
        }
    };

    if response.status().is_success() {
        return (
            StatusCode::OK,
            Json(json!({ "success": true, "retry_after": RESET_COOLDOWN_SECS })),
        )
            .into_response();
    }

    let body = response.json::<JsonValue>().await.unwrap_or(JsonValue::Null);
    let message = auth_error_message(&body);

    if is_rate_limit_message(&message) {
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": message, "retry_after": RESET_RATE_LIMIT_COOLDOWN_SECS })),
        )
            .into_response()
    } else {
        ApiError::BadRequest(message).into_response()
    }
}

// --- Authenticated API: Dashboard ---

/// get_dashboard
///
/// [Authenticated Route] Aggregated counts for the admin dashboard: publication
/// totals bucketed by normalized kategori, activity totals by status.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses((status = 200, description = "Dashboard counts", body = DashboardStats))
)]
pub async fn get_dashboard(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<DashboardStats>> {
    let stats = state.service.dashboard_stats().await.map_err(internal)?;
    Ok(Json(stats))
}

// --- Authenticated API: Publikasi ---

// The publikasi create endpoint predates the shared envelope and reports
// failures as {success:false, error}; the admin UI still keys on that shape.
fn publikasi_create_failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

/// create_publikasi
///
/// [Authenticated Route] Inserts a publication (row first, then tags) and
/// appends a CREATE audit entry attributed to the acting admin.
#[utoipa::path(
    post,
    path = "/api/publikasi",
    request_body = CreatePublikasiRequest,
    responses(
        (status = 200, description = "Created"),
        (status = 400, description = "Validation or store rejection")
    )
)]
pub async fn create_publikasi(
    session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<CreatePublikasiRequest>,
) -> Response {
    if let Err(message) = payload.validate() {
        return publikasi_create_failure(StatusCode::BAD_REQUEST, message);
    }

    match state
        .service
        .create_publikasi(payload, session.admin_id)
        .await
    {
        Ok(_created) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(StoreError::Backend(message)) => {
            publikasi_create_failure(StatusCode::BAD_REQUEST, message)
        }
        Err(_) => publikasi_create_failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

/// update_publikasi
///
/// [Authenticated Route] Sparse update: only fields present in the payload are
/// written, a present `tags` key replaces the whole tag set. The path id is
/// shape-checked before any store call.
#[utoipa::path(
    put,
    path = "/api/publikasi/{id}",
    params(("id" = String, Path, description = "Publikasi ID (UUID)")),
    request_body = UpdatePublikasiRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid ID or store rejection"),
        (status = 404, description = "No such publication")
    )
)]
pub async fn update_publikasi(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePublikasiRequest>,
) -> ApiResult<Json<JsonValue>> {
    let id = parse_record_id(&id)?;

    match state
        .service
        .update_publikasi(id, payload, session.admin_id)
        .await
    {
        Ok(_updated) => Ok(Json(json!({ "success": true }))),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Publikasi not found".to_string())),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
    }
}

/// delete_publikasi
///
/// [Authenticated Route] Removes a publication (tag rows cascade) and appends a
/// DELETE audit entry carrying the final snapshot. Deleting a record that is
/// already gone reports 404 and appends nothing.
#[utoipa::path(
    delete,
    path = "/api/publikasi/{id}",
    params(("id" = String, Path, description = "Publikasi ID (UUID)")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "No such publication")
    )
)]
pub async fn delete_publikasi(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JsonValue>> {
    let id = parse_record_id(&id)?;

    match state.service.delete_publikasi(id, session.admin_id).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Publikasi not found".to_string())),
        // Delete failures on this endpoint surface as 500, unlike the other
        // entities; the admin UI distinguishes the two.
        Err(StoreError::Backend(message)) => Err(ApiError::Internal(message)),
    }
}

// --- Authenticated API: Pengabdian ---

/// create_pengabdian
///
/// [Authenticated Route] Inserts an activity. `bulan_tahun` is derived from
/// `tanggal` server-side; the created entity is echoed back in `data`.
#[utoipa::path(
    post,
    path = "/api/pengabdian",
    request_body = CreatePengabdianRequest,
    responses(
        (status = 200, description = "Created", body = Pengabdian),
        (status = 400, description = "Validation or store rejection")
    )
)]
pub async fn create_pengabdian(
    session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<CreatePengabdianRequest>,
) -> ApiResult<Json<JsonValue>> {
    payload.validate().map_err(ApiError::Validation)?;

    match state
        .service
        .create_pengabdian(payload, session.admin_id)
        .await
    {
        Ok(created) => Ok(Json(json!({ "success": true, "data": created }))),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
        Err(e) => Err(internal(e)),
    }
}

/// get_pengabdian_details
///
/// [Authenticated Route] Single activity lookup for the edit form.
#[utoipa::path(
    get,
    path = "/api/pengabdian/{id}",
    params(("id" = String, Path, description = "Pengabdian ID (UUID)")),
    responses(
        (status = 200, description = "Found", body = Pengabdian),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "No such activity")
    )
)]
pub async fn get_pengabdian_details(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Pengabdian>> {
    let id = parse_record_id(&id)?;

    match state.service.get_pengabdian(id).await {
        Ok(Some(pengabdian)) => Ok(Json(pengabdian)),
        Ok(None) => Err(ApiError::NotFound("Pengabdian not found".to_string())),
        Err(e) => {
            tracing::error!("pengabdian lookup failed: {e}");
            Err(ApiError::NotFound("Pengabdian not found".to_string()))
        }
    }
}

/// update_pengabdian
///
/// [Authenticated Route] Sparse update. A present `tanggal` recomputes the
/// stored `bulan_tahun` label in the same write.
#[utoipa::path(
    put,
    path = "/api/pengabdian/{id}",
    params(("id" = String, Path, description = "Pengabdian ID (UUID)")),
    request_body = UpdatePengabdianRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid ID or store rejection"),
        (status = 404, description = "No such activity")
    )
)]
pub async fn update_pengabdian(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePengabdianRequest>,
) -> ApiResult<Json<JsonValue>> {
    let id = parse_record_id(&id)?;
    payload.validate().map_err(ApiError::Validation)?;

    match state
        .service
        .update_pengabdian(id, payload, session.admin_id)
        .await
    {
        Ok(_updated) => Ok(Json(json!({ "success": true }))),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Pengabdian not found".to_string())),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
    }
}

/// delete_pengabdian
///
/// [Authenticated Route] Removes an activity; audit DELETE carries the final
/// snapshot.
#[utoipa::path(
    delete,
    path = "/api/pengabdian/{id}",
    params(("id" = String, Path, description = "Pengabdian ID (UUID)")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "No such activity")
    )
)]
pub async fn delete_pengabdian(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JsonValue>> {
    let id = parse_record_id(&id)?;

    match state.service.delete_pengabdian(id, session.admin_id).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Pengabdian not found".to_string())),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
    }
}

// --- Authenticated API: Statistik ---

/// create_statistik
///
/// [Authenticated Route] Inserts a profile statistic. Duplicate `urutan` values
/// are accepted; display order falls back to insertion order.
#[utoipa::path(
    post,
    path = "/api/statistik",
    request_body = CreateStatistikRequest,
    responses(
        (status = 200, description = "Created", body = Statistik),
        (status = 400, description = "Validation or store rejection")
    )
)]
pub async fn create_statistik(
    session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<CreateStatistikRequest>,
) -> ApiResult<Json<JsonValue>> {
    payload.validate().map_err(ApiError::Validation)?;

    match state
        .service
        .create_statistik(payload, session.admin_id)
        .await
    {
        Ok(created) => Ok(Json(json!({ "success": true, "data": created }))),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
        Err(e) => Err(internal(e)),
    }
}

/// get_statistik_details
///
/// [Authenticated Route] Single statistic lookup for the edit form.
#[utoipa::path(
    get,
    path = "/api/statistik/{id}",
    params(("id" = String, Path, description = "Statistik ID (UUID)")),
    responses(
        (status = 200, description = "Found", body = Statistik),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "No such statistic")
    )
)]
pub async fn get_statistik_details(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Statistik>> {
    let id = parse_record_id(&id)?;

    match state.service.get_statistik(id).await {
        Ok(Some(statistik)) => Ok(Json(statistik)),
        Ok(None) => Err(ApiError::NotFound("Statistik not found".to_string())),
        Err(e) => {
            tracing::error!("statistik lookup failed: {e}");
            Err(ApiError::NotFound("Statistik not found".to_string()))
        }
    }
}

/// update_statistik
///
/// [Authenticated Route] Sparse update of a statistic.
#[utoipa::path(
    put,
    path = "/api/statistik/{id}",
    params(("id" = String, Path, description = "Statistik ID (UUID)")),
    request_body = UpdateStatistikRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid ID or store rejection"),
        (status = 404, description = "No such statistic")
    )
)]
pub async fn update_statistik(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatistikRequest>,
) -> ApiResult<Json<JsonValue>> {
    let id = parse_record_id(&id)?;

    match state
        .service
        .update_statistik(id, payload, session.admin_id)
        .await
    {
        Ok(_updated) => Ok(Json(json!({ "success": true }))),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Statistik not found".to_string())),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
    }
}

/// delete_statistik
///
/// [Authenticated Route] Removes a statistic.
#[utoipa::path(
    delete,
    path = "/api/statistik/{id}",
    params(("id" = String, Path, description = "Statistik ID (UUID)")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "No such statistic")
    )
)]
pub async fn delete_statistik(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<JsonValue>> {
    let id = parse_record_id(&id)?;

    match state.service.delete_statistik(id, session.admin_id).await {
        Ok(()) => Ok(Json(json!({ "success": true }))),
        Err(StoreError::NotFound) => Err(ApiError::NotFound("Statistik not found".to_string())),
        Err(StoreError::Backend(message)) => Err(ApiError::BadRequest(message)),
    }
}

// --- Admin Page Data Handlers (behind the route guard) ---

/// admin_overview
///
/// [Admin Page] Landing page data: dashboard counts plus the ten newest audit
/// entries. The route guard has already redirected sessionless requests; the
/// extractor here is the second line of defense and resolves attribution.
#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Admin landing page data", body = AdminOverview))
)]
pub async fn admin_overview(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<AdminOverview>> {
    let stats = state.service.dashboard_stats().await.map_err(internal)?;
    let recent_activities = state.service.recent_activities(10).await.map_err(internal)?;
    Ok(Json(AdminOverview {
        stats,
        recent_activities,
    }))
}

/// admin_publikasi_page
///
/// [Admin Page] Full publication list for the management table (no filtering;
/// the admin UI filters client-side).
#[utoipa::path(
    get,
    path = "/admin/publikasi",
    responses((status = 200, description = "All publications", body = [Publikasi]))
)]
pub async fn admin_publikasi_page(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Publikasi>>> {
    let items = state.service.list_publikasi().await.map_err(internal)?;
    Ok(Json(items))
}

/// admin_pengabdian_page
///
/// [Admin Page] Full activity list for the management table.
#[utoipa::path(
    get,
    path = "/admin/pengabdian",
    responses((status = 200, description = "All activities", body = [Pengabdian]))
)]
pub async fn admin_pengabdian_page(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Pengabdian>>> {
    let items = state.service.list_pengabdian().await.map_err(internal)?;
    Ok(Json(items))
}

/// admin_statistik_page
///
/// [Admin Page] Full statistics list for the management table.
#[utoipa::path(
    get,
    path = "/admin/statistik",
    responses((status = 200, description = "All statistics", body = [Statistik]))
)]
pub async fn admin_statistik_page(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Statistik>>> {
    let items = state.service.list_statistik().await.map_err(internal)?;
    Ok(Json(items))
}
