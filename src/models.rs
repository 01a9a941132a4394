use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Publikasi
///
/// Represents one publication record from the `public.publikasi` table. Field
/// names stay in Indonesian end to end; they are the JSON contract the portfolio
/// frontend already speaks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Publikasi {
    pub id: Uuid,
    pub judul: String,
    // Stored free-form; canonical values are normalized at filter time only.
    pub kategori: String,
    pub penulis: String,
    pub tahun: i32,
    pub deskripsi: Option<String>,
    pub url: Option<String>,
    // Comma-separated search keywords, kept as raw text.
    pub keywords: Option<String>,

    /// Loaded from the `publikasi_tags` join table (aggregated in the query).
    /// Queries that do not join tags (e.g. INSERT ... RETURNING) fall back to empty.
    #[sqlx(default)]
    pub tags: Vec<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Pengabdian
///
/// A community-service activity record from the `public.pengabdian` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Pengabdian {
    pub id: Uuid,
    pub judul: String,
    #[ts(type = "string")]
    pub tanggal: NaiveDate,
    /// Display label ("Mei 2024") derived from `tanggal` on every write.
    /// Clients never supply it; see [`bulan_tahun_label`].
    pub bulan_tahun: String,
    // Lifecycle: "planned" | "ongoing" | "selesai".
    pub status: String,
    pub deskripsi: String,
    pub lokasi: String,
    // Free text on purpose ("50+", "ca. 200").
    pub jumlah_peserta: Option<String>,
    pub keywords: Option<String>,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Statistik
///
/// One headline figure on the public profile page ("20+ Publikasi"), from the
/// `public.statistik` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Statistik {
    pub id: Uuid,
    pub label: String,
    // Free text, not numeric: values like "20+" are expected.
    pub nilai: String,
    pub deskripsi: Option<String>,
    pub sub_deskripsi: Option<String>,
    // Sort key. Duplicates and gaps are allowed; row order breaks ties.
    pub urutan: i32,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AdminUser
///
/// Admin identity row from the `public.admin_users` table. Rows are provisioned
/// out-of-band; the application only reads them for authorization and audit
/// attribution, plus a `last_login` touch after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AdminUser {
    pub id: Uuid,
    // FK to the external auth service's user id (JWT `sub`).
    pub auth_user_id: Uuid,
    pub email: String,
    pub name: String,
    // The RBAC field: 'admin' or 'super_admin'.
    pub role: String,
    // Deactivated admins keep their audit history but lose all access.
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AuditAction
///
/// The three mutation verbs recorded in the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

/// ActivityLog
///
/// One audit trail row from the `public.activity_logs` table, augmented with
/// the acting admin's name (a join operation). Rows are append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ActivityLog {
    pub id: Uuid,
    // Nullable so history survives admin account deletion (ON DELETE SET NULL).
    pub admin_user_id: Option<Uuid>,
    // This field is loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub admin_name: Option<String>,
    // "CREATE" | "UPDATE" | "DELETE" as stored.
    pub action: String,
    pub table_name: String,
    pub record_id: Option<Uuid>,
    // Entity snapshots before/after the mutation (JSONB).
    #[ts(type = "any")]
    pub old_data: Option<JsonValue>,
    #[ts(type = "any")]
    pub new_data: Option<JsonValue>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ActivityEntry
///
/// Internal write-side shape for one audit append. Built by the ActivityLogger,
/// consumed by the repository; never serialized to clients.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub admin_user_id: Option<Uuid>,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Uuid,
    pub old_data: Option<JsonValue>,
    pub new_data: Option<JsonValue>,
}

/// Indonesian month names backing the derived `bulan_tahun` label.
const BULAN: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Derives the "Month YYYY" display label from an activity date. Recomputed on
/// every create and on every update that changes `tanggal`, so the label can
/// never go stale relative to the date.
pub fn bulan_tahun_label(tanggal: NaiveDate) -> String {
    let bulan = BULAN[tanggal.month0() as usize];
    format!("{} {}", bulan, tanggal.year())
}

/// Accepted values for the pengabdian lifecycle field.
pub const PENGABDIAN_STATUSES: [&str; 3] = ["planned", "ongoing", "selesai"];

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// --- Request Payloads (Input Schemas) ---

/// CreatePublikasiRequest
///
/// Input payload for submitting a new publication (POST /api/publikasi).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePublikasiRequest {
    pub judul: String,
    pub kategori: String,
    pub penulis: String,
    pub tahun: i32,
    pub deskripsi: Option<String>,
    pub url: Option<String>,
    pub keywords: Option<String>,
    // Tag set inserted into `publikasi_tags` after the row lands.
    pub tags: Option<Vec<String>>,
}

impl CreatePublikasiRequest {
    /// Rejects blank required fields before any store round-trip.
    pub fn validate(&self) -> Result<(), String> {
        if is_blank(&self.judul) {
            return Err("judul is required".to_string());
        }
        if is_blank(&self.kategori) {
            return Err("kategori is required".to_string());
        }
        if is_blank(&self.penulis) {
            return Err("penulis is required".to_string());
        }
        Ok(())
    }
}

/// UpdatePublikasiRequest
///
/// Partial update payload for modifying an existing publication
/// (PUT /api/publikasi/{id}).
///
/// *Optimization*: Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// to efficiently handle partial updates, ensuring only provided fields are included in the JSON payload.
/// Presence is the signal: a provided-but-empty string is still written.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePublikasiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judul: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kategori: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub penulis: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tahun: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    /// When present, the stored tag set is replaced wholesale (delete + insert).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// CreatePengabdianRequest
///
/// Input payload for a new community-service activity (POST /api/pengabdian).
/// Note: there is deliberately no `bulan_tahun` field; the label is derived
/// server-side from `tanggal`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePengabdianRequest {
    pub judul: String,
    #[ts(type = "string")]
    pub tanggal: NaiveDate,
    pub status: String,
    pub deskripsi: String,
    pub lokasi: String,
    pub jumlah_peserta: Option<String>,
    pub keywords: Option<String>,
}

impl CreatePengabdianRequest {
    pub fn validate(&self) -> Result<(), String> {
        if is_blank(&self.judul) {
            return Err("judul is required".to_string());
        }
        if is_blank(&self.deskripsi) {
            return Err("deskripsi is required".to_string());
        }
        if is_blank(&self.lokasi) {
            return Err("lokasi is required".to_string());
        }
        validate_status(&self.status)?;
        Ok(())
    }
}

/// UpdatePengabdianRequest
///
/// Partial update payload (PUT /api/pengabdian/{id}). A present `tanggal`
/// triggers a server-side `bulan_tahun` recompute.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePengabdianRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub judul: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    pub tanggal: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lokasi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jumlah_peserta: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
}

impl UpdatePengabdianRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(status) = &self.status {
            validate_status(status)?;
        }
        Ok(())
    }
}

fn validate_status(status: &str) -> Result<(), String> {
    if PENGABDIAN_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "status must be one of: {}",
            PENGABDIAN_STATUSES.join(", ")
        ))
    }
}

/// CreateStatistikRequest
///
/// Input payload for a new profile statistic (POST /api/statistik).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateStatistikRequest {
    pub label: String,
    pub nilai: String,
    pub deskripsi: Option<String>,
    pub sub_deskripsi: Option<String>,
    pub urutan: i32,
}

impl CreateStatistikRequest {
    pub fn validate(&self) -> Result<(), String> {
        if is_blank(&self.label) {
            return Err("label is required".to_string());
        }
        if is_blank(&self.nilai) {
            return Err("nilai is required".to_string());
        }
        Ok(())
    }
}

/// UpdateStatistikRequest
///
/// Partial update payload (PUT /api/statistik/{id}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStatistikRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nilai: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_deskripsi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub urutan: Option<i32>,
}

/// LoginRequest
///
/// Input payload for the public login endpoint (POST /auth/login).
/// Note: The password is only passed through to the external auth provider and never
/// persisted or logged internally by this application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// ResetPasswordRequest
///
/// Input payload for requesting a password recovery mail (POST /auth/reset-password).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// --- Dashboard & Admin Page Schemas (Output) ---

/// DashboardStats
///
/// Output schema for the administrative statistics dashboard (GET /api/dashboard).
/// Publication counts are bucketed by normalized kategori, activity counts by
/// exact status value.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct DashboardStats {
    pub total_publikasi: i64,
    pub total_buku: i64,
    pub total_jurnal: i64,
    pub total_oped: i64,
    pub total_press: i64,
    pub total_pengabdian: i64,
    pub pengabdian_selesai: i64,
    pub pengabdian_ongoing: i64,
    pub pengabdian_planned: i64,
}

/// AdminOverview
///
/// Output schema for the admin landing page (GET /admin): headline counts plus
/// the newest audit entries.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminOverview {
    pub stats: DashboardStats,
    pub recent_activities: Vec<ActivityLog>,
}
