use crate::error::StoreError;
use crate::models::{
    ActivityEntry, ActivityLog, AdminUser, CreatePengabdianRequest, CreatePublikasiRequest,
    CreateStatistikRequest, Pengabdian, Publikasi, Statistik, UpdatePengabdianRequest,
    UpdatePublikasiRequest, UpdateStatistikRequest, bulan_tahun_label,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the service layer to interact with
/// the store without knowing the specific implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
///
/// Every fallible call surfaces `StoreError`; callers decide which HTTP status a
/// backend message maps to. `bulan_tahun` derivation is a store-level invariant:
/// implementations must recompute the label from `tanggal` on every write that
/// carries a date, so no caller can persist a stale label.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Publikasi ---
    // Full list with aggregated tags, newest publication year first.
    async fn get_all_publikasi(&self) -> Result<Vec<Publikasi>, StoreError>;
    async fn get_publikasi(&self, id: Uuid) -> Result<Option<Publikasi>, StoreError>;
    async fn create_publikasi(&self, req: CreatePublikasiRequest)
    -> Result<Publikasi, StoreError>;
    // Partial update via COALESCE; None fields keep their stored value.
    async fn update_publikasi(
        &self,
        id: Uuid,
        req: UpdatePublikasiRequest,
    ) -> Result<Option<Publikasi>, StoreError>;
    // Returns true if a row was actually removed.
    async fn delete_publikasi(&self, id: Uuid) -> Result<bool, StoreError>;
    // Wholesale tag replacement: delete every tag row, then insert the new set.
    async fn replace_publikasi_tags(
        &self,
        publikasi_id: Uuid,
        tags: Vec<String>,
    ) -> Result<(), StoreError>;

    // --- Pengabdian ---
    async fn get_all_pengabdian(&self) -> Result<Vec<Pengabdian>, StoreError>;
    async fn get_pengabdian(&self, id: Uuid) -> Result<Option<Pengabdian>, StoreError>;
    async fn create_pengabdian(
        &self,
        req: CreatePengabdianRequest,
    ) -> Result<Pengabdian, StoreError>;
    async fn update_pengabdian(
        &self,
        id: Uuid,
        req: UpdatePengabdianRequest,
    ) -> Result<Option<Pengabdian>, StoreError>;
    async fn delete_pengabdian(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- Statistik ---
    async fn get_all_statistik(&self) -> Result<Vec<Statistik>, StoreError>;
    async fn get_statistik(&self, id: Uuid) -> Result<Option<Statistik>, StoreError>;
    async fn create_statistik(&self, req: CreateStatistikRequest)
    -> Result<Statistik, StoreError>;
    async fn update_statistik(
        &self,
        id: Uuid,
        req: UpdateStatistikRequest,
    ) -> Result<Option<Statistik>, StoreError>;
    async fn delete_statistik(&self, id: Uuid) -> Result<bool, StoreError>;

    // --- Dashboard inputs ---
    // Raw column values; bucketing/normalization happens in the service layer.
    async fn get_kategori_values(&self) -> Result<Vec<String>, StoreError>;
    async fn get_status_values(&self) -> Result<Vec<String>, StoreError>;

    // --- Admin identity & audit trail ---
    async fn get_admin_by_auth_id(
        &self,
        auth_user_id: Uuid,
    ) -> Result<Option<AdminUser>, StoreError>;
    async fn touch_admin_last_login(&self, auth_user_id: Uuid) -> Result<(), StoreError>;
    // Append-only. The audit trail has no update or delete path.
    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), StoreError>;
    async fn get_recent_activities(&self, limit: i64) -> Result<Vec<ActivityLog>, StoreError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Shared select list for publikasi reads: the tag set lives in a join table and
// is folded into a TEXT[] per row here, so the model's `tags: Vec<String>`
// decodes directly.
const PUBLIKASI_SELECT: &str = r#"
    SELECT
        p.id, p.judul, p.kategori, p.penulis, p.tahun,
        p.deskripsi, p.url, p.keywords,
        COALESCE(
            array_agg(t.tag_name ORDER BY t.id) FILTER (WHERE t.tag_name IS NOT NULL),
            ARRAY[]::TEXT[]
        ) AS tags,
        p.created_at, p.updated_at
    FROM publikasi p
    LEFT JOIN publikasi_tags t ON t.publikasi_id = p.id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    // --- PUBLIKASI ---

    /// get_all_publikasi
    ///
    /// Retrieves every publication with its aggregated tag set, ordered by
    /// publication year descending (insertion recency as tiebreak).
    async fn get_all_publikasi(&self) -> Result<Vec<Publikasi>, StoreError> {
        let query = format!(
            "{PUBLIKASI_SELECT} GROUP BY p.id ORDER BY p.tahun DESC, p.created_at DESC"
        );
        let rows = sqlx::query_as::<_, Publikasi>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// get_publikasi
    ///
    /// Single-row lookup by primary key, tags included.
    async fn get_publikasi(&self, id: Uuid) -> Result<Option<Publikasi>, StoreError> {
        let query = format!("{PUBLIKASI_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row = sqlx::query_as::<_, Publikasi>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// create_publikasi
    ///
    /// Inserts the publication row only. Tags are written separately through
    /// `replace_publikasi_tags`; the returned entity therefore carries an empty
    /// tag set (the model defaults the missing column).
    async fn create_publikasi(
        &self,
        req: CreatePublikasiRequest,
    ) -> Result<Publikasi, StoreError> {
        let new_id = Uuid::new_v4();
        let row = sqlx::query_as::<_, Publikasi>(
            r#"
            INSERT INTO publikasi
                (id, judul, kategori, penulis, tahun, deskripsi, url, keywords, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW())
            RETURNING id, judul, kategori, penulis, tahun, deskripsi, url, keywords, created_at, updated_at
            "#,
        )
        .bind(new_id)
        .bind(&req.judul)
        .bind(&req.kategori)
        .bind(&req.penulis)
        .bind(req.tahun)
        .bind(&req.deskripsi)
        .bind(&req.url)
        .bind(&req.keywords)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// update_publikasi
    ///
    /// Uses the PostgreSQL `COALESCE` function to efficiently handle `Option<T>` fields,
    /// only updating a column if the corresponding field in `req` is `Some`.
    /// Returns `None` when the id does not match any row.
    async fn update_publikasi(
        &self,
        id: Uuid,
        req: UpdatePublikasiRequest,
    ) -> Result<Option<Publikasi>, StoreError> {
        let row = sqlx::query_as::<_, Publikasi>(
            r#"
            UPDATE publikasi
            SET judul = COALESCE($2, judul),
                kategori = COALESCE($3, kategori),
                penulis = COALESCE($4, penulis),
                tahun = COALESCE($5, tahun),
                deskripsi = COALESCE($6, deskripsi),
                url = COALESCE($7, url),
                keywords = COALESCE($8, keywords),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, judul, kategori, penulis, tahun, deskripsi, url, keywords, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.judul)
        .bind(&req.kategori)
        .bind(&req.penulis)
        .bind(req.tahun)
        .bind(&req.deskripsi)
        .bind(&req.url)
        .bind(&req.keywords)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// delete_publikasi
    ///
    /// Tag rows go with the publication via `ON DELETE CASCADE`.
    async fn delete_publikasi(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM publikasi WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// replace_publikasi_tags
    ///
    /// Two statements, delete-then-insert, matching the wholesale replacement
    /// semantics of the tag set. Uses QueryBuilder for the multi-row insert so
    /// every tag value stays a bound parameter.
    async fn replace_publikasi_tags(
        &self,
        publikasi_id: Uuid,
        tags: Vec<String>,
    ) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM publikasi_tags WHERE publikasi_id = $1")
            .bind(publikasi_id)
            .execute(&self.pool)
            .await?;

        if tags.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("INSERT INTO publikasi_tags (publikasi_id, tag_name) ");
        builder.push_values(tags.into_iter(), |mut b, tag| {
            b.push_bind(publikasi_id).push_bind(tag);
        });
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    // --- PENGABDIAN ---

    /// get_all_pengabdian
    ///
    /// Newest activity first.
    async fn get_all_pengabdian(&self) -> Result<Vec<Pengabdian>, StoreError> {
        let rows = sqlx::query_as::<_, Pengabdian>(
            r#"
            SELECT id, judul, tanggal, bulan_tahun, status, deskripsi, lokasi,
                   jumlah_peserta, keywords, created_at, updated_at
            FROM pengabdian
            ORDER BY tanggal DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// get_pengabdian
    async fn get_pengabdian(&self, id: Uuid) -> Result<Option<Pengabdian>, StoreError> {
        let row = sqlx::query_as::<_, Pengabdian>(
            r#"
            SELECT id, judul, tanggal, bulan_tahun, status, deskripsi, lokasi,
                   jumlah_peserta, keywords, created_at, updated_at
            FROM pengabdian
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// create_pengabdian
    ///
    /// Derives `bulan_tahun` from `tanggal` at write time; the request carries
    /// no label field at all.
    async fn create_pengabdian(
        &self,
        req: CreatePengabdianRequest,
    ) -> Result<Pengabdian, StoreError> {
        let new_id = Uuid::new_v4();
        let bulan_tahun = bulan_tahun_label(req.tanggal);
        let row = sqlx::query_as::<_, Pengabdian>(
            r#"
            INSERT INTO pengabdian
                (id, judul, tanggal, bulan_tahun, status, deskripsi, lokasi, jumlah_peserta, keywords, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
            RETURNING id, judul, tanggal, bulan_tahun, status, deskripsi, lokasi,
                      jumlah_peserta, keywords, created_at, updated_at
            "#,
        )
        .bind(new_id)
        .bind(&req.judul)
        .bind(req.tanggal)
        .bind(bulan_tahun)
        .bind(&req.status)
        .bind(&req.deskripsi)
        .bind(&req.lokasi)
        .bind(&req.jumlah_peserta)
        .bind(&req.keywords)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// update_pengabdian
    ///
    /// COALESCE partial update. When `tanggal` is present the label is
    /// recomputed in the same statement, so date and label can never diverge.
    async fn update_pengabdian(
        &self,
        id: Uuid,
        req: UpdatePengabdianRequest,
    ) -> Result<Option<Pengabdian>, StoreError> {
        let bulan_tahun = req.tanggal.map(bulan_tahun_label);
        let row = sqlx::query_as::<_, Pengabdian>(
            r#"
            UPDATE pengabdian
            SET judul = COALESCE($2, judul),
                tanggal = COALESCE($3, tanggal),
                bulan_tahun = COALESCE($4, bulan_tahun),
                status = COALESCE($5, status),
                deskripsi = COALESCE($6, deskripsi),
                lokasi = COALESCE($7, lokasi),
                jumlah_peserta = COALESCE($8, jumlah_peserta),
                keywords = COALESCE($9, keywords),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, judul, tanggal, bulan_tahun, status, deskripsi, lokasi,
                      jumlah_peserta, keywords, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.judul)
        .bind(req.tanggal)
        .bind(bulan_tahun)
        .bind(&req.status)
        .bind(&req.deskripsi)
        .bind(&req.lokasi)
        .bind(&req.jumlah_peserta)
        .bind(&req.keywords)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// delete_pengabdian
    async fn delete_pengabdian(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pengabdian WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- STATISTIK ---

    /// get_all_statistik
    ///
    /// Display order: `urutan` ascending, insertion order as tiebreak.
    /// Duplicate `urutan` values are allowed.
    async fn get_all_statistik(&self) -> Result<Vec<Statistik>, StoreError> {
        let rows = sqlx::query_as::<_, Statistik>(
            r#"
            SELECT id, label, nilai, deskripsi, sub_deskripsi, urutan, created_at, updated_at
            FROM statistik
            ORDER BY urutan ASC, created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// get_statistik
    async fn get_statistik(&self, id: Uuid) -> Result<Option<Statistik>, StoreError> {
        let row = sqlx::query_as::<_, Statistik>(
            r#"
            SELECT id, label, nilai, deskripsi, sub_deskripsi, urutan, created_at, updated_at
            FROM statistik
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// create_statistik
    async fn create_statistik(
        &self,
        req: CreateStatistikRequest,
    ) -> Result<Statistik, StoreError> {
        let new_id = Uuid::new_v4();
        let row = sqlx::query_as::<_, Statistik>(
            r#"
            INSERT INTO statistik
                (id, label, nilai, deskripsi, sub_deskripsi, urutan, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING id, label, nilai, deskripsi, sub_deskripsi, urutan, created_at, updated_at
            "#,
        )
        .bind(new_id)
        .bind(&req.label)
        .bind(&req.nilai)
        .bind(&req.deskripsi)
        .bind(&req.sub_deskripsi)
        .bind(req.urutan)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// update_statistik
    async fn update_statistik(
        &self,
        id: Uuid,
        req: UpdateStatistikRequest,
    ) -> Result<Option<Statistik>, StoreError> {
        let row = sqlx::query_as::<_, Statistik>(
            r#"
            UPDATE statistik
            SET label = COALESCE($2, label),
                nilai = COALESCE($3, nilai),
                deskripsi = COALESCE($4, deskripsi),
                sub_deskripsi = COALESCE($5, sub_deskripsi),
                urutan = COALESCE($6, urutan),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, label, nilai, deskripsi, sub_deskripsi, urutan, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.label)
        .bind(&req.nilai)
        .bind(&req.deskripsi)
        .bind(&req.sub_deskripsi)
        .bind(req.urutan)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// delete_statistik
    async fn delete_statistik(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM statistik WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- DASHBOARD INPUTS ---

    /// get_kategori_values
    ///
    /// Returns the raw kategori column of every publication. The service buckets
    /// these through the normalization table; doing it here would bake display
    /// logic into SQL.
    async fn get_kategori_values(&self) -> Result<Vec<String>, StoreError> {
        let values = sqlx::query_scalar::<_, String>("SELECT kategori FROM publikasi")
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    /// get_status_values
    async fn get_status_values(&self) -> Result<Vec<String>, StoreError> {
        let values = sqlx::query_scalar::<_, String>("SELECT status FROM pengabdian")
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    // --- ADMIN IDENTITY & AUDIT TRAIL ---

    /// get_admin_by_auth_id
    ///
    /// Resolves the external auth identity (JWT `sub`) to the local admin row.
    /// Activity checks happen in the caller; this is a plain lookup.
    async fn get_admin_by_auth_id(
        &self,
        auth_user_id: Uuid,
    ) -> Result<Option<AdminUser>, StoreError> {
        let row = sqlx::query_as::<_, AdminUser>(
            r#"
            SELECT id, auth_user_id, email, name, role, is_active, last_login, created_at
            FROM admin_users
            WHERE auth_user_id = $1
            "#,
        )
        .bind(auth_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// touch_admin_last_login
    ///
    /// Best-effort timestamp bump after a successful login. Matching zero rows
    /// is not an error: the auth service may know users we have no admin row for.
    async fn touch_admin_last_login(&self, auth_user_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE admin_users SET last_login = NOW() WHERE auth_user_id = $1")
            .bind(auth_user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// log_activity
    ///
    /// Appends one audit row. Snapshots arrive as JSONB values; the table is
    /// append-only.
    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs
                (id, admin_user_id, action, table_name, record_id, old_data, new_data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.admin_user_id)
        .bind(entry.action.as_str())
        .bind(&entry.table_name)
        .bind(entry.record_id)
        .bind(&entry.old_data)
        .bind(&entry.new_data)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// get_recent_activities
    ///
    /// Retrieves the newest audit entries, performing the JOIN needed to enrich
    /// each row with the acting admin's display name.
    async fn get_recent_activities(&self, limit: i64) -> Result<Vec<ActivityLog>, StoreError> {
        let rows = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT
                a.id,
                a.admin_user_id,
                u.name AS admin_name,
                a.action,
                a.table_name,
                a.record_id,
                a.old_data,
                a.new_data,
                a.created_at
            FROM activity_logs a
            LEFT JOIN admin_users u ON a.admin_user_id = u.id
            ORDER BY a.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
