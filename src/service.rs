use crate::audit::ActivityLogger;
use crate::error::StoreError;
use crate::filter::Kategori;
use crate::models::{
    ActivityLog, AuditAction, CreatePengabdianRequest, CreatePublikasiRequest,
    CreateStatistikRequest, DashboardStats, Pengabdian, Publikasi, Statistik,
    UpdatePengabdianRequest, UpdatePublikasiRequest, UpdateStatistikRequest,
};
use crate::repository::RepositoryState;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Upper bound for the recent-activities feed.
const MAX_ACTIVITY_FEED: i64 = 100;

/// ContentService
///
/// The audited data access layer. Every mutation of the three content entities
/// runs the same choreography: fetch the old snapshot, perform the write,
/// append one audit row attributing the change to the acting admin. The three
/// steps are independent store round-trips with no transaction; concurrent
/// writers race read-modify-write and the last one wins, which the audit trail
/// records faithfully (it is advisory, not a ledger of truth).
///
/// A mutation against a missing row stops at the snapshot step with
/// `StoreError::NotFound` and appends nothing, so re-deleting a record never
/// produces a duplicate audit entry.
#[derive(Clone)]
pub struct ContentService {
    repo: RepositoryState,
    audit: ActivityLogger,
}

fn snapshot<T: Serialize>(entity: &T) -> Option<JsonValue> {
    // Our models serialize infallibly; a failure here would be a programming
    // error and the audit row simply carries no snapshot.
    serde_json::to_value(entity).ok()
}

impl ContentService {
    pub fn new(repo: RepositoryState, audit: ActivityLogger) -> Self {
        Self { repo, audit }
    }

    // --- LISTINGS (public site + admin management pages) ---

    pub async fn list_publikasi(&self) -> Result<Vec<Publikasi>, StoreError> {
        self.repo.get_all_publikasi().await
    }

    pub async fn list_pengabdian(&self) -> Result<Vec<Pengabdian>, StoreError> {
        self.repo.get_all_pengabdian().await
    }

    pub async fn list_statistik(&self) -> Result<Vec<Statistik>, StoreError> {
        self.repo.get_all_statistik().await
    }

    pub async fn get_pengabdian(&self, id: Uuid) -> Result<Option<Pengabdian>, StoreError> {
        self.repo.get_pengabdian(id).await
    }

    pub async fn get_statistik(&self, id: Uuid) -> Result<Option<Statistik>, StoreError> {
        self.repo.get_statistik(id).await
    }

    // --- PUBLIKASI MUTATIONS ---

    /// create_publikasi
    ///
    /// Row first, then the tag set. A failed tag write is logged and the create
    /// still reports success with the row that landed (the admin can re-save
    /// tags); the audit snapshot reflects what is actually stored.
    pub async fn create_publikasi(
        &self,
        req: CreatePublikasiRequest,
        admin_id: Uuid,
    ) -> Result<Publikasi, StoreError> {
        let tags = req.tags.clone();
        let mut created = self.repo.create_publikasi(req).await?;

        if let Some(tags) = tags {
            match self.repo.replace_publikasi_tags(created.id, tags.clone()).await {
                Ok(()) => created.tags = tags,
                Err(e) => {
                    tracing::error!(publikasi = %created.id, "tag insert failed: {e}");
                }
            }
        }

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Create,
                "publikasi",
                created.id,
                None,
                snapshot(&created),
            )
            .await;
        Ok(created)
    }

    /// update_publikasi
    ///
    /// Sparse update: only fields present in `req` are written. A present
    /// `tags` key replaces the whole tag set; an absent one leaves it alone.
    pub async fn update_publikasi(
        &self,
        id: Uuid,
        req: UpdatePublikasiRequest,
        admin_id: Uuid,
    ) -> Result<Publikasi, StoreError> {
        let old = self
            .repo
            .get_publikasi(id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let tags_update = req.tags.clone();
        let mut updated = self
            .repo
            .update_publikasi(id, req)
            .await?
            .ok_or(StoreError::NotFound)?;

        updated.tags = match tags_update {
            Some(tags) => match self.repo.replace_publikasi_tags(id, tags.clone()).await {
                Ok(()) => tags,
                Err(e) => {
                    tracing::error!(publikasi = %id, "tag replacement failed: {e}");
                    old.tags.clone()
                }
            },
            None => old.tags.clone(),
        };

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Update,
                "publikasi",
                id,
                snapshot(&old),
                snapshot(&updated),
            )
            .await;
        Ok(updated)
    }

    /// delete_publikasi
    ///
    /// The old snapshot is captured before the row disappears. Deleting a
    /// missing record is a NotFound, not a silent success.
    pub async fn delete_publikasi(&self, id: Uuid, admin_id: Uuid) -> Result<(), StoreError> {
        let old = self
            .repo
            .get_publikasi(id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let deleted = self.repo.delete_publikasi(id).await?;
        if !deleted {
            // Raced away between snapshot and delete.
            return Err(StoreError::NotFound);
        }

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Delete,
                "publikasi",
                id,
                snapshot(&old),
                None,
            )
            .await;
        Ok(())
    }

    // --- PENGABDIAN MUTATIONS ---

    pub async fn create_pengabdian(
        &self,
        req: CreatePengabdianRequest,
        admin_id: Uuid,
    ) -> Result<Pengabdian, StoreError> {
        let created = self.repo.create_pengabdian(req).await?;
        self.audit
            .record(
                Some(admin_id),
                AuditAction::Create,
                "pengabdian",
                created.id,
                None,
                snapshot(&created),
            )
            .await;
        Ok(created)
    }

    /// update_pengabdian
    ///
    /// When `tanggal` changes, the repository recomputes `bulan_tahun` in the
    /// same write; the returned entity already carries the fresh label.
    pub async fn update_pengabdian(
        &self,
        id: Uuid,
        req: UpdatePengabdianRequest,
        admin_id: Uuid,
    ) -> Result<Pengabdian, StoreError> {
        let old = self
            .repo
            .get_pengabdian(id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let updated = self
            .repo
            .update_pengabdian(id, req)
            .await?
            .ok_or(StoreError::NotFound)?;

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Update,
                "pengabdian",
                id,
                snapshot(&old),
                snapshot(&updated),
            )
            .await;
        Ok(updated)
    }

    pub async fn delete_pengabdian(&self, id: Uuid, admin_id: Uuid) -> Result<(), StoreError> {
        let old = self
            .repo
            .get_pengabdian(id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let deleted = self.repo.delete_pengabdian(id).await?;
        if !deleted {
            return Err(StoreError::NotFound);
        }

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Delete,
                "pengabdian",
                id,
                snapshot(&old),
                None,
            )
            .await;
        Ok(())
    }

    // --- STATISTIK MUTATIONS ---

    pub async fn create_statistik(
        &self,
        req: CreateStatistikRequest,
        admin_id: Uuid,
    ) -> Result<Statistik, StoreError> {
        let created = self.repo.create_statistik(req).await?;
        self.audit
            .record(
                Some(admin_id),
                AuditAction::Create,
                "statistik",
                created.id,
                None,
                snapshot(&created),
            )
            .await;
        Ok(created)
    }

    pub async fn update_statistik(
        &self,
        id: Uuid,
        req: UpdateStatistikRequest,
        admin_id: Uuid,
    ) -> Result<Statistik, StoreError> {
        let old = self
            .repo
            .get_statistik(id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let updated = self
            .repo
            .update_statistik(id, req)
            .await?
            .ok_or(StoreError::NotFound)?;

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Update,
                "statistik",
                id,
                snapshot(&old),
                snapshot(&updated),
            )
            .await;
        Ok(updated)
    }

    pub async fn delete_statistik(&self, id: Uuid, admin_id: Uuid) -> Result<(), StoreError> {
        let old = self
            .repo
            .get_statistik(id)
            .await?
            .ok_or(StoreError::NotFound)?;

        let deleted = self.repo.delete_statistik(id).await?;
        if !deleted {
            return Err(StoreError::NotFound);
        }

        self.audit
            .record(
                Some(admin_id),
                AuditAction::Delete,
                "statistik",
                id,
                snapshot(&old),
                None,
            )
            .await;
        Ok(())
    }

    // --- DASHBOARD & ACTIVITY FEED ---

    /// dashboard_stats
    ///
    /// Publication counts are bucketed through the kategori normalization table
    /// ("Buku", "book" and "BOOK" land in the same bucket; unrecognized values
    /// count toward the total only). Activity counts match status literally.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let kategori_values = self.repo.get_kategori_values().await?;
        let status_values = self.repo.get_status_values().await?;

        let mut stats = DashboardStats {
            total_publikasi: kategori_values.len() as i64,
            total_pengabdian: status_values.len() as i64,
            ..DashboardStats::default()
        };

        for value in &kategori_values {
            match Kategori::parse(value) {
                Some(Kategori::Buku) => stats.total_buku += 1,
                Some(Kategori::Jurnal) => stats.total_jurnal += 1,
                Some(Kategori::OpEd) => stats.total_oped += 1,
                Some(Kategori::Press) => stats.total_press += 1,
                None => {}
            }
        }

        for value in &status_values {
            match value.as_str() {
                "selesai" => stats.pengabdian_selesai += 1,
                "ongoing" => stats.pengabdian_ongoing += 1,
                "planned" => stats.pengabdian_planned += 1,
                _ => {}
            }
        }

        Ok(stats)
    }

    pub async fn recent_activities(&self, limit: i64) -> Result<Vec<ActivityLog>, StoreError> {
        self.repo
            .get_recent_activities(limit.clamp(1, MAX_ACTIVITY_FEED))
            .await
    }
}
