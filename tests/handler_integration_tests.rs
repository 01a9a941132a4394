use akademik_portal::{
    ActivityLogger, AppState, ContentService,
    auth::AdminSession,
    config::AppConfig,
    error::StoreError,
    handlers,
    models::{
        ActivityEntry, ActivityLog, AdminUser, AuditAction, CreatePengabdianRequest,
        CreatePublikasiRequest, CreateStatistikRequest, DashboardStats, Pengabdian, Publikasi,
        Statistik, UpdatePengabdianRequest, UpdatePublikasiRequest, UpdateStatistikRequest,
        bulan_tahun_label,
    },
    repository::{Repository, RepositoryState},
};
use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// In-memory store with the same write semantics as the Postgres implementation
// (COALESCE-style sparse updates, derived bulan_tahun, wholesale tag
// replacement). Audit appends are recorded in `logged` so tests can assert
// exactly what the service wrote.
pub struct MockContentRepo {
    pub publikasi: Mutex<Vec<Publikasi>>,
    pub pengabdian: Mutex<Vec<Pengabdian>>,
    pub statistik: Mutex<Vec<Statistik>>,
    pub admin_to_return: Option<AdminUser>,
    pub activities_to_return: Vec<ActivityLog>,
    pub logged: Mutex<Vec<ActivityEntry>>,
    // Failure switches
    pub fail_deletes: bool,
    pub fail_audit: bool,
}

impl Default for MockContentRepo {
    fn default() -> Self {
        MockContentRepo {
            publikasi: Mutex::new(vec![]),
            pengabdian: Mutex::new(vec![]),
            statistik: Mutex::new(vec![]),
            admin_to_return: None,
            activities_to_return: vec![],
            logged: Mutex::new(vec![]),
            fail_deletes: false,
            fail_audit: false,
        }
    }
}

#[async_trait]
impl Repository for MockContentRepo {
    // --- Publikasi ---
    async fn get_all_publikasi(&self) -> Result<Vec<Publikasi>, StoreError> {
        Ok(self.publikasi.lock().unwrap().clone())
    }
    async fn get_publikasi(&self, id: Uuid) -> Result<Option<Publikasi>, StoreError> {
        Ok(self
            .publikasi
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }
    async fn create_publikasi(
        &self,
        req: CreatePublikasiRequest,
    ) -> Result<Publikasi, StoreError> {
        let row = Publikasi {
            id: Uuid::new_v4(),
            judul: req.judul,
            kategori: req.kategori,
            penulis: req.penulis,
            tahun: req.tahun,
            deskripsi: req.deskripsi,
            url: req.url,
            keywords: req.keywords,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.publikasi.lock().unwrap().push(row.clone());
        Ok(row)
    }
    async fn update_publikasi(
        &self,
        id: Uuid,
        req: UpdatePublikasiRequest,
    ) -> Result<Option<Publikasi>, StoreError> {
        let mut store = self.publikasi.lock().unwrap();
        let Some(row) = store.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(judul) = req.judul {
            row.judul = judul;
        }
        if let Some(kategori) = req.kategori {
            row.kategori = kategori;
        }
        if let Some(penulis) = req.penulis {
            row.penulis = penulis;
        }
        if let Some(tahun) = req.tahun {
            row.tahun = tahun;
        }
        if let Some(deskripsi) = req.deskripsi {
            row.deskripsi = Some(deskripsi);
        }
        if let Some(url) = req.url {
            row.url = Some(url);
        }
        if let Some(keywords) = req.keywords {
            row.keywords = Some(keywords);
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
    async fn delete_publikasi(&self, id: Uuid) -> Result<bool, StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Backend("store rejected delete".to_string()));
        }
        let mut store = self.publikasi.lock().unwrap();
        let before = store.len();
        store.retain(|p| p.id != id);
        Ok(store.len() < before)
    }
    async fn replace_publikasi_tags(
        &self,
        publikasi_id: Uuid,
        tags: Vec<String>,
    ) -> Result<(), StoreError> {
        if let Some(row) = self
            .publikasi
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == publikasi_id)
        {
            row.tags = tags;
        }
        Ok(())
    }

    // --- Pengabdian ---
    async fn get_all_pengabdian(&self) -> Result<Vec<Pengabdian>, StoreError> {
        Ok(self.pengabdian.lock().unwrap().clone())
    }
    async fn get_pengabdian(&self, id: Uuid) -> Result<Option<Pengabdian>, StoreError> {
        Ok(self
            .pengabdian
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }
    async fn create_pengabdian(
        &self,
        req: CreatePengabdianRequest,
    ) -> Result<Pengabdian, StoreError> {
        let row = Pengabdian {
            id: Uuid::new_v4(),
            judul: req.judul,
            tanggal: req.tanggal,
            bulan_tahun: bulan_tahun_label(req.tanggal),
            status: req.status,
            deskripsi: req.deskripsi,
            lokasi: req.lokasi,
            jumlah_peserta: req.jumlah_peserta,
            keywords: req.keywords,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.pengabdian.lock().unwrap().push(row.clone());
        Ok(row)
    }
    async fn update_pengabdian(
        &self,
        id: Uuid,
        req: UpdatePengabdianRequest,
    ) -> Result<Option<Pengabdian>, StoreError> {
        let mut store = self.pengabdian.lock().unwrap();
        let Some(row) = store.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(judul) = req.judul {
            row.judul = judul;
        }
        if let Some(tanggal) = req.tanggal {
            row.tanggal = tanggal;
            row.bulan_tahun = bulan_tahun_label(tanggal);
        }
        if let Some(status) = req.status {
            row.status = status;
        }
        if let Some(deskripsi) = req.deskripsi {
            row.deskripsi = deskripsi;
        }
        if let Some(lokasi) = req.lokasi {
            row.lokasi = lokasi;
        }
        if let Some(jumlah_peserta) = req.jumlah_peserta {
            row.jumlah_peserta = Some(jumlah_peserta);
        }
        if let Some(keywords) = req.keywords {
            row.keywords = Some(keywords);
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
    async fn delete_pengabdian(&self, id: Uuid) -> Result<bool, StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Backend("store rejected delete".to_string()));
        }
        let mut store = self.pengabdian.lock().unwrap();
        let before = store.len();
        store.retain(|p| p.id != id);
        Ok(store.len() < before)
    }

    // --- Statistik ---
    async fn get_all_statistik(&self) -> Result<Vec<Statistik>, StoreError> {
        Ok(self.statistik.lock().unwrap().clone())
    }
    async fn get_statistik(&self, id: Uuid) -> Result<Option<Statistik>, StoreError> {
        Ok(self
            .statistik
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }
    async fn create_statistik(
        &self,
        req: CreateStatistikRequest,
    ) -> Result<Statistik, StoreError> {
        let row = Statistik {
            id: Uuid::new_v4(),
            label: req.label,
            nilai: req.nilai,
            deskripsi: req.deskripsi,
            sub_deskripsi: req.sub_deskripsi,
            urutan: req.urutan,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.statistik.lock().unwrap().push(row.clone());
        Ok(row)
    }
    async fn update_statistik(
        &self,
        id: Uuid,
        req: UpdateStatistikRequest,
    ) -> Result<Option<Statistik>, StoreError> {
        let mut store = self.statistik.lock().unwrap();
        let Some(row) = store.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(label) = req.label {
            row.label = label;
        }
        if let Some(nilai) = req.nilai {
            row.nilai = nilai;
        }
        if let Some(deskripsi) = req.deskripsi {
            row.deskripsi = Some(deskripsi);
        }
        if let Some(sub_deskripsi) = req.sub_deskripsi {
            row.sub_deskripsi = Some(sub_deskripsi);
        }
        if let Some(urutan) = req.urutan {
            row.urutan = urutan;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }
    async fn delete_statistik(&self, id: Uuid) -> Result<bool, StoreError> {
        if self.fail_deletes {
            return Err(StoreError::Backend("store rejected delete".to_string()));
        }
        let mut store = self.statistik.lock().unwrap();
        let before = store.len();
        store.retain(|s| s.id != id);
        Ok(store.len() < before)
    }

    // --- Dashboard inputs ---
    async fn get_kategori_values(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .publikasi
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.kategori.clone())
            .collect())
    }
    async fn get_status_values(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .pengabdian
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.status.clone())
            .collect())
    }

    // --- Admin identity & audit trail ---
    async fn get_admin_by_auth_id(
        &self,
        _auth_user_id: Uuid,
    ) -> Result<Option<AdminUser>, StoreError> {
        Ok(self.admin_to_return.clone())
    }
    async fn touch_admin_last_login(&self, _auth_user_id: Uuid) -> Result<(), StoreError> {
        Ok(())
    }
    async fn log_activity(&self, entry: ActivityEntry) -> Result<(), StoreError> {
        if self.fail_audit {
            return Err(StoreError::Backend("audit table unavailable".to_string()));
        }
        self.logged.lock().unwrap().push(entry);
        Ok(())
    }
    async fn get_recent_activities(&self, limit: i64) -> Result<Vec<ActivityLog>, StoreError> {
        Ok(self
            .activities_to_return
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// --- TEST UTILITIES ---

const TEST_ADMIN_ID: Uuid = Uuid::from_u128(456);

// Creates an AppState around the mock, keeping a typed handle for assertions.
fn create_test_state(mock: MockContentRepo) -> (AppState, Arc<MockContentRepo>) {
    let mock = Arc::new(mock);
    let repo: RepositoryState = mock.clone();
    let service = ContentService::new(repo.clone(), ActivityLogger::new(repo.clone()));
    let state = AppState {
        repo,
        service,
        config: AppConfig::default(),
    };
    (state, mock)
}

fn admin_session() -> AdminSession {
    AdminSession {
        admin_id: TEST_ADMIN_ID,
        email: "admin@example.com".to_string(),
        role: "admin".to_string(),
    }
}

// Dissects any handler response into status + JSON body.
async fn response_json(response: Response) -> (StatusCode, JsonValue) {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).expect("response body should be JSON");
    (parts.status, json)
}

fn sample_publikasi(judul: &str, kategori: &str) -> Publikasi {
    Publikasi {
        id: Uuid::new_v4(),
        judul: judul.to_string(),
        kategori: kategori.to_string(),
        penulis: "Dr. Test".to_string(),
        tahun: 2024,
        ..Publikasi::default()
    }
}

fn sample_pengabdian(status: &str) -> Pengabdian {
    let tanggal = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    Pengabdian {
        id: Uuid::new_v4(),
        judul: "Pelatihan Literasi".to_string(),
        tanggal,
        bulan_tahun: bulan_tahun_label(tanggal),
        status: status.to_string(),
        deskripsi: "Pelatihan untuk guru".to_string(),
        lokasi: "Jakarta".to_string(),
        ..Pengabdian::default()
    }
}

fn sample_statistik(label: &str, urutan: i32) -> Statistik {
    Statistik {
        id: Uuid::new_v4(),
        label: label.to_string(),
        nilai: "20+".to_string(),
        urutan,
        ..Statistik::default()
    }
}

// --- PUBLIKASI HANDLER TESTS ---

#[tokio::test]
async fn test_create_publikasi_success_envelope_and_audit() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let payload = CreatePublikasiRequest {
        judul: "Ekonomi Digital".to_string(),
        kategori: "buku".to_string(),
        penulis: "Dr. Test".to_string(),
        tahun: 2024,
        tags: Some(vec!["ekonomi".to_string(), "digital".to_string()]),
        ..CreatePublikasiRequest::default()
    };

    let response =
        handlers::create_publikasi(admin_session(), State(state), Json(payload)).await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "success": true }));

    // The row landed with its tags.
    let stored = mock.publikasi.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].tags, vec!["ekonomi", "digital"]);

    // Exactly one CREATE entry, attributed to the acting admin.
    let logged = mock.logged.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].action, AuditAction::Create);
    assert_eq!(logged[0].table_name, "publikasi");
    assert_eq!(logged[0].admin_user_id, Some(TEST_ADMIN_ID));
    assert!(logged[0].old_data.is_none());
    assert!(logged[0].new_data.is_some());
}

#[tokio::test]
async fn test_create_publikasi_blank_judul_uses_legacy_failure_envelope() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let payload = CreatePublikasiRequest {
        judul: "   ".to_string(),
        kategori: "buku".to_string(),
        penulis: "Dr. Test".to_string(),
        tahun: 2024,
        ..CreatePublikasiRequest::default()
    };

    let response =
        handlers::create_publikasi(admin_session(), State(state), Json(payload)).await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    // This endpoint reports failures as {success:false, error}, not {error}.
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "judul is required");

    assert!(mock.publikasi.lock().unwrap().is_empty());
    assert!(mock.logged.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_publikasi_rejects_malformed_id_before_store() {
    let (state, mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![sample_publikasi("A", "buku")]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_publikasi(
        admin_session(),
        State(state),
        Path("123".to_string()),
        Json(UpdatePublikasiRequest::default()),
    )
    .await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ID");
    // Nothing was touched and nothing was audited.
    assert_eq!(mock.publikasi.lock().unwrap()[0].judul, "A");
    assert!(mock.logged.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_publikasi_missing_record_is_404_without_audit() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let result = handlers::update_publikasi(
        admin_session(),
        State(state),
        Path(Uuid::new_v4().to_string()),
        Json(UpdatePublikasiRequest {
            judul: Some("New".to_string()),
            ..UpdatePublikasiRequest::default()
        }),
    )
    .await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Publikasi not found");
    assert!(mock.logged.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_publikasi_writes_only_present_fields() {
    let seeded = sample_publikasi("Original Title", "buku");
    let id = seeded.id;
    let (state, mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_publikasi(
        admin_session(),
        State(state),
        Path(id.to_string()),
        Json(UpdatePublikasiRequest {
            tahun: Some(2030),
            ..UpdatePublikasiRequest::default()
        }),
    )
    .await;
    let (status, _body) = response_json(result.into_response()).await;
    assert_eq!(status, StatusCode::OK);

    // The absent fields kept their stored values.
    let stored = mock.publikasi.lock().unwrap();
    assert_eq!(stored[0].tahun, 2030);
    assert_eq!(stored[0].judul, "Original Title");

    // One UPDATE entry with both snapshots; the new one shows the change.
    let logged = mock.logged.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].action, AuditAction::Update);
    assert_eq!(logged[0].old_data.as_ref().unwrap()["tahun"], 2024);
    assert_eq!(logged[0].new_data.as_ref().unwrap()["tahun"], 2030);
}

#[tokio::test]
async fn test_update_publikasi_replaces_tag_set_wholesale() {
    let mut seeded = sample_publikasi("A", "buku");
    seeded.tags = vec!["old-a".to_string(), "old-b".to_string()];
    let id = seeded.id;
    let (state, mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_publikasi(
        admin_session(),
        State(state),
        Path(id.to_string()),
        Json(UpdatePublikasiRequest {
            tags: Some(vec!["fresh".to_string()]),
            ..UpdatePublikasiRequest::default()
        }),
    )
    .await;
    assert!(result.is_ok());

    assert_eq!(mock.publikasi.lock().unwrap()[0].tags, vec!["fresh"]);
}

#[tokio::test]
async fn test_update_publikasi_absent_tags_key_leaves_tags_alone() {
    let mut seeded = sample_publikasi("A", "buku");
    seeded.tags = vec!["keep-me".to_string()];
    let id = seeded.id;
    let (state, mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_publikasi(
        admin_session(),
        State(state),
        Path(id.to_string()),
        Json(UpdatePublikasiRequest {
            judul: Some("Renamed".to_string()),
            ..UpdatePublikasiRequest::default()
        }),
    )
    .await;
    assert!(result.is_ok());

    let stored = mock.publikasi.lock().unwrap();
    assert_eq!(stored[0].judul, "Renamed");
    assert_eq!(stored[0].tags, vec!["keep-me"]);
}

#[tokio::test]
async fn test_update_publikasi_writes_provided_empty_string() {
    // Presence is the signal, not truthiness: a provided-but-empty field is
    // written as-is.
    let seeded = sample_publikasi("Original Title", "buku");
    let id = seeded.id;
    let (state, mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_publikasi(
        admin_session(),
        State(state),
        Path(id.to_string()),
        Json(UpdatePublikasiRequest {
            keywords: Some(String::new()),
            ..UpdatePublikasiRequest::default()
        }),
    )
    .await;
    assert!(result.is_ok());

    assert_eq!(
        mock.publikasi.lock().unwrap()[0].keywords.as_deref(),
        Some("")
    );
}

#[tokio::test]
async fn test_delete_publikasi_audits_final_snapshot() {
    let seeded = sample_publikasi("Doomed", "buku");
    let id = seeded.id;
    let (state, mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result =
        handlers::delete_publikasi(admin_session(), State(state), Path(id.to_string())).await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "success": true }));
    assert!(mock.publikasi.lock().unwrap().is_empty());

    let logged = mock.logged.lock().unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].action, AuditAction::Delete);
    // DELETE carries the final snapshot and no new state.
    assert_eq!(logged[0].old_data.as_ref().unwrap()["judul"], "Doomed");
    assert!(logged[0].new_data.is_none());
}

#[tokio::test]
async fn test_delete_publikasi_store_failure_maps_to_500() {
    let seeded = sample_publikasi("A", "buku");
    let id = seeded.id;
    let (state, _mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![seeded]),
        fail_deletes: true,
        ..MockContentRepo::default()
    });

    let result =
        handlers::delete_publikasi(admin_session(), State(state), Path(id.to_string())).await;
    let (status, _body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

// --- PENGABDIAN HANDLER TESTS ---

#[tokio::test]
async fn test_create_pengabdian_echoes_entity_with_derived_label() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let payload = CreatePengabdianRequest {
        judul: "Pelatihan Literasi".to_string(),
        tanggal: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        status: "planned".to_string(),
        deskripsi: "Pelatihan untuk guru".to_string(),
        lokasi: "Jakarta".to_string(),
        ..CreatePengabdianRequest::default()
    };

    let result = handlers::create_pengabdian(admin_session(), State(state), Json(payload)).await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    // The label was never in the payload; the store derived it.
    assert_eq!(body["data"]["bulan_tahun"], "Mei 2024");

    assert_eq!(mock.logged.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_pengabdian_rejects_unknown_status() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let payload = CreatePengabdianRequest {
        judul: "Pelatihan".to_string(),
        tanggal: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        status: "done".to_string(),
        deskripsi: "Desc".to_string(),
        lokasi: "Jakarta".to_string(),
        ..CreatePengabdianRequest::default()
    };

    let result = handlers::create_pengabdian(admin_session(), State(state), Json(payload)).await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("status must be one of")
    );
    assert!(mock.pengabdian.lock().unwrap().is_empty());
    assert!(mock.logged.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_pengabdian_recomputes_label_when_date_changes() {
    let seeded = sample_pengabdian("planned");
    let id = seeded.id;
    assert_eq!(seeded.bulan_tahun, "Mei 2024");
    let (state, mock) = create_test_state(MockContentRepo {
        pengabdian: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_pengabdian(
        admin_session(),
        State(state),
        Path(id.to_string()),
        Json(UpdatePengabdianRequest {
            tanggal: Some(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()),
            ..UpdatePengabdianRequest::default()
        }),
    )
    .await;
    assert!(result.is_ok());

    let stored = mock.pengabdian.lock().unwrap();
    assert_eq!(stored[0].bulan_tahun, "Januari 2025");
}

#[tokio::test]
async fn test_update_pengabdian_keeps_label_when_date_absent() {
    let seeded = sample_pengabdian("planned");
    let id = seeded.id;
    let (state, mock) = create_test_state(MockContentRepo {
        pengabdian: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::update_pengabdian(
        admin_session(),
        State(state),
        Path(id.to_string()),
        Json(UpdatePengabdianRequest {
            judul: Some("Renamed".to_string()),
            ..UpdatePengabdianRequest::default()
        }),
    )
    .await;
    assert!(result.is_ok());

    let stored = mock.pengabdian.lock().unwrap();
    assert_eq!(stored[0].judul, "Renamed");
    assert_eq!(stored[0].bulan_tahun, "Mei 2024");
}

#[tokio::test]
async fn test_delete_pengabdian_store_failure_maps_to_400() {
    // Unlike publikasi, pengabdian delete failures surface as client errors.
    let seeded = sample_pengabdian("planned");
    let id = seeded.id;
    let (state, _mock) = create_test_state(MockContentRepo {
        pengabdian: Mutex::new(vec![seeded]),
        fail_deletes: true,
        ..MockContentRepo::default()
    });

    let result =
        handlers::delete_pengabdian(admin_session(), State(state), Path(id.to_string())).await;
    let (status, _body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_missing_pengabdian_is_404_without_audit() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let result = handlers::delete_pengabdian(
        admin_session(),
        State(state),
        Path(Uuid::new_v4().to_string()),
    )
    .await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Pengabdian not found");
    assert!(mock.logged.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_pengabdian_details_found_and_not_found() {
    let seeded = sample_pengabdian("ongoing");
    let id = seeded.id;
    let (state, _mock) = create_test_state(MockContentRepo {
        pengabdian: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result = handlers::get_pengabdian_details(
        admin_session(),
        State(state.clone()),
        Path(id.to_string()),
    )
    .await;
    assert!(result.is_ok());
    let Json(found) = result.unwrap();
    assert_eq!(found.id, id);

    let result = handlers::get_pengabdian_details(
        admin_session(),
        State(state),
        Path(Uuid::new_v4().to_string()),
    )
    .await;
    let (status, body) = response_json(result.into_response()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Pengabdian not found");
}

// --- STATISTIK HANDLER TESTS ---

#[tokio::test]
async fn test_create_statistik_requires_label() {
    let (state, mock) = create_test_state(MockContentRepo::default());

    let payload = CreateStatistikRequest {
        label: " ".to_string(),
        nilai: "20+".to_string(),
        ..CreateStatistikRequest::default()
    };

    let result = handlers::create_statistik(admin_session(), State(state), Json(payload)).await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "label is required");
    assert!(mock.statistik.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_statistik_rejects_malformed_id_before_store() {
    let seeded = sample_statistik("Publikasi", 1);
    let (state, mock) = create_test_state(MockContentRepo {
        statistik: Mutex::new(vec![seeded]),
        ..MockContentRepo::default()
    });

    let result =
        handlers::delete_statistik(admin_session(), State(state), Path("xyz".to_string())).await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid ID");
    assert_eq!(mock.statistik.lock().unwrap().len(), 1);
    assert!(mock.logged.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_statistik_details_not_found_message() {
    let (state, _mock) = create_test_state(MockContentRepo::default());

    let result = handlers::get_statistik_details(
        admin_session(),
        State(state),
        Path(Uuid::new_v4().to_string()),
    )
    .await;
    let (status, body) = response_json(result.into_response()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Statistik not found");
}

#[tokio::test]
async fn test_audit_append_failure_does_not_fail_the_mutation() {
    let (state, mock) = create_test_state(MockContentRepo {
        fail_audit: true,
        ..MockContentRepo::default()
    });

    let payload = CreateStatistikRequest {
        label: "Publikasi".to_string(),
        nilai: "20+".to_string(),
        ..CreateStatistikRequest::default()
    };

    let result = handlers::create_statistik(admin_session(), State(state), Json(payload)).await;
    let (status, body) = response_json(result.into_response()).await;

    // The mutation succeeded even though the audit append was rejected.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(mock.statistik.lock().unwrap().len(), 1);
    assert!(mock.logged.lock().unwrap().is_empty());
}

// --- DASHBOARD & ADMIN OVERVIEW TESTS ---

#[tokio::test]
async fn test_dashboard_buckets_categories_and_statuses() {
    let (state, _mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![
            sample_publikasi("A", "Buku"),
            sample_publikasi("B", "book"),
            sample_publikasi("C", "press/news"),
            sample_publikasi("D", "Journal"),
            sample_publikasi("E", "misc"),
        ]),
        pengabdian: Mutex::new(vec![
            sample_pengabdian("selesai"),
            sample_pengabdian("ongoing"),
            sample_pengabdian("planned"),
            sample_pengabdian("ongoing"),
        ]),
        ..MockContentRepo::default()
    });

    let result = handlers::get_dashboard(admin_session(), State(state)).await;
    assert!(result.is_ok());
    let Json(stats) = result.unwrap();

    let expected = DashboardStats {
        total_publikasi: 5,
        total_buku: 2,
        total_jurnal: 1,
        total_oped: 0,
        total_press: 1,
        total_pengabdian: 4,
        pengabdian_selesai: 1,
        pengabdian_ongoing: 2,
        pengabdian_planned: 1,
    };
    // "misc" counts toward the total but no bucket.
    assert_eq!(stats, expected);
}

#[tokio::test]
async fn test_admin_overview_includes_stats_and_recent_feed() {
    let feed = vec![
        ActivityLog {
            id: Uuid::new_v4(),
            action: "DELETE".to_string(),
            table_name: "publikasi".to_string(),
            admin_name: Some("Test Admin".to_string()),
            ..ActivityLog::default()
        },
        ActivityLog {
            id: Uuid::new_v4(),
            action: "CREATE".to_string(),
            table_name: "statistik".to_string(),
            ..ActivityLog::default()
        },
    ];
    let (state, _mock) = create_test_state(MockContentRepo {
        publikasi: Mutex::new(vec![sample_publikasi("A", "buku")]),
        activities_to_return: feed,
        ..MockContentRepo::default()
    });

    let result = handlers::admin_overview(admin_session(), State(state)).await;
    assert!(result.is_ok());
    let Json(overview) = result.unwrap();

    assert_eq!(overview.stats.total_publikasi, 1);
    assert_eq!(overview.recent_activities.len(), 2);
    // Newest first, with the admin name resolved where the store has it.
    assert_eq!(overview.recent_activities[0].action, "DELETE");
    assert_eq!(
        overview.recent_activities[0].admin_name.as_deref(),
        Some("Test Admin")
    );
}

// --- ADMIN PAGE DATA TESTS ---

#[tokio::test]
async fn test_admin_statistik_page_returns_full_list() {
    let (state, _mock) = create_test_state(MockContentRepo {
        statistik: Mutex::new(vec![
            sample_statistik("Publikasi", 1),
            sample_statistik("Pengabdian", 2),
        ]),
        ..MockContentRepo::default()
    });

    let result = handlers::admin_statistik_page(admin_session(), State(state)).await;
    assert!(result.is_ok());
    let Json(items) = result.unwrap();
    assert_eq!(items.len(), 2);
}
