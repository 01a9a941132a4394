use crate::models::{ActivityEntry, AuditAction};
use crate::repository::RepositoryState;
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// ActivityLogger
///
/// Best-effort writer for the audit trail. The deliberate asymmetry of the
/// system lives here: a mutation that succeeded is *never* rolled back or
/// reported as failed because its audit append did not land. Failures are
/// emitted through `tracing::error!` and otherwise invisible to callers.
#[derive(Clone)]
pub struct ActivityLogger {
    repo: RepositoryState,
}

impl ActivityLogger {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// record
    ///
    /// Appends one audit row: who, which verb, which table, which record, and
    /// the entity snapshots around the mutation (CREATE has no `old`, DELETE
    /// has no `new`). Infallible by signature; see the struct docs.
    pub async fn record(
        &self,
        admin_user_id: Option<Uuid>,
        action: AuditAction,
        table_name: &str,
        record_id: Uuid,
        old_data: Option<JsonValue>,
        new_data: Option<JsonValue>,
    ) {
        let entry = ActivityEntry {
            admin_user_id,
            action,
            table_name: table_name.to_string(),
            record_id,
            old_data,
            new_data,
        };

        if let Err(e) = self.repo.log_activity(entry).await {
            tracing::error!(
                action = action.as_str(),
                table = table_name,
                record = %record_id,
                "failed to append activity log: {e}"
            );
        }
    }
}
