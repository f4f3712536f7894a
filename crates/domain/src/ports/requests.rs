use crate::DomainResult;
use crate::ports::BoxFuture;
use crate::request::{CrisisRequest, RequestStatus};

/// Field-level partial update. Only `Some` fields are written; the store
/// applies the whole patch atomically per record, last write wins.
#[derive(Clone, Debug, Default)]
pub struct TriagePatch {
    pub status: Option<RequestStatus>,
    pub assigned_to: Option<String>,
    pub admin_notes: Option<String>,
    pub updated_at_ms: i64,
}

pub trait CrisisRequestRepository: Send + Sync {
    fn create(&self, request: &CrisisRequest) -> BoxFuture<'_, DomainResult<CrisisRequest>>;

    fn get(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Option<CrisisRequest>>>;

    /// Returns `None` when the id does not exist; never creates a record.
    fn apply_triage(
        &self,
        request_id: &str,
        patch: &TriagePatch,
    ) -> BoxFuture<'_, DomainResult<Option<CrisisRequest>>>;

    fn list_newest_first(&self) -> BoxFuture<'_, DomainResult<Vec<CrisisRequest>>>;
}
