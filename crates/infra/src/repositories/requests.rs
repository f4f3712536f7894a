use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::Client;
use tokio::sync::RwLock;

use sahayata_domain::DomainResult;
use sahayata_domain::error::DomainError;
use sahayata_domain::ports::BoxFuture;
use sahayata_domain::ports::requests::{CrisisRequestRepository, TriagePatch};
use sahayata_domain::request::CrisisRequest;

use crate::db::{self, DbConfig};

const REQUEST_TABLE: &str = "crisis_request";

#[derive(Default)]
pub struct InMemoryCrisisRequestRepository {
    store: Arc<RwLock<HashMap<String, CrisisRequest>>>,
}

impl InMemoryCrisisRequestRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CrisisRequestRepository for InMemoryCrisisRequestRepository {
    fn create(&self, request: &CrisisRequest) -> BoxFuture<'_, DomainResult<CrisisRequest>> {
        let request = request.clone();
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.write().await;
            if store.contains_key(&request.request_id) {
                return Err(DomainError::Storage(format!(
                    "duplicate request id {}",
                    request.request_id
                )));
            }
            store.insert(request.request_id.clone(), request.clone());
            Ok(request)
        })
    }

    fn get(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Option<CrisisRequest>>> {
        let request_id = request_id.to_string();
        let store = self.store.clone();
        Box::pin(async move { Ok(store.read().await.get(&request_id).cloned()) })
    }

    fn apply_triage(
        &self,
        request_id: &str,
        patch: &TriagePatch,
    ) -> BoxFuture<'_, DomainResult<Option<CrisisRequest>>> {
        let request_id = request_id.to_string();
        let patch = patch.clone();
        let store = self.store.clone();
        Box::pin(async move {
            // single write lock per patch: readers never observe a
            // half-applied update
            let mut store = store.write().await;
            let Some(record) = store.get_mut(&request_id) else {
                return Ok(None);
            };
            if let Some(status) = patch.status {
                record.status = status;
            }
            if let Some(assigned_to) = patch.assigned_to {
                record.assigned_to = Some(assigned_to);
            }
            if let Some(admin_notes) = patch.admin_notes {
                record.admin_notes = Some(admin_notes);
            }
            record.updated_at_ms = Some(patch.updated_at_ms);
            Ok(Some(record.clone()))
        })
    }

    fn list_newest_first(&self) -> BoxFuture<'_, DomainResult<Vec<CrisisRequest>>> {
        let store = self.store.clone();
        Box::pin(async move {
            let store = store.read().await;
            let mut requests: Vec<CrisisRequest> = store.values().cloned().collect();
            // ids are time-ordered uuids, so the tie-break keeps repeated
            // listings identical even for same-millisecond records
            requests.sort_by(|a, b| {
                b.created_at_ms
                    .unwrap_or(0)
                    .cmp(&a.created_at_ms.unwrap_or(0))
                    .then_with(|| b.request_id.cmp(&a.request_id))
            });
            Ok(requests)
        })
    }
}

#[derive(Clone)]
pub struct SurrealCrisisRequestRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealCrisisRequestRepository {
    pub async fn connect(config: &DbConfig) -> anyhow::Result<Self> {
        let client = db::connect(config).await?;
        define_indexes(&client).await?;
        Ok(Self { client })
    }
}

/// The compound index keeps the default newest-first listing cheap as volume
/// grows; the coordinate index backs proximity queries via `geo::distance`.
async fn define_indexes(client: &Surreal<Client>) -> anyhow::Result<()> {
    client
        .query(
            "DEFINE INDEX IF NOT EXISTS crisis_request_status_created \
             ON TABLE crisis_request COLUMNS status, created_at_ms;",
        )
        .query(
            "DEFINE INDEX IF NOT EXISTS crisis_request_coordinates \
             ON TABLE crisis_request COLUMNS location.longitude, location.latitude;",
        )
        .await?;
    Ok(())
}

impl CrisisRequestRepository for SurrealCrisisRequestRepository {
    fn create(&self, request: &CrisisRequest) -> BoxFuture<'_, DomainResult<CrisisRequest>> {
        let request = request.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let created: Option<CrisisRequest> = client
                .create((REQUEST_TABLE, request.request_id.as_str()))
                .content(request.clone())
                .await
                .map_err(|err| {
                    DomainError::Storage(format!("create crisis request failed: {err}"))
                })?;
            Ok(created.unwrap_or(request))
        })
    }

    fn get(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Option<CrisisRequest>>> {
        let request_id = request_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            client
                .select((REQUEST_TABLE, request_id.as_str()))
                .await
                .map_err(|err| {
                    DomainError::Storage(format!("select crisis request failed: {err}"))
                })
        })
    }

    fn apply_triage(
        &self,
        request_id: &str,
        patch: &TriagePatch,
    ) -> BoxFuture<'_, DomainResult<Option<CrisisRequest>>> {
        let request_id = request_id.to_string();
        let patch = patch.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let mut merge = Map::new();
            if let Some(status) = patch.status {
                merge.insert("status".to_string(), Value::from(status.as_str()));
            }
            if let Some(assigned_to) = patch.assigned_to {
                merge.insert("assigned_to".to_string(), Value::from(assigned_to));
            }
            if let Some(admin_notes) = patch.admin_notes {
                merge.insert("admin_notes".to_string(), Value::from(admin_notes));
            }
            merge.insert("updated_at_ms".to_string(), Value::from(patch.updated_at_ms));

            // update-by-id never creates: an unknown id comes back as None
            client
                .update((REQUEST_TABLE, request_id.as_str()))
                .merge(Value::Object(merge))
                .await
                .map_err(|err| {
                    DomainError::Storage(format!("update crisis request failed: {err}"))
                })
        })
    }

    fn list_newest_first(&self) -> BoxFuture<'_, DomainResult<Vec<CrisisRequest>>> {
        let client = self.client.clone();
        Box::pin(async move {
            client
                .query(
                    "SELECT * FROM crisis_request \
                     ORDER BY created_at_ms DESC, request_id DESC",
                )
                .await
                .map_err(|err| DomainError::Storage(format!("list crisis requests failed: {err}")))?
                .take(0)
                .map_err(|err| {
                    DomainError::Storage(format!("parse crisis requests failed: {err}"))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sahayata_domain::request::{RequestCategory, RequestStatus};

    fn record(request_id: &str, created_at_ms: i64) -> CrisisRequest {
        CrisisRequest {
            request_id: request_id.to_string(),
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            address: None,
            category: RequestCategory::Medical,
            message: None,
            photo_url: None,
            audio_url: None,
            location: None,
            status: RequestStatus::Pending,
            assigned_to: None,
            admin_notes: None,
            created_at_ms: Some(created_at_ms),
            updated_at_ms: Some(created_at_ms),
        }
    }

    #[tokio::test]
    async fn triage_patch_touches_only_supplied_fields() {
        let repo = InMemoryCrisisRequestRepository::new();
        repo.create(&record("r1", 10)).await.expect("create");

        let patch = TriagePatch {
            status: Some(RequestStatus::Resolved),
            updated_at_ms: 20,
            ..TriagePatch::default()
        };
        let updated = repo
            .apply_triage("r1", &patch)
            .await
            .expect("patch")
            .expect("exists");
        assert_eq!(updated.status, RequestStatus::Resolved);
        assert!(updated.admin_notes.is_none());
        assert_eq!(updated.updated_at_ms, Some(20));
        assert_eq!(updated.created_at_ms, Some(10));
    }

    #[tokio::test]
    async fn get_returns_the_stored_record_or_none() {
        let repo = InMemoryCrisisRequestRepository::new();
        repo.create(&record("r1", 10)).await.expect("create");

        let found = repo.get("r1").await.expect("get");
        assert_eq!(found.as_ref().map(|r| r.request_id.as_str()), Some("r1"));
        assert!(repo.get("missing").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn triage_patch_of_unknown_id_returns_none() {
        let repo = InMemoryCrisisRequestRepository::new();
        let result = repo
            .apply_triage("missing", &TriagePatch::default())
            .await
            .expect("patch");
        assert!(result.is_none());
        assert!(repo.list_newest_first().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn listing_orders_by_creation_descending() {
        let repo = InMemoryCrisisRequestRepository::new();
        repo.create(&record("r1", 10)).await.expect("create");
        repo.create(&record("r2", 30)).await.expect("create");
        repo.create(&record("r3", 20)).await.expect("create");

        let listing = repo.list_newest_first().await.expect("list");
        let ids: Vec<&str> = listing.iter().map(|r| r.request_id.as_str()).collect();
        assert_eq!(ids, ["r2", "r3", "r1"]);
    }

    #[tokio::test]
    async fn duplicate_create_is_a_storage_error() {
        let repo = InMemoryCrisisRequestRepository::new();
        repo.create(&record("r1", 10)).await.expect("create");
        let result = repo.create(&record("r1", 11)).await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }
}
