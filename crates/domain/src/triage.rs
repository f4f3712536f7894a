use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::requests::{CrisisRequestRepository, TriagePatch};
use crate::request::{CrisisRequest, RequestStatus};
use crate::util::now_ms;

pub const MAX_ADMIN_NOTES_LENGTH: usize = 500;
pub const MAX_ASSIGNED_TO_LENGTH: usize = 100;

/// Administrative mutation as requested by the operator. Omitted fields keep
/// their prior values; `status` arrives as a free string and is parsed here.
#[derive(Clone, Debug, Default)]
pub struct TriageUpdate {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Clone)]
pub struct TriageService {
    repository: Arc<dyn CrisisRequestRepository>,
}

impl TriageService {
    pub fn new(repository: Arc<dyn CrisisRequestRepository>) -> Self {
        Self { repository }
    }

    pub async fn apply(&self, request_id: &str, update: TriageUpdate) -> DomainResult<CrisisRequest> {
        let patch = build_patch(update)?;
        self.repository
            .apply_triage(request_id, &patch)
            .await?
            .ok_or(DomainError::NotFound)
    }
}

fn build_patch(update: TriageUpdate) -> Result<TriagePatch, DomainError> {
    // Any of the five literals is a legal target regardless of the current
    // state; ordering is left to the operator.
    let status = match update.status.as_deref().map(str::trim) {
        Some(raw) => Some(RequestStatus::parse(raw).ok_or_else(|| {
            DomainError::Validation(
                "status must be one of pending, assigned, in_progress, resolved, closed".into(),
            )
        })?),
        None => None,
    };

    let assigned_to = match update.assigned_to.as_deref().map(str::trim) {
        Some("") => {
            return Err(DomainError::Validation("assigned_to must not be empty".into()));
        }
        Some(value) if value.chars().count() > MAX_ASSIGNED_TO_LENGTH => {
            return Err(DomainError::Validation(format!(
                "assigned_to must be at most {MAX_ASSIGNED_TO_LENGTH} characters"
            )));
        }
        Some(value) => Some(value.to_string()),
        None => None,
    };

    let admin_notes = match update.admin_notes.as_deref().map(str::trim) {
        Some(value) if value.chars().count() > MAX_ADMIN_NOTES_LENGTH => {
            return Err(DomainError::Validation(format!(
                "admin_notes must be at most {MAX_ADMIN_NOTES_LENGTH} characters"
            )));
        }
        Some(value) => Some(value.to_string()),
        None => None,
    };

    Ok(TriagePatch {
        status,
        assigned_to,
        admin_notes,
        updated_at_ms: now_ms(),
    })
}
