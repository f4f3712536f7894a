use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::media::{MediaDelegate, MediaKind};
use crate::ports::requests::CrisisRequestRepository;
use crate::util::{now_ms, uuid_v7_without_dashes};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_ADDRESS_LENGTH: usize = 200;
pub const MAX_MESSAGE_LENGTH: usize = 1_000;
const MIN_PHONE_LENGTH: usize = 10;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    Medical,
    Legal,
    Counselling,
    Shelter,
    Police,
    Other,
}

impl RequestCategory {
    /// Exact-literal parse; case mismatches and anything outside the six
    /// kinds are rejected at the boundary rather than surfacing as a serde
    /// failure.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "medical" => Some(RequestCategory::Medical),
            "legal" => Some(RequestCategory::Legal),
            "counselling" => Some(RequestCategory::Counselling),
            "shelter" => Some(RequestCategory::Shelter),
            "police" => Some(RequestCategory::Police),
            "other" => Some(RequestCategory::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestCategory::Medical => "medical",
            RequestCategory::Legal => "legal",
            RequestCategory::Counselling => "counselling",
            RequestCategory::Shelter => "shelter",
            RequestCategory::Police => "police",
            RequestCategory::Other => "other",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Assigned,
    InProgress,
    Resolved,
    Closed,
}

impl RequestStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RequestStatus::Pending),
            "assigned" => Some(RequestStatus::Assigned),
            "in_progress" => Some(RequestStatus::InProgress),
            "resolved" => Some(RequestStatus::Resolved),
            "closed" => Some(RequestStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Assigned => "assigned",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Resolved => "resolved",
            RequestStatus::Closed => "closed",
        }
    }
}

/// A shared coordinate. Accuracy is informational only and never validated
/// beyond being a number.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CrisisRequest {
    pub request_id: String,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub category: RequestCategory,
    pub message: Option<String>,
    pub photo_url: Option<String>,
    pub audio_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_location")]
    pub location: Option<GeoLocation>,
    pub status: RequestStatus,
    pub assigned_to: Option<String>,
    pub admin_notes: Option<String>,
    /// Set once at intake. `None` only for stored rows predating the field;
    /// the wire serializer substitutes the current time for those.
    #[serde(default)]
    pub created_at_ms: Option<i64>,
    #[serde(default)]
    pub updated_at_ms: Option<i64>,
}

/// Stored rows may carry a malformed or partial coordinate pair; those
/// deserialize to `None` rather than failing the whole record.
fn lenient_location<'de, D>(deserializer: D) -> Result<Option<GeoLocation>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(location_from_value))
}

fn location_from_value(value: &serde_json::Value) -> Option<GeoLocation> {
    let longitude = value.get("longitude")?.as_f64()?;
    let latitude = value.get("latitude")?.as_f64()?;
    let accuracy = value.get("accuracy").and_then(|v| v.as_f64());
    Some(GeoLocation {
        longitude,
        latitude,
        accuracy,
    })
}

/// Coordinates as supplied by the client, before validation. Either half may
/// be missing; a partial pair fails the whole submission.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntakeLocation {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub accuracy: Option<f64>,
}

/// Untrusted public submission. `category` arrives as a free string and is
/// parsed here; `photo`/`audio` are raw bytes destined for the delegate.
#[derive(Clone, Debug, Default)]
pub struct IntakeSubmission {
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    pub category: String,
    pub message: Option<String>,
    pub photo: Option<Vec<u8>>,
    pub audio: Option<Vec<u8>>,
    pub location: Option<IntakeLocation>,
}

#[derive(Debug)]
struct NormalizedSubmission {
    name: String,
    phone: String,
    address: Option<String>,
    category: RequestCategory,
    message: Option<String>,
    location: Option<GeoLocation>,
}

#[derive(Clone)]
pub struct IntakeService {
    repository: Arc<dyn CrisisRequestRepository>,
    media: Arc<dyn MediaDelegate>,
}

impl IntakeService {
    pub fn new(repository: Arc<dyn CrisisRequestRepository>, media: Arc<dyn MediaDelegate>) -> Self {
        Self { repository, media }
    }

    pub async fn submit(&self, input: IntakeSubmission) -> DomainResult<CrisisRequest> {
        let normalized = validate_submission(&input)?;

        // Attachments are a hard prerequisite of persistence: a delegate
        // failure aborts the submission and nothing is written.
        let photo_url = match input.photo {
            Some(bytes) => Some(self.media.upload(MediaKind::Photo, bytes).await?.secure_url),
            None => None,
        };
        let audio_url = match input.audio {
            Some(bytes) => Some(self.media.upload(MediaKind::Audio, bytes).await?.secure_url),
            None => None,
        };

        let now = now_ms();
        let request = CrisisRequest {
            request_id: uuid_v7_without_dashes(),
            name: normalized.name,
            phone: normalized.phone,
            address: normalized.address,
            category: normalized.category,
            message: normalized.message,
            photo_url,
            audio_url,
            location: normalized.location,
            status: RequestStatus::Pending,
            assigned_to: None,
            admin_notes: None,
            created_at_ms: Some(now),
            updated_at_ms: Some(now),
        };
        self.repository.create(&request).await
    }
}

/// Read side. No side effects; an empty store lists as an empty sequence.
#[derive(Clone)]
pub struct ListingService {
    repository: Arc<dyn CrisisRequestRepository>,
}

impl ListingService {
    pub fn new(repository: Arc<dyn CrisisRequestRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_newest_first(&self) -> DomainResult<Vec<CrisisRequest>> {
        self.repository.list_newest_first().await
    }
}

fn validate_submission(input: &IntakeSubmission) -> Result<NormalizedSubmission, DomainError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(DomainError::Validation("name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DomainError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let phone = input.phone.trim();
    if phone.is_empty() {
        return Err(DomainError::Validation("phone is required".into()));
    }
    if !phone_is_valid(phone) {
        return Err(DomainError::Validation(
            "phone must be at least 10 characters of digits, +, -, spaces or parentheses".into(),
        ));
    }

    let category = input.category.trim();
    if category.is_empty() {
        return Err(DomainError::Validation("category is required".into()));
    }
    let category = RequestCategory::parse(category).ok_or_else(|| {
        DomainError::Validation(
            "category must be one of medical, legal, counselling, shelter, police, other".into(),
        )
    })?;

    let address = normalize_optional(input.address.as_deref(), "address", MAX_ADDRESS_LENGTH)?;
    let message = normalize_optional(input.message.as_deref(), "message", MAX_MESSAGE_LENGTH)?;

    let location = match &input.location {
        Some(location) => Some(validate_location(location)?),
        None => None,
    };

    Ok(NormalizedSubmission {
        name: name.to_string(),
        phone: phone.to_string(),
        address,
        category,
        message,
        location,
    })
}

fn phone_is_valid(phone: &str) -> bool {
    phone.chars().count() >= MIN_PHONE_LENGTH
        && phone
            .chars()
            .all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '(' | ')') || ch.is_ascii_whitespace())
}

fn normalize_optional(
    value: Option<&str>,
    field: &str,
    max_length: usize,
) -> Result<Option<String>, DomainError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    // Over-length input fails outright rather than being truncated.
    if trimmed.chars().count() > max_length {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max_length} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

fn validate_location(location: &IntakeLocation) -> Result<GeoLocation, DomainError> {
    let (Some(longitude), Some(latitude)) = (location.longitude, location.latitude) else {
        return Err(DomainError::Validation(
            "location requires both longitude and latitude".into(),
        ));
    };
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(DomainError::Validation(
            "location.longitude must be between -180 and 180".into(),
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(DomainError::Validation(
            "location.latitude must be between -90 and 90".into(),
        ));
    }
    Ok(GeoLocation {
        longitude,
        latitude,
        accuracy: location.accuracy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> IntakeSubmission {
        IntakeSubmission {
            name: "Asha".to_string(),
            phone: "9876543210".to_string(),
            category: "medical".to_string(),
            ..IntakeSubmission::default()
        }
    }

    #[test]
    fn minimal_submission_is_accepted() {
        let normalized = validate_submission(&submission()).expect("valid");
        assert_eq!(normalized.category, RequestCategory::Medical);
        assert!(normalized.location.is_none());
    }

    #[test]
    fn name_is_trimmed_and_required() {
        let mut input = submission();
        input.name = "  Asha  ".to_string();
        let normalized = validate_submission(&input).expect("valid");
        assert_eq!(normalized.name, "Asha");

        input.name = "   ".to_string();
        let err = validate_submission(&input).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("name")));
    }

    #[test]
    fn over_length_fields_fail_instead_of_truncating() {
        let mut input = submission();
        input.name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate_submission(&input).is_err());

        let mut input = submission();
        input.message = Some("x".repeat(MAX_MESSAGE_LENGTH + 1));
        assert!(validate_submission(&input).is_err());

        let mut input = submission();
        input.address = Some("x".repeat(MAX_ADDRESS_LENGTH + 1));
        assert!(validate_submission(&input).is_err());
    }

    #[test]
    fn length_limits_apply_after_trimming() {
        let mut input = submission();
        input.name = format!("  {}  ", "x".repeat(MAX_NAME_LENGTH));
        let normalized = validate_submission(&input).expect("valid");
        assert_eq!(normalized.name.chars().count(), MAX_NAME_LENGTH);

        let mut input = submission();
        input.message = Some(format!("{} \n", "x".repeat(MAX_MESSAGE_LENGTH)));
        assert!(validate_submission(&input).is_ok());
    }

    #[test]
    fn phone_pattern_accepts_grouped_numbers() {
        for phone in ["9876543210", "+91 (987) 654-3210", "00 11 22 33 44"] {
            let mut input = submission();
            input.phone = phone.to_string();
            assert!(validate_submission(&input).is_ok(), "{phone}");
        }
    }

    #[test]
    fn phone_pattern_rejects_short_or_alphabetic_values() {
        for phone in ["12345", "98765abcde", ""] {
            let mut input = submission();
            input.phone = phone.to_string();
            assert!(validate_submission(&input).is_err(), "{phone:?}");
        }
    }

    #[test]
    fn category_literals_are_exact() {
        for category in ["medical", "legal", "counselling", "shelter", "police", "other"] {
            let mut input = submission();
            input.category = category.to_string();
            assert!(validate_submission(&input).is_ok(), "{category}");
        }
        for category in ["urgent", "Medical", "MEDICAL", ""] {
            let mut input = submission();
            input.category = category.to_string();
            assert!(validate_submission(&input).is_err(), "{category:?}");
        }
    }

    #[test]
    fn location_bounds_are_inclusive() {
        for (longitude, latitude) in [(-180.0, -90.0), (180.0, 90.0), (83.36, 26.75)] {
            let mut input = submission();
            input.location = Some(IntakeLocation {
                longitude: Some(longitude),
                latitude: Some(latitude),
                accuracy: None,
            });
            assert!(validate_submission(&input).is_ok(), "{longitude},{latitude}");
        }
    }

    #[test]
    fn out_of_range_or_partial_location_fails_the_submission() {
        let mut input = submission();
        input.location = Some(IntakeLocation {
            longitude: Some(200.0),
            latitude: Some(10.0),
            accuracy: None,
        });
        assert!(validate_submission(&input).is_err());

        let mut input = submission();
        input.location = Some(IntakeLocation {
            longitude: None,
            latitude: Some(10.0),
            accuracy: None,
        });
        assert!(validate_submission(&input).is_err());
    }

    #[test]
    fn stored_partial_location_deserializes_to_none() {
        let row = serde_json::json!({
            "request_id": "r1",
            "name": "Asha",
            "phone": "9876543210",
            "address": null,
            "category": "medical",
            "message": null,
            "photo_url": null,
            "audio_url": null,
            "location": { "latitude": 26.75 },
            "status": "pending",
            "assigned_to": null,
            "admin_notes": null
        });
        let request: CrisisRequest = serde_json::from_value(row).expect("row");
        assert!(request.location.is_none());
        assert!(request.created_at_ms.is_none());
    }
}
