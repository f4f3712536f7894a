use serde::{Deserialize, Serialize};

use crate::request::{CrisisRequest, GeoLocation, RequestCategory, RequestStatus};
use crate::util::{format_ms_rfc3339, now_ms};

/// Creation timestamp as rendered on the wire. A stored row that somehow
/// lacks one gets the current time substituted; the response never omits
/// `createdAt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatedStamp {
    Present(i64),
    MissingFallback(i64),
}

impl CreatedStamp {
    pub fn resolve(created_at_ms: Option<i64>) -> Self {
        match created_at_ms {
            Some(ms) => CreatedStamp::Present(ms),
            None => CreatedStamp::MissingFallback(now_ms()),
        }
    }

    pub fn epoch_ms(self) -> i64 {
        match self {
            CreatedStamp::Present(ms) | CreatedStamp::MissingFallback(ms) => ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WireLocation {
    pub coordinates: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Wire shape of a crisis request: camelCase keys, plain-string id, RFC 3339
/// timestamps, location flattened to a coordinates pair or `null`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub category: RequestCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub location: Option<WireLocation>,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub fn to_wire(request: &CrisisRequest) -> WireRequest {
    let created = CreatedStamp::resolve(request.created_at_ms);
    let updated_ms = request.updated_at_ms.unwrap_or_else(|| created.epoch_ms());
    WireRequest {
        id: request.request_id.clone(),
        name: request.name.clone(),
        phone: request.phone.clone(),
        address: request.address.clone(),
        category: request.category,
        message: request.message.clone(),
        photo_url: request.photo_url.clone(),
        audio_url: request.audio_url.clone(),
        location: request.location.as_ref().map(wire_location),
        status: request.status,
        assigned_to: request.assigned_to.clone(),
        admin_notes: request.admin_notes.clone(),
        created_at: format_ms_rfc3339(created.epoch_ms()),
        updated_at: format_ms_rfc3339(updated_ms),
    }
}

fn wire_location(location: &GeoLocation) -> WireLocation {
    WireLocation {
        coordinates: [location.longitude, location.latitude],
        accuracy: location.accuracy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CrisisRequest {
        CrisisRequest {
            request_id: "0190abcdef".to_string(),
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
            created_at_ms: Some(1_700_000_000_000),
            updated_at_ms: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn wire_shape_uses_camel_case_and_null_location() {
        let json = serde_json::to_value(to_wire(&record())).expect("wire");
        assert_eq!(json["id"], "0190abcdef");
        assert_eq!(json["status"], "pending");
        assert!(json["location"].is_null());
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
        assert!(json.get("photoUrl").is_none());
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn location_flattens_to_coordinate_pair() {
        let mut request = record();
        request.location = Some(GeoLocation {
            longitude: 83.36,
            latitude: 26.75,
            accuracy: Some(12.0),
        });
        let json = serde_json::to_value(to_wire(&request)).expect("wire");
        assert_eq!(json["location"]["coordinates"][0], 83.36);
        assert_eq!(json["location"]["coordinates"][1], 26.75);
        assert_eq!(json["location"]["accuracy"], 12.0);
    }

    #[test]
    fn accuracy_is_omitted_when_absent() {
        let mut request = record();
        request.location = Some(GeoLocation {
            longitude: 0.0,
            latitude: 0.0,
            accuracy: None,
        });
        let json = serde_json::to_value(to_wire(&request)).expect("wire");
        assert!(json["location"].get("accuracy").is_none());
    }

    #[test]
    fn missing_creation_timestamp_falls_back_to_now() {
        let mut request = record();
        request.created_at_ms = None;
        request.updated_at_ms = None;

        let before = now_ms();
        let stamp = CreatedStamp::resolve(request.created_at_ms);
        assert!(matches!(stamp, CreatedStamp::MissingFallback(_)));
        assert!(stamp.epoch_ms() >= before);

        let wire = to_wire(&request);
        assert!(!wire.created_at.is_empty());
        assert_eq!(wire.created_at[..4], wire.updated_at[..4]);
    }
}
