use axum::extract::{Extension, Path, State};
use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use sahayata_domain::error::DomainError;
use sahayata_domain::request::{
    IntakeLocation, IntakeService, IntakeSubmission, ListingService,
};
use sahayata_domain::triage::{TriageService, TriageUpdate};
use sahayata_domain::wire::{WireRequest, to_wire};

use crate::middleware::AuthContext;
use crate::{error::ApiError, middleware as app_middleware, observability, state::AppState};

pub fn router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/requests/:request_id", patch(triage_request))
        .route_layer(middleware::from_fn(
            app_middleware::require_admin_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/requests", post(create_request).get(list_requests))
        .merge(admin)
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
    })
}

async fn metrics() -> Response {
    match observability::render_metrics() {
        Some(body) => body.into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Public submission payload. Required fields are optional here so that an
/// omitted field surfaces as a named validation failure instead of a serde
/// rejection; `photo`/`audio` carry base64 payloads for the delegate. Field
/// rules (presence, trimming, lengths) live in the domain layer.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateRequestPayload {
    name: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    category: Option<String>,
    message: Option<String>,
    photo: Option<String>,
    audio: Option<String>,
    location: Option<LocationPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationPayload {
    longitude: Option<f64>,
    latitude: Option<f64>,
    accuracy: Option<f64>,
}

async fn create_request(
    State(state): State<AppState>,
    Json(payload): Json<CreateRequestPayload>,
) -> Result<Response, ApiError> {
    let photo = decode_media(payload.photo.as_deref(), "photo")?;
    let audio = decode_media(payload.audio.as_deref(), "audio")?;
    let category_label = payload.category.clone().unwrap_or_else(|| "unknown".into());

    let submission = IntakeSubmission {
        name: payload.name.unwrap_or_default(),
        phone: payload.phone.unwrap_or_default(),
        address: payload.address,
        category: payload.category.unwrap_or_default(),
        message: payload.message,
        photo,
        audio,
        location: payload.location.map(|location| IntakeLocation {
            longitude: location.longitude,
            latitude: location.latitude,
            accuracy: location.accuracy,
        }),
    };

    let service = IntakeService::new(state.request_repo.clone(), state.media.clone());
    let created = service.submit(submission).await.map_err(|err| {
        observability::register_intake_submission(&category_label, "rejected");
        map_domain_error(err)
    })?;

    observability::register_intake_submission(created.category.as_str(), "accepted");
    Ok((StatusCode::CREATED, Json(to_wire(&created))).into_response())
}

async fn list_requests(State(state): State<AppState>) -> Result<Json<Vec<WireRequest>>, ApiError> {
    let service = ListingService::new(state.request_repo.clone());
    let requests = service.list_newest_first().await.map_err(map_domain_error)?;
    Ok(Json(requests.iter().map(to_wire).collect()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TriageRequestPayload {
    status: Option<String>,
    assigned_to: Option<String>,
    admin_notes: Option<String>,
}

#[derive(Serialize)]
struct TriageResponse {
    success: bool,
    request: WireRequest,
}

async fn triage_request(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<TriageRequestPayload>,
) -> Result<Json<TriageResponse>, ApiError> {
    let status_label = payload.status.clone().unwrap_or_else(|| "unchanged".into());

    let service = TriageService::new(state.request_repo.clone());
    let update = TriageUpdate {
        status: payload.status,
        assigned_to: payload.assigned_to,
        admin_notes: payload.admin_notes,
    };
    let updated = service.apply(&request_id, update).await.map_err(|err| {
        observability::register_triage_update(&status_label, "rejected");
        map_domain_error(err)
    })?;

    observability::register_triage_update(updated.status.as_str(), "applied");
    tracing::info!(
        request_id = %updated.request_id,
        status = updated.status.as_str(),
        admin = auth.admin_id.as_deref().unwrap_or("-"),
        "triage update applied"
    );
    Ok(Json(TriageResponse {
        success: true,
        request: to_wire(&updated),
    }))
}

fn decode_media(encoded: Option<&str>, field: &str) -> Result<Option<Vec<u8>>, ApiError> {
    let Some(encoded) = encoded else {
        return Ok(None);
    };
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    BASE64
        .decode(trimmed)
        .map(Some)
        .map_err(|_| ApiError::Validation(format!("{field} must be base64-encoded")))
}

fn map_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation(message) => ApiError::Validation(message),
        DomainError::NotFound => ApiError::NotFound,
        DomainError::Dependency(message) => {
            tracing::error!(error = %message, "media delegate failure");
            ApiError::Dependency(message)
        }
        DomainError::Storage(message) => {
            tracing::error!(error = %message, "storage failure");
            ApiError::Internal
        }
    }
}
