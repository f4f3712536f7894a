use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use sahayata_domain::DomainResult;
use sahayata_domain::error::DomainError;
use sahayata_domain::ports::BoxFuture;
use sahayata_domain::ports::media::{MediaDelegate, MediaKind, MediaUpload};

use crate::config::AppConfig;

/// HTTP client for the external media host. Uploads are awaited inline by
/// intake; any failure here surfaces as a submission failure.
#[derive(Debug, Clone)]
pub struct HttpMediaDelegate {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

impl HttpMediaDelegate {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.media_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            upload_url: config.media_upload_url.clone(),
            api_key: config.media_api_key.clone(),
        })
    }
}

impl MediaDelegate for HttpMediaDelegate {
    fn upload(&self, kind: MediaKind, bytes: Vec<u8>) -> BoxFuture<'_, DomainResult<MediaUpload>> {
        Box::pin(async move {
            let part = Part::bytes(bytes).file_name(format!("{}.bin", kind.as_str()));
            let form = Form::new().text("kind", kind.as_str()).part("file", part);

            let response = self
                .http
                .post(&self.upload_url)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(|err| {
                    DomainError::Dependency(format!("media upload transport error: {err}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(DomainError::Dependency(format!(
                    "media upload failed with status {status}"
                )));
            }

            let payload: UploadResponse = response.json().await.map_err(|err| {
                DomainError::Dependency(format!("media upload response decode error: {err}"))
            })?;

            tracing::debug!(kind = kind.as_str(), public_id = %payload.public_id, "media upload complete");
            Ok(MediaUpload {
                secure_url: payload.secure_url,
                public_id: payload.public_id,
            })
        })
    }
}
