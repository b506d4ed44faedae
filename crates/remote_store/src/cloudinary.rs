use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::{ImageHost, ImageUpload};

const SERVICE: &str = "Cloudinary";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub api_base: String,
    pub cloud_name: String,
    /// Unsigned upload preset; no API secret is involved.
    pub upload_preset: String,
    pub folder: String,
}

/// Unsigned uploads to `{api_base}/v1_1/{cloud_name}/image/upload`.
#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    http: Client,
    upload_url: Url,
    upload_preset: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    error: Option<UploadErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorDetail {
    message: Option<String>,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self> {
        if config.cloud_name.trim().is_empty() || config.upload_preset.trim().is_empty() {
            return Err(StoreError::NotConfigured(SERVICE));
        }

        let raw = format!(
            "{}/v1_1/{}/image/upload",
            config.api_base.trim_end_matches('/'),
            config.cloud_name
        );
        let upload_url = Url::parse(&raw).map_err(|_| StoreError::InvalidUrl(raw.clone()))?;

        Ok(Self {
            http: Client::builder().build()?,
            upload_url,
            upload_preset: config.upload_preset,
            folder: config.folder,
        })
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        debug!(file = %image.file_name, bytes = image.bytes.len(), "starting Cloudinary upload");

        let mut part = Part::bytes(image.bytes).file_name(image.file_name.clone());
        if let Some(content_type) = image.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone());

        let response = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UploadErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            warn!(status = status.as_u16(), %message, "Cloudinary upload failed");
            return Err(StoreError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message: format!("Upload failed: {}", message),
            });
        }

        let uploaded: UploadResponse = response.json().await?;
        info!(url = %uploaded.secure_url, "Cloudinary upload successful");
        Ok(uploaded.secure_url)
    }
}
